//! Sample format conversion primitives
//!
//! Pure, stateless functions moving samples between external representations
//! (interleaved integers, packed stereo floats, decibels) and the planar f32
//! layout of [`Stream`](crate::Stream).

const I16_SCALE: f32 = 1.0 / 32768.0;

/// Convert decibels to a linear amplitude factor.
pub fn db_to_amp(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude factor to decibels. `amp` must be positive.
pub fn amp_to_db(amp: f32) -> f32 {
    20.0 * amp.log10()
}

/// Convert interleaved 16-bit stereo samples to two float planes,
/// scaling by 1/32768.
///
/// `left` and `right` must each hold `input.len() / 2` samples.
pub fn i16_to_float(input: &[i16], left: &mut [f32], right: &mut [f32]) {
    for (pair, (l, r)) in input
        .chunks_exact(2)
        .zip(left.iter_mut().zip(right.iter_mut()))
    {
        *l = f32::from(pair[0]) * I16_SCALE;
        *r = f32::from(pair[1]) * I16_SCALE;
    }
}

/// Convert 16-bit mono samples to a float plane, scaling by 1/32768.
pub fn i16_to_float_mono(input: &[i16], out: &mut [f32]) {
    for (sample, o) in input.iter().zip(out.iter_mut()) {
        *o = f32::from(*sample) * I16_SCALE;
    }
}

/// Convert one float sample back to 16-bit, rounding to nearest and
/// saturating at the type bounds. Inverse of the 1/32768 scaling within
/// one least significant bit.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Split packed stereo floats into two planes.
pub fn deinterleave(input: &[f32], left: &mut [f32], right: &mut [f32]) {
    for (pair, (l, r)) in input
        .chunks_exact(2)
        .zip(left.iter_mut().zip(right.iter_mut()))
    {
        *l = pair[0];
        *r = pair[1];
    }
}

/// Pack two float planes into interleaved stereo, replacing the contents of
/// `out`. Passing the same slice for both planes duplicates a mono channel.
pub fn interleave(left: &[f32], right: &[f32], out: &mut Vec<f32>) {
    out.clear();
    out.reserve(left.len() * 2);
    for (l, r) in left.iter().zip(right.iter()) {
        out.push(*l);
        out.push(*r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_amp_round_trip() {
        assert!((db_to_amp(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_amp(-6.0) - 0.5012).abs() < 1e-3);
        for db in [-60.0, -6.0, 0.0, 3.0, 12.0] {
            assert!((amp_to_db(db_to_amp(db)) - db).abs() < 1e-4);
        }
    }

    #[test]
    fn i16_round_trips_within_one_lsb() {
        for value in i16::MIN..=i16::MAX {
            let float = f32::from(value) * I16_SCALE;
            let back = f32_to_i16(float);
            assert!(
                (i32::from(back) - i32::from(value)).abs() <= 1,
                "{value} -> {float} -> {back}"
            );
        }
    }

    #[test]
    fn i16_to_float_deinterleaves() {
        let input = [0i16, 16384, -32768, 32767];
        let mut left = [0.0f32; 2];
        let mut right = [0.0f32; 2];
        i16_to_float(&input, &mut left, &mut right);
        assert_eq!(left, [0.0, -1.0]);
        assert_eq!(right, [0.5, 32767.0 / 32768.0]);
    }

    #[test]
    fn interleave_deinterleave_round_trip() {
        let left = [1.0f32, 3.0, 5.0];
        let right = [2.0f32, 4.0, 6.0];
        let mut packed = Vec::new();
        interleave(&left, &right, &mut packed);
        assert_eq!(packed, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut l = [0.0f32; 3];
        let mut r = [0.0f32; 3];
        deinterleave(&packed, &mut l, &mut r);
        assert_eq!(l, left);
        assert_eq!(r, right);
    }

    #[test]
    fn interleave_duplicates_mono_plane() {
        let mono = [0.25f32, -0.5];
        let mut packed = Vec::new();
        interleave(&mono, &mono, &mut packed);
        assert_eq!(packed, [0.25, 0.25, -0.5, -0.5]);
    }
}
