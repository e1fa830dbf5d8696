//! Sample buffer primitives
//!
//! Copy, crossfade and silence helpers over 16-bit PCM buffers. Ranges are
//! validated up front so a bad offset surfaces as an error instead of
//! corrupted audio.

use super::error::ConcealError;

/// Check that `start..start + count` lies inside a buffer of `len` samples
fn check_range(start: usize, count: usize, len: usize) -> Result<(), ConcealError> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ConcealError::RangeOutOfBounds { start, count, len }),
    }
}

/// Blend `src` into `dst` with a linear ramp over `length` samples
///
/// At index 0 the result is `src[0]`, at `length - 1` it is the original
/// `dst[length - 1]`. Each weighted term is truncated toward zero before the
/// sum, and the sum saturates to the i16 range.
///
/// A single-sample fade takes the source sample.
pub fn crossfade(dst: &mut [i16], src: &[i16], length: usize) -> Result<(), ConcealError> {
    check_range(0, length, dst.len())?;
    check_range(0, length, src.len())?;

    let denom = length.saturating_sub(1) as f32;

    for (i, (d, &s)) in dst[..length].iter_mut().zip(&src[..length]).enumerate() {
        let a = if denom > 0.0 { i as f32 / denom } else { 0.0 };
        let from_src = ((1.0 - a) * s as f32) as i32;
        let from_dst = (a * *d as f32) as i32;
        *d = saturate(from_src + from_dst);
    }

    Ok(())
}

/// Copy `count` samples from `src[src_start..]` into `dst[dst_start..]`
pub fn copy_range(
    dst: &mut [i16],
    src: &[i16],
    dst_start: usize,
    src_start: usize,
    count: usize,
) -> Result<(), ConcealError> {
    check_range(dst_start, count, dst.len())?;
    check_range(src_start, count, src.len())?;

    dst[dst_start..dst_start + count].copy_from_slice(&src[src_start..src_start + count]);
    Ok(())
}

/// `n` zero-valued samples
pub fn silence(n: usize) -> Vec<i16> {
    vec![0; n]
}

/// Clamp a wide intermediate into the i16 range
pub fn saturate(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossfade_documented_example() {
        let mut dst = [4, 15, 30];
        let src = [1, 2, 3];
        crossfade(&mut dst, &src, 3).unwrap();
        // 0.5 * 2 + 0.5 * 15 = 1 + 7 (each term truncated)
        assert_eq!(dst, [1, 8, 30]);
    }

    #[test]
    fn test_crossfade_endpoints_exact() {
        let mut dst: Vec<i16> = (0..80).map(|i| 30000 - i * 7).collect();
        let original = dst.clone();
        let src: Vec<i16> = (0..80).map(|i| -32000 + i * 11).collect();

        crossfade(&mut dst, &src, 80).unwrap();

        assert_eq!(dst[0], src[0]);
        assert_eq!(dst[79], original[79]);
    }

    #[test]
    fn test_crossfade_is_monotonic_between_constants() {
        let mut dst = vec![1000i16; 10];
        let src = vec![0i16; 10];
        crossfade(&mut dst, &src, 10).unwrap();

        for pair in dst.windows(2) {
            assert!(pair[0] <= pair[1], "ramp not monotonic: {:?}", dst);
        }
        assert_eq!(dst[0], 0);
        assert_eq!(dst[9], 1000);
    }

    #[test]
    fn test_crossfade_single_sample_takes_source() {
        let mut dst = [123];
        crossfade(&mut dst, &[-5], 1).unwrap();
        assert_eq!(dst, [-5]);
    }

    #[test]
    fn test_crossfade_zero_length_is_noop() {
        let mut dst = [7, 8];
        crossfade(&mut dst, &[1, 2], 0).unwrap();
        assert_eq!(dst, [7, 8]);
    }

    #[test]
    fn test_crossfade_partial_length_leaves_rest() {
        let mut dst = [10, 10, 10, 10];
        crossfade(&mut dst, &[0, 0], 2).unwrap();
        assert_eq!(dst, [0, 10, 10, 10]);
    }

    #[test]
    fn test_crossfade_rejects_short_buffers() {
        let mut dst = [0i16; 4];
        let err = crossfade(&mut dst, &[0; 2], 4).unwrap_err();
        assert!(matches!(err, ConcealError::RangeOutOfBounds { len: 2, .. }));
    }

    #[test]
    fn test_copy_range() {
        let mut dst = [0i16; 6];
        let src = [1, 2, 3, 4, 5];
        copy_range(&mut dst, &src, 2, 1, 3).unwrap();
        assert_eq!(dst, [0, 0, 2, 3, 4, 0]);
    }

    #[test]
    fn test_copy_range_out_of_bounds() {
        let mut dst = [0i16; 4];
        let src = [1i16; 4];

        assert!(copy_range(&mut dst, &src, 2, 0, 3).is_err());
        assert!(copy_range(&mut dst, &src, 0, 3, 2).is_err());
        assert!(copy_range(&mut dst, &src, usize::MAX, 0, 2).is_err());
        assert_eq!(dst, [0; 4]);
    }

    #[test]
    fn test_silence() {
        let s = silence(320);
        assert_eq!(s.len(), 320);
        assert!(s.iter().all(|&x| x == 0));
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(40000), i16::MAX);
        assert_eq!(saturate(-40000), i16::MIN);
        assert_eq!(saturate(-12), -12);
    }
}
