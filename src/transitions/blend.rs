// src/transitions/blend.rs - crossfade and fade-through-colour
//
// Both blends interpolate all four channels linearly:
//
//   out = A * (1 - p) + B * p
//
// computed as A + (B - A) * p so that p=0 reproduces A and p=1 reproduces B bit for bit.
// Results are rounded half-up.
//
// fade_through runs two crossfades back to back through a solid colour C:
//
//   p in [0, 0.5]  ->  crossfade(A, C, 2p)
//   p in (0.5, 1]  ->  crossfade(C, B, 2p - 1)
//
// which pins p=0.5 to exactly C.

use crate::error::Result;
use crate::frame::CanonicalBuffer;
use crate::project::RgbColor;

use super::{clamp_progress, ensure_same_size, round_half_up};

/// Linear blend of every channel from `a` (p=0) to `b` (p=1)
pub fn crossfade(a: &CanonicalBuffer, b: &CanonicalBuffer, progress: f64) -> Result<CanonicalBuffer> {
    ensure_same_size(a, b)?;
    let p = clamp_progress(progress);

    let mut out = a.as_image().clone();
    for (dst, &bv) in out.iter_mut().zip(b.as_raw()) {
        *dst = lerp(*dst, bv, p);
    }

    Ok(CanonicalBuffer::new(out))
}

/// Fade from `a` into a solid colour, then from that colour into `b`
pub fn fade_through(
    a: &CanonicalBuffer,
    b: &CanonicalBuffer,
    progress: f64,
    color: RgbColor,
) -> Result<CanonicalBuffer> {
    ensure_same_size(a, b)?;
    let p = clamp_progress(progress);
    let solid = CanonicalBuffer::new_filled(a.width(), a.height(), color.to_rgba());

    if p <= 0.5 {
        crossfade(a, &solid, p * 2.0)
    } else {
        crossfade(&solid, b, (p - 0.5) * 2.0)
    }
}

fn lerp(a: u8, b: u8, p: f64) -> u8 {
    let a = f64::from(a);
    let b = f64::from(b);
    round_half_up(a + (b - a) * p).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    fn random_buffer(rng: &mut SmallRng, width: u32, height: u32) -> CanonicalBuffer {
        CanonicalBuffer::from_fn(width, height, |_, _| rng.gen())
    }

    #[test]
    fn test_crossfade_endpoints_are_exact() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let a = random_buffer(&mut rng, 9, 5);
            let b = random_buffer(&mut rng, 9, 5);
            assert_eq!(crossfade(&a, &b, 0.0).unwrap(), a);
            assert_eq!(crossfade(&a, &b, 1.0).unwrap(), b);
        }
    }

    #[test]
    fn test_crossfade_midpoint_rounds_half_up() {
        let a = CanonicalBuffer::new_filled(1, 1, [0, 10, 255, 1]);
        let b = CanonicalBuffer::new_filled(1, 1, [255, 11, 0, 0]);
        // 127.5 -> 128, 10.5 -> 11, 127.5 -> 128, 0.5 -> 1
        assert_eq!(crossfade(&a, &b, 0.5).unwrap().get_pixel(0, 0), [128, 11, 128, 1]);
    }

    #[test]
    fn test_crossfade_clamps_progress() {
        let a = CanonicalBuffer::new_filled(2, 2, [1, 2, 3, 4]);
        let b = CanonicalBuffer::new_filled(2, 2, [200, 200, 200, 200]);
        assert_eq!(crossfade(&a, &b, -3.0).unwrap(), a);
        assert_eq!(crossfade(&a, &b, 7.5).unwrap(), b);
    }

    #[test]
    fn test_crossfade_size_mismatch() {
        let a = CanonicalBuffer::new_transparent(2, 2);
        let b = CanonicalBuffer::new_transparent(2, 3);
        assert!(crossfade(&a, &b, 0.5).is_err());
    }

    #[test]
    fn test_fade_through_midpoint_is_solid() {
        let mut rng = SmallRng::seed_from_u64(11);
        let a = random_buffer(&mut rng, 6, 4);
        let b = random_buffer(&mut rng, 6, 4);

        for color in [RgbColor::WHITE, RgbColor::BLACK] {
            let mid = fade_through(&a, &b, 0.5, color).unwrap();
            let expected = color.to_rgba();
            for pixel in mid.as_image().pixels() {
                for (got, want) in pixel.0.iter().zip(expected) {
                    assert!((*got as i32 - want as i32).abs() <= 1);
                }
            }
        }
    }

    #[test]
    fn test_fade_through_endpoints() {
        let mut rng = SmallRng::seed_from_u64(3);
        let a = random_buffer(&mut rng, 5, 5);
        let b = random_buffer(&mut rng, 5, 5);
        assert_eq!(fade_through(&a, &b, 0.0, RgbColor::BLACK).unwrap(), a);
        assert_eq!(fade_through(&a, &b, 1.0, RgbColor::BLACK).unwrap(), b);
    }

    #[test]
    fn test_fade_to_white_quarter() {
        let a = CanonicalBuffer::new_filled(1, 1, [0, 0, 0, 255]);
        let b = CanonicalBuffer::new_filled(1, 1, [0, 0, 0, 255]);
        // p=0.25 is halfway from A to white
        let quarter = fade_through(&a, &b, 0.25, RgbColor::WHITE).unwrap();
        assert_eq!(quarter.get_pixel(0, 0), [128, 128, 128, 255]);
    }
}
