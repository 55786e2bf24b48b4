//! # Transition Compositing
//!
//! Stateless pixel operations that build a synthetic frame from two same-size canonical
//! buffers and a progress value in `[0, 1]`, where 0 is the outgoing frame and 1 the
//! incoming one.
//!
//! - **Crossfade**: linear blend of all four channels
//! - **Fade through colour**: A fades to a solid colour, which fades to B
//! - **Slide**: B slides in over A from one of four edges
//!
//! All rounding is half-up so outputs are deterministic.

pub mod blend;
pub mod slide;

pub use blend::{crossfade, fade_through};
pub use slide::slide;

use crate::error::{Result, ValidationError};
use crate::frame::CanonicalBuffer;
use crate::project::Effect;

/// Build one synthetic frame for `effect` at `progress`
pub fn composite(
    effect: Effect,
    a: &CanonicalBuffer,
    b: &CanonicalBuffer,
    progress: f64,
) -> Result<CanonicalBuffer> {
    match effect {
        Effect::Crossfade => crossfade(a, b, progress),
        Effect::FadeThrough(color) => fade_through(a, b, progress, color),
        Effect::Slide(direction) => slide(a, b, progress, direction),
    }
}

pub(crate) fn ensure_same_size(a: &CanonicalBuffer, b: &CanonicalBuffer) -> Result<()> {
    if a.dimensions() != b.dimensions() {
        return Err(ValidationError::SizeMismatch {
            left_width: a.width(),
            left_height: a.height(),
            right_width: b.width(),
            right_height: b.height(),
        }.into());
    }
    Ok(())
}

/// NaN is treated as 0
pub(crate) fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{RgbColor, SlideDirection};

    #[test]
    fn test_dispatch_matches_primitives() {
        let a = CanonicalBuffer::from_fn(6, 3, |x, y| [x as u8 * 40, y as u8 * 80, 10, 255]);
        let b = CanonicalBuffer::new_filled(6, 3, [250, 5, 90, 128]);

        assert_eq!(
            composite(Effect::Crossfade, &a, &b, 0.3).unwrap(),
            crossfade(&a, &b, 0.3).unwrap()
        );
        assert_eq!(
            composite(Effect::FadeThrough(RgbColor::WHITE), &a, &b, 0.7).unwrap(),
            fade_through(&a, &b, 0.7, RgbColor::WHITE).unwrap()
        );
        assert_eq!(
            composite(Effect::Slide(SlideDirection::Up), &a, &b, 0.5).unwrap(),
            slide(&a, &b, 0.5, SlideDirection::Up).unwrap()
        );
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(0.5), 1.0);
        assert_eq!(round_half_up(1.49), 1.0);
        assert_eq!(round_half_up(2.5), 3.0);
    }

    #[test]
    fn test_nan_progress() {
        assert_eq!(clamp_progress(f64::NAN), 0.0);
    }
}
