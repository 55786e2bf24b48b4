// src/transitions/slide.rs - directional slide
//
// Frame B slides in over a stationary frame A. A never moves; it is simply covered by B's
// leading edge. No blending, every output pixel is copied from exactly one source.
//
// With extent = width (left/right) or height (up/down):
//
//   edge   = round_half_up(p * extent)   how much of B is visible
//   offset = extent - edge
//
//   left   x >= offset  ->  B[x - offset]   B enters at the right edge, travelling left
//   right  x <  edge    ->  B[x + offset]   B enters at the left edge, travelling right
//   up     y >= offset  ->  B[y - offset]   B enters at the bottom edge, travelling up
//   down   y <  edge    ->  B[y + offset]   B enters at the top edge, travelling down
//
//   everything else     ->  A
//
// p=0 gives edge=0 (all A); p=1 gives edge=extent, offset=0 (all B) for every direction.

use crate::error::Result;
use crate::frame::CanonicalBuffer;
use crate::project::SlideDirection;

use super::{clamp_progress, ensure_same_size, round_half_up};

/// Slide `b` over `a` by `progress` in the given direction
pub fn slide(
    a: &CanonicalBuffer,
    b: &CanonicalBuffer,
    progress: f64,
    direction: SlideDirection,
) -> Result<CanonicalBuffer> {
    ensure_same_size(a, b)?;
    let p = clamp_progress(progress);
    let (width, height) = a.dimensions();

    let extent = match direction {
        SlideDirection::Left | SlideDirection::Right => width,
        SlideDirection::Up | SlideDirection::Down => height,
    };
    let edge = (round_half_up(p * f64::from(extent)) as u32).min(extent);
    let offset = extent - edge;

    let stride = width as usize * 4;
    let b_raw = b.as_raw();
    let mut out = a.as_image().clone();
    let pixels: &mut [u8] = &mut out;

    match direction {
        SlideDirection::Left => {
            let split = offset as usize * 4;
            for (dst, src) in pixels.chunks_exact_mut(stride).zip(b_raw.chunks_exact(stride)) {
                dst[split..].copy_from_slice(&src[..stride - split]);
            }
        }
        SlideDirection::Right => {
            let split = offset as usize * 4;
            for (dst, src) in pixels.chunks_exact_mut(stride).zip(b_raw.chunks_exact(stride)) {
                dst[..stride - split].copy_from_slice(&src[split..]);
            }
        }
        SlideDirection::Up => {
            let split = offset as usize * stride;
            let visible = edge as usize * stride;
            pixels[split..].copy_from_slice(&b_raw[..visible]);
        }
        SlideDirection::Down => {
            let split = offset as usize * stride;
            let visible = edge as usize * stride;
            pixels[..visible].copy_from_slice(&b_raw[split..]);
        }
    }

    Ok(CanonicalBuffer::new(out))
}
