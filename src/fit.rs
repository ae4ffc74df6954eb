use rand::Rng;

use crate::{
    error::TextoverResult,
    measure::TextMeasurer,
    style::FontStack,
};

/// Search interval below this width terminates the fit.
const SCALE_EPSILON: f32 = 0.01;

/// Bounds for the scale search and the padding kept clear of text.
#[derive(Clone, Copy, Debug)]
pub struct FitLimits {
    pub min_scale: f32,
    pub max_scale: f32,
    pub margin: u32,
}

impl Default for FitLimits {
    fn default() -> Self {
        Self {
            min_scale: 0.3,
            max_scale: 10.0,
            margin: 20,
        }
    }
}

/// Binary-search the largest scale whose measured text box fits inside the
/// image minus the margin on all sides.
///
/// Converges to `min_scale` when even the smallest scale overflows; the
/// caller proceeds with a best-effort value rather than failing. The trial
/// thickness used during measurement is `max(1, ⌊scale⌋)`; the final
/// thickness is chosen later from the shrunk scale.
pub fn fit_scale(
    width: u32,
    height: u32,
    text: &str,
    font: &FontStack,
    limits: FitLimits,
    measurer: &mut impl TextMeasurer,
) -> TextoverResult<f32> {
    let target_w = width.saturating_sub(2 * limits.margin) as f32;
    let target_h = height.saturating_sub(2 * limits.margin) as f32;

    let mut left = limits.min_scale;
    let mut right = limits.max_scale;
    while right - left > SCALE_EPSILON {
        let mid = (left + right) / 2.0;
        let trial_thickness = (mid as u32).max(1);
        let extent = measurer.measure(text, font, mid, trial_thickness)?;
        if extent.width <= target_w && extent.height <= target_h {
            left = mid;
        } else {
            right = mid;
        }
    }

    Ok(left)
}

/// Random shrink applied to a fitted scale to leave breathing room.
pub fn shrink_factor(lo: f32, hi: f32, rng: &mut impl Rng) -> f32 {
    rng.gen_range(lo..hi)
}
