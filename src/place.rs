use rand::Rng;

use crate::measure::TextExtent;

/// Pick an anchor for the text box inside an image.
///
/// The returned `y` is a baseline coordinate, matching how the glyph drawing
/// anchors the first line. When no valid random range exists (tiny image or
/// oversized text) the anchor deterministically falls back to the center-left
/// point `(margin, height / 2)`, truncating the division.
pub fn select_position(
    width: u32,
    height: u32,
    extent: TextExtent,
    margin: u32,
    rng: &mut impl Rng,
) -> (i32, i32) {
    let w = i64::from(width);
    let h = i64::from(height);
    let margin = i64::from(margin);
    let text_w = extent.width.ceil() as i64;
    let text_h = extent.height.ceil() as i64;

    let max_x = (w - text_w - margin).max(margin);
    let max_y = h - margin;
    let min_y = text_h + margin;

    if max_x <= margin || min_y >= max_y {
        return (margin as i32, (h / 2) as i32);
    }

    let x = rng.gen_range(margin..=max_x);
    let y = rng.gen_range(min_y..=max_y);
    (x as i32, y as i32)
}
