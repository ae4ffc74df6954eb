use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::error::{TextoverError, TextoverResult};

/// Opaque 3-channel color, drawn at full alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A palette entry with a human-readable name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub rgb: Rgb,
}

/// A CSS-style font stack source string understood by the text layout engine,
/// e.g. `"sans-serif"` or a concrete family name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontStack(pub String);

impl FontStack {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }
}

/// Fully-specified text style for one render attempt.
///
/// Constructed fresh per attempt and never shared across images.
#[derive(Clone, Debug)]
pub struct Style {
    pub font: FontStack,
    pub scale: f32,
    pub thickness: u32,
    pub color: Rgb,
}

/// The fixed five-color palette.
pub fn default_palette() -> Vec<PaletteColor> {
    vec![
        PaletteColor {
            name: "yellow",
            rgb: Rgb {
                r: 255,
                g: 255,
                b: 0,
            },
        },
        PaletteColor {
            name: "purple",
            rgb: Rgb {
                r: 128,
                g: 0,
                b: 128,
            },
        },
        PaletteColor {
            name: "blue",
            rgb: Rgb { r: 0, g: 0, b: 255 },
        },
        PaletteColor {
            name: "green",
            rgb: Rgb { r: 0, g: 128, b: 0 },
        },
        PaletteColor {
            name: "orange",
            rgb: Rgb {
                r: 255,
                g: 165,
                b: 0,
            },
        },
    ]
}

/// The fixed five-entry font list, expressed as generic family stacks so the
/// layout engine resolves whatever the host system provides.
pub fn default_fonts() -> Vec<FontStack> {
    vec![
        FontStack::new("sans-serif"),
        FontStack::new("serif"),
        FontStack::new("monospace"),
        FontStack::new("cursive"),
        FontStack::new("system-ui"),
    ]
}

/// Uniform-random pick from a slice.
pub fn pick<'a, T>(items: &'a [T], rng: &mut impl Rng) -> TextoverResult<&'a T> {
    items
        .choose(rng)
        .ok_or_else(|| TextoverError::render("cannot pick from an empty set"))
}

/// Thickness for a final scale: uniform in [max(1, ⌊s·0.5⌋), max(1, ⌊s·2⌋)].
pub fn random_thickness(scale: f32, rng: &mut impl Rng) -> u32 {
    let lo = ((scale * 0.5) as u32).max(1);
    let hi = ((scale * 2.0) as u32).max(1);
    rng.gen_range(lo..=hi)
}

/// Map an integer thickness onto a font weight. Thickness 1 is the regular
/// weight; each step up adds 100, capped at the heaviest standard weight.
pub fn weight_for_thickness(thickness: u32) -> f32 {
    (300 + thickness.min(6) * 100) as f32
}
