use std::path::PathBuf;

use crate::{
    fit::FitLimits,
    style::{self, FontStack, PaletteColor},
};

/// Immutable configuration for one batch run.
///
/// The defaults are the fixed file and folder names the program operates on;
/// components receive the palette, font list, and numeric limits from here
/// rather than reading process-wide state.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// UTF-8 text, one snippet per line; blank lines ignored.
    pub content_file: PathBuf,
    /// Folder of candidate `.jpg`/`.jpeg`/`.png` backgrounds.
    pub images_dir: PathBuf,
    /// Receives generated PNGs; created if missing.
    pub output_dir: PathBuf,
    /// Append-only log of absolute output paths, reset at run start.
    pub manifest_file: PathBuf,
    /// Optional folder of extra `.ttf`/`.otf` faces appended to the font list.
    pub fonts_dir: PathBuf,
    pub palette: Vec<PaletteColor>,
    pub fonts: Vec<FontStack>,
    pub limits: FitLimits,
    /// Random shrink range applied to a fitted scale, half-open.
    pub shrink: (f32, f32),
    /// Retry budget for one line's style/position/draw/save sequence.
    pub max_attempts: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            content_file: PathBuf::from("noidung.txt"),
            images_dir: PathBuf::from("images"),
            output_dir: PathBuf::from("output"),
            manifest_file: PathBuf::from("path_images.txt"),
            fonts_dir: PathBuf::from("fonts"),
            palette: style::default_palette(),
            fonts: style::default_fonts(),
            limits: FitLimits::default(),
            shrink: (0.6, 0.9),
            max_attempts: 5,
        }
    }
}
