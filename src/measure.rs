use std::borrow::Cow;
use std::path::Path;

use anyhow::Context as _;

use crate::{
    error::{TextoverError, TextoverResult},
    style::{FontStack, Style, weight_for_thickness},
};

/// Pixel size of a scale-1.0 glyph line. `Style::scale` is a multiplier on
/// this, not a pixel size directly.
pub const BASE_FONT_PX: f32 = 22.0;

/// Measured pixel extent of a laid-out text string.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Injectable text-measurement capability.
///
/// The fitter only depends on this trait, so its numeric behavior can be
/// tested without a rendering backend.
pub trait TextMeasurer {
    fn measure(
        &mut self,
        text: &str,
        font: &FontStack,
        scale: f32,
        thickness: u32,
    ) -> TextoverResult<TextExtent>;
}

/// Stateful helper for building Parley text layouts.
pub struct ParleyMeasurer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<BrushRgba8>,
}

impl Default for ParleyMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParleyMeasurer {
    /// Construct a measurer with fresh Parley contexts over the system font
    /// collection.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register every `.ttf`/`.otf` file found in `dir` with the font
    /// collection and return one [`FontStack`] per registered family name.
    pub fn register_fonts_dir(&mut self, dir: &Path) -> TextoverResult<Vec<FontStack>> {
        let mut stacks = Vec::new();
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("read fonts dir '{}'", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("read fonts dir '{}'", dir.display()))?;
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf"))
                .unwrap_or(false);
            if !is_font {
                continue;
            }

            let bytes = std::fs::read(&path)
                .with_context(|| format!("read font file '{}'", path.display()))?;
            let families = self
                .font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(bytes), None);
            for (family_id, _) in families {
                if let Some(name) = self.font_ctx.collection.family_name(family_id) {
                    stacks.push(FontStack::new(name.to_string()));
                }
            }
        }
        Ok(stacks)
    }

    /// Shape and lay out a single line of text under `style`, with the brush
    /// applied to every glyph run.
    pub fn layout(
        &mut self,
        text: &str,
        style: &Style,
        brush: BrushRgba8,
    ) -> TextoverResult<parley::Layout<BrushRgba8>> {
        let size_px = style.scale * BASE_FONT_PX;
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(TextoverError::render(
                "text size must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(style.font.0.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(weight_for_thickness(style.thickness)),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<BrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        Ok(layout)
    }
}

impl TextMeasurer for ParleyMeasurer {
    fn measure(
        &mut self,
        text: &str,
        font: &FontStack,
        scale: f32,
        thickness: u32,
    ) -> TextoverResult<TextExtent> {
        let style = Style {
            font: font.clone(),
            scale,
            thickness,
            color: crate::style::Rgb { r: 0, g: 0, b: 0 },
        };
        let layout = self.layout(text, &style, BrushRgba8::default())?;
        Ok(TextExtent {
            width: layout.width(),
            height: layout.height(),
        })
    }
}
