use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use rand::Rng;
use tracing::debug;

use crate::{
    config::BatchConfig,
    error::{TextoverError, TextoverResult},
    fit::{fit_scale, shrink_factor},
    measure::{BrushRgba8, ParleyMeasurer, TextExtent},
    place::select_position,
    style::{self, FontStack, Style},
};

/// Decoded background image in premultiplied RGBA8 form.
pub(crate) struct Background {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba8_premul: Vec<u8>,
}

pub(crate) fn decode_background(path: &Path) -> TextoverResult<Background> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let dyn_img = image::load_from_memory(&bytes)
        .map_err(|e| TextoverError::decode(format!("{}: {e}", path.display())))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(Background {
        width,
        height,
        rgba8_premul,
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Retry `attempt_fn` up to `max_attempts` times, returning the first success
/// or the last attempt's error.
pub(crate) fn with_retries<T>(
    max_attempts: u32,
    mut attempt_fn: impl FnMut(u32) -> TextoverResult<T>,
) -> TextoverResult<T> {
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match attempt_fn(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(attempt, error = %err, "render attempt failed");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| TextoverError::render("retry budget is zero")))
}

/// Draw `text` onto the image at `src` with a randomized style and write the
/// result to `out`, overwriting any existing file.
///
/// A decode failure of the source image is an input error and is not retried.
/// The style/position/draw/save sequence is retried up to
/// `config.max_attempts` times; rare degenerate measurements consume an
/// attempt instead of failing the line outright.
pub fn render_text_onto(
    src: &Path,
    text: &str,
    out: &Path,
    fonts: &[FontStack],
    config: &BatchConfig,
    measurer: &mut ParleyMeasurer,
    rng: &mut impl Rng,
) -> TextoverResult<()> {
    let background = decode_background(src)?;
    with_retries(config.max_attempts, |_| {
        render_attempt(&background, text, out, fonts, config, measurer, rng)
    })
}

fn render_attempt(
    background: &Background,
    text: &str,
    out: &Path,
    fonts: &[FontStack],
    config: &BatchConfig,
    measurer: &mut ParleyMeasurer,
    rng: &mut impl Rng,
) -> TextoverResult<()> {
    let font = style::pick(fonts, rng)?.clone();
    let fitted = fit_scale(
        background.width,
        background.height,
        text,
        &font,
        config.limits,
        measurer,
    )?;
    let scale = fitted * shrink_factor(config.shrink.0, config.shrink.1, rng);
    let thickness = style::random_thickness(scale, rng);
    let color = style::pick(&config.palette, rng)?.rgb;

    let style = Style {
        font,
        scale,
        thickness,
        color,
    };
    let brush = BrushRgba8 {
        r: color.r,
        g: color.g,
        b: color.b,
        a: 255,
    };
    let layout = measurer.layout(text, &style, brush)?;
    let extent = TextExtent {
        width: layout.width(),
        height: layout.height(),
    };
    let (x, y) = select_position(
        background.width,
        background.height,
        extent,
        config.limits.margin,
        rng,
    );

    let frame = compose(background, &layout, x, y)?;
    save_png(out, &frame, background.width, background.height)
}

/// Composite the glyph runs over the background and read the frame back as
/// RGBA8 bytes. The selected `y` becomes the first line's baseline.
pub(crate) fn compose(
    background: &Background,
    layout: &parley::Layout<BrushRgba8>,
    x: i32,
    y: i32,
) -> TextoverResult<Vec<u8>> {
    let width_u16: u16 = background
        .width
        .try_into()
        .map_err(|_| TextoverError::render("image width exceeds u16"))?;
    let height_u16: u16 = background
        .height
        .try_into()
        .map_err(|_| TextoverError::render("image height exceeds u16"))?;

    let pixmap = premul_bytes_to_pixmap(
        &background.rgba8_premul,
        background.width,
        background.height,
    )?;
    let background_paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(background_paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(background.width),
        f64::from(background.height),
    ));

    let baseline = first_baseline(layout);
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((
        f64::from(x),
        f64::from(y) - f64::from(baseline),
    )));

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let resolved = run.run().font();
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(resolved.data.as_ref().to_vec()),
                resolved.index,
            );
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }

    ctx.flush();
    let mut out = vello_cpu::Pixmap::new(width_u16, height_u16);
    ctx.render_to_pixmap(&mut out);
    Ok(out.data_as_u8_slice().to_vec())
}

fn first_baseline(layout: &parley::Layout<BrushRgba8>) -> f32 {
    for line in layout.lines() {
        for item in line.items() {
            if let parley::layout::PositionedLayoutItem::GlyphRun(run) = item {
                return run.baseline();
            }
        }
    }
    0.0
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> TextoverResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TextoverError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TextoverError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(TextoverError::render("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn save_png(path: &Path, rgba8: &[u8], width: u32, height: u32) -> TextoverResult<()> {
    image::save_buffer_with_format(
        path,
        rgba8,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from("target").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_fixture_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(path, buf).unwrap();
    }

    #[test]
    fn decode_background_dimensions_and_premul() {
        let dir = scratch_dir("render_decode");
        let path = dir.join("px.png");
        write_fixture_png(&path, 1, 1, [100, 50, 200, 128]);

        let bg = decode_background(&path).unwrap();
        assert_eq!(bg.width, 1);
        assert_eq!(bg.height, 1);
        assert_eq!(
            bg.rgba8_premul,
            vec![
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_background_rejects_garbage() {
        let dir = scratch_dir("render_decode_bad");
        let path = dir.join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            decode_background(&path),
            Err(TextoverError::Decode(_))
        ));
    }

    #[test]
    fn retries_swallow_transient_failures() {
        let mut calls = 0u32;
        let result = with_retries(5, |_| {
            calls += 1;
            if calls < 3 {
                Err(TextoverError::render("transient"))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn retries_surface_last_error_when_exhausted() {
        let mut calls = 0u32;
        let result: TextoverResult<()> = with_retries(5, |attempt| {
            calls += 1;
            Err(TextoverError::render(format!("attempt {attempt}")))
        });
        assert_eq!(calls, 5);
        assert!(result.unwrap_err().to_string().contains("attempt 4"));
    }

    #[test]
    fn compose_preserves_background_corner() {
        let background = decode_fixture(64, 64, [10, 20, 30, 255]);
        let mut measurer = ParleyMeasurer::new();
        let style = Style {
            font: FontStack::new("sans-serif"),
            scale: 1.0,
            thickness: 1,
            color: crate::style::Rgb { r: 255, g: 255, b: 0 },
        };
        let layout = measurer
            .layout("hi", &style, BrushRgba8 { r: 255, g: 255, b: 0, a: 255 })
            .unwrap();

        let frame = compose(&background, &layout, 20, 40).unwrap();
        assert_eq!(frame.len(), 64 * 64 * 4);
        // The text anchor keeps the margin clear, so the corner is untouched.
        assert_eq!(&frame[0..4], &[10, 20, 30, 255]);
    }

    fn decode_fixture(w: u32, h: u32, rgba: [u8; 4]) -> Background {
        let dir = scratch_dir("render_compose");
        let path = dir.join(format!("bg_{w}x{h}.png"));
        write_fixture_png(&path, w, h, rgba);
        decode_background(&path).unwrap()
    }
}
