use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rand::Rng;
use rand::seq::SliceRandom as _;
use sha2::Digest as _;
use tracing::{info, warn};

use crate::{
    config::BatchConfig,
    error::{TextoverError, TextoverResult},
    measure::ParleyMeasurer,
    render,
    style::FontStack,
};

/// Read the content file as trimmed, non-empty lines.
pub fn read_content_lines(path: &Path) -> TextoverResult<Vec<String>> {
    if !path.exists() {
        return Err(TextoverError::missing_input(format!(
            "content file '{}' does not exist",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read content file '{}'", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or(false)
}

/// Uniform-random background pick from the images folder.
pub fn pick_random_image(dir: &Path, rng: &mut impl Rng) -> TextoverResult<PathBuf> {
    if !dir.exists() {
        return Err(TextoverError::missing_input(format!(
            "images folder '{}' does not exist",
            dir.display()
        )));
    }

    let mut candidates = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("list images folder '{}'", dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("list images folder '{}'", dir.display()))?;
        let path = entry.path();
        if has_image_extension(&path) {
            candidates.push(path);
        }
    }
    candidates.sort();

    candidates.choose(rng).cloned().ok_or_else(|| {
        TextoverError::empty_image_dir(format!("no images in folder '{}'", dir.display()))
    })
}

/// Short random output name: 6 hex chars of the digest of a random
/// 16-character alphanumeric string, with a `.png` extension. Collisions
/// within a run are treated as negligible and not checked.
pub fn random_output_filename(rng: &mut impl Rng) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let seed: String = (0..16)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    let digest = sha2::Sha256::digest(seed.as_bytes());
    let mut short_hash = String::with_capacity(6);
    for byte in digest.iter().take(3) {
        short_hash.push_str(&format!("{byte:02x}"));
    }
    format!("{short_hash}.png")
}

/// Append one absolute path to the manifest, opening and closing the file
/// within the call.
fn append_manifest(path: &Path, absolute: &Path) -> TextoverResult<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open manifest '{}'", path.display()))?;
    writeln!(file, "{}", absolute.display())
        .with_context(|| format!("append manifest '{}'", path.display()))?;
    Ok(())
}

/// Run the whole batch: one output image per content line.
///
/// A missing content file is fatal. Everything that goes wrong for a single
/// line (missing or empty images folder, undecodable background, exhausted
/// render retries) is logged and skipped. Returns the number of lines that
/// produced an output image and a manifest entry.
#[tracing::instrument(skip(config))]
pub fn run_batch(config: &BatchConfig) -> TextoverResult<usize> {
    let lines = read_content_lines(&config.content_file)?;
    info!(lines = lines.len(), "loaded content lines");

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("create output dir '{}'", config.output_dir.display()))?;
    if config.manifest_file.exists() {
        fs::remove_file(&config.manifest_file)
            .with_context(|| format!("reset manifest '{}'", config.manifest_file.display()))?;
    }

    let mut measurer = ParleyMeasurer::new();
    let mut fonts = config.fonts.clone();
    if config.fonts_dir.is_dir() {
        let extra = measurer.register_fonts_dir(&config.fonts_dir)?;
        if !extra.is_empty() {
            info!(count = extra.len(), "registered extra font families");
            fonts.extend(extra);
        }
    }

    let mut rng = rand::thread_rng();
    let mut success_count = 0usize;
    for (idx, line) in lines.iter().enumerate() {
        let preview: String = line.chars().take(50).collect();
        info!(line = idx + 1, total = lines.len(), text = %preview, "processing");

        match process_line(line, &fonts, config, &mut measurer, &mut rng) {
            Ok(out_path) => {
                success_count += 1;
                info!(path = %out_path.display(), "wrote image");
            }
            Err(err) => warn!(line = idx + 1, error = %err, "skipping line"),
        }
    }

    Ok(success_count)
}

fn process_line(
    text: &str,
    fonts: &[FontStack],
    config: &BatchConfig,
    measurer: &mut ParleyMeasurer,
    rng: &mut impl Rng,
) -> TextoverResult<PathBuf> {
    let src = pick_random_image(&config.images_dir, rng)?;
    let out_path = config.output_dir.join(random_output_filename(rng));

    render::render_text_onto(&src, text, &out_path, fonts, config, measurer, rng)?;

    let absolute = std::path::absolute(&out_path)
        .with_context(|| format!("resolve absolute path '{}'", out_path.display()))?;
    append_manifest(&config.manifest_file, &absolute)?;
    Ok(absolute)
}
