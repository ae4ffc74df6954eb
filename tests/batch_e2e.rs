use std::io::Cursor;
use std::path::{Path, PathBuf};

use textover::{BatchConfig, TextoverError, run_batch};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join(name);
    let _ = std::fs::remove_dir_all(&dir);
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

fn config_in(dir: &Path) -> BatchConfig {
    BatchConfig {
        content_file: dir.join("noidung.txt"),
        images_dir: dir.join("images"),
        output_dir: dir.join("output"),
        manifest_file: dir.join("path_images.txt"),
        fonts_dir: dir.join("fonts"),
        ..BatchConfig::default()
    }
}

#[test]
fn three_lines_two_images_produce_three_outputs() {
    let dir = scratch_dir("e2e_three_lines");
    let config = config_in(&dir);

    std::fs::write(&config.content_file, "first caption\nsecond caption\nthird caption\n")
        .unwrap();
    std::fs::create_dir_all(&config.images_dir).unwrap();
    write_fixture_png(&config.images_dir.join("a.png"), 320, 200, [40, 90, 160, 255]);
    write_fixture_png(&config.images_dir.join("b.png"), 400, 300, [200, 120, 40, 255]);

    let success_count = run_batch(&config).unwrap();
    assert_eq!(success_count, 3);

    let manifest = std::fs::read_to_string(&config.manifest_file).unwrap();
    let paths: Vec<&str> = manifest.lines().collect();
    assert_eq!(paths.len(), 3);
    for path in &paths {
        let path = Path::new(path);
        assert!(path.is_absolute(), "manifest path not absolute: {}", path.display());
        assert!(path.exists(), "manifest path missing on disk: {}", path.display());
        assert_eq!(path.extension().unwrap(), "png");
    }

    let outputs = std::fs::read_dir(&config.output_dir).unwrap().count();
    assert_eq!(outputs, 3);
}

#[test]
fn outputs_decode_with_source_dimensions() {
    let dir = scratch_dir("e2e_dimensions");
    let config = config_in(&dir);

    std::fs::write(&config.content_file, "dimension check\n").unwrap();
    std::fs::create_dir_all(&config.images_dir).unwrap();
    write_fixture_png(&config.images_dir.join("only.png"), 256, 128, [12, 34, 56, 255]);

    assert_eq!(run_batch(&config).unwrap(), 1);

    let manifest = std::fs::read_to_string(&config.manifest_file).unwrap();
    let out = image::open(manifest.lines().next().unwrap()).unwrap();
    assert_eq!((out.width(), out.height()), (256, 128));
}

#[test]
fn missing_content_file_is_fatal_and_leaves_manifest_alone() {
    let dir = scratch_dir("e2e_missing_content");
    let config = config_in(&dir);

    std::fs::write(&config.manifest_file, "stale entry\n").unwrap();

    let err = run_batch(&config).unwrap_err();
    assert!(matches!(err, TextoverError::MissingInput(_)));

    // The reset happens after the content-file check, so a fatal startup
    // error leaves the pre-existing manifest in place.
    let manifest = std::fs::read_to_string(&config.manifest_file).unwrap();
    assert_eq!(manifest, "stale entry\n");
    assert!(!config.output_dir.exists());
}

#[test]
fn empty_images_folder_still_resets_manifest() {
    let dir = scratch_dir("e2e_empty_images");
    let config = config_in(&dir);

    std::fs::write(&config.content_file, "one\ntwo\n").unwrap();
    std::fs::create_dir_all(&config.images_dir).unwrap();
    std::fs::write(&config.manifest_file, "stale entry\n").unwrap();

    // Image availability is only checked per line, so the run completes with
    // zero successes instead of aborting.
    let success_count = run_batch(&config).unwrap();
    assert_eq!(success_count, 0);

    // The manifest was reset at startup and never re-created.
    assert!(!config.manifest_file.exists());
    assert_eq!(std::fs::read_dir(&config.output_dir).unwrap().count(), 0);
}

#[test]
fn undecodable_images_skip_lines_but_run_completes() {
    let dir = scratch_dir("e2e_bad_image");
    let config = config_in(&dir);

    std::fs::write(&config.content_file, "caption\n").unwrap();
    std::fs::create_dir_all(&config.images_dir).unwrap();
    std::fs::write(&config.images_dir.join("broken.png"), b"not a png").unwrap();

    let success_count = run_batch(&config).unwrap();
    assert_eq!(success_count, 0);
    assert!(!config.manifest_file.exists());
}
