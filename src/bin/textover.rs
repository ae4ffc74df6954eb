use clap::Parser;

/// Overlays one randomly styled line of text per content line onto a random
/// background image, writing each result to `output/` and logging its
/// absolute path in `path_images.txt`. All paths are fixed; there is nothing
/// to configure.
#[derive(Parser, Debug)]
#[command(name = "textover", version)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let _cli = Cli::parse();

    let config = textover::BatchConfig::default();
    let success_count = textover::run_batch(&config)?;

    eprintln!();
    eprintln!("processed {success_count} image(s)");
    eprintln!("paths saved to '{}'", config.manifest_file.display());

    if let Ok(manifest) = std::fs::read_to_string(&config.manifest_file) {
        let paths: Vec<&str> = manifest.lines().collect();
        if !paths.is_empty() {
            eprintln!();
            eprintln!("generated images:");
            for (i, path) in paths.iter().take(3).enumerate() {
                eprintln!("{}. {path}", i + 1);
            }
            if paths.len() > 3 {
                eprintln!("... and {} more", paths.len() - 3);
            }
        }
    }

    Ok(())
}
