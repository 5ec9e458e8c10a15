//! sdt-undub: copy the audio of one dub's `.sdt` containers over another
//! dub's, keeping that dub's video and subtitles.
//!
//! Commands:
//!   stitch   one source/target pair
//!   undub    whole directory trees
//!   diff     files missing from either tree
//!   inspect  per-stream summary of containers

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use undub_common::UndubConfig;
use undub_sdt::{decode, inspect, read_container, stitch_files, ContainerSummary, StitchOptions};
use undub_tree::{unique_files, write_output, UndubRun};

use cli::{Cli, Command};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    tracing::debug!("sdt-undub v{}", env!("CARGO_PKG_VERSION"));

    let options = StitchOptions::from_config(&config).context("Invalid audio format list")?;

    match cli.command {
        Command::Stitch {
            source,
            target,
            output,
        } => stitch_pair(&source, &target, &output, &options),
        Command::Undub {
            source,
            target,
            output,
        } => {
            let (Some(source_root), Some(target_root), Some(output_root)) = (
                source.or(config.source_root),
                target.or(config.target_root),
                output.or(config.output_root),
            ) else {
                bail!("undub needs --source, --target and --output (or the same keys in the config)");
            };
            undub_trees(UndubRun {
                source_root,
                target_root,
                output_root,
                options,
            })
        }
        Command::Diff { first, second } => diff_trees(&first, &second),
        Command::Inspect { files, json } => inspect_files(&files, json, &options),
    }
}

/// Config file (if any) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<UndubConfig> {
    let mut config = match &cli.config {
        Some(path) => UndubConfig::load(path)?,
        None => UndubConfig::default(),
    };
    if cli.strict {
        config.strict = true;
    }
    if !cli.audio_formats.is_empty() {
        config.audio_formats = cli.audio_formats.clone();
    }
    if let Some(extension) = &cli.extension {
        config.extension = extension.trim_start_matches('.').to_string();
    }
    Ok(config)
}

fn stitch_pair(
    source: &Path,
    target: &Path,
    output: &Path,
    options: &StitchOptions,
) -> Result<ExitCode> {
    let stitched = stitch_files(source, target, options)
        .with_context(|| format!("Stitching {} into {}", source.display(), target.display()))?;

    let (dir, name) = match (output.parent(), output.file_name()) {
        (Some(dir), Some(name)) => (dir, Path::new(name)),
        _ => bail!("Invalid output path {}", output.display()),
    };
    write_output(dir, name, &stitched.bytes)?;

    let stats = stitched.stats;
    if stats.audio_only_source {
        println!("{}: audio-only source copied whole", output.display());
    } else {
        println!(
            "{}: {} audio chunks replaced, {} dropped, {} appended",
            output.display(),
            stats.replaced,
            stats.dropped,
            stats.appended
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn undub_trees(job: UndubRun) -> Result<ExitCode> {
    let summary = undub_tree::run(&job).context("Undub run aborted")?;

    for failure in &summary.failures {
        println!("FAILED {}: {}", failure.path.display(), failure.error);
    }
    println!(
        "{} files: {} stitched, {} skipped, {} failed",
        summary.files,
        summary.stitched,
        summary.skipped,
        summary.failed()
    );
    if summary.short_on_audio > 0 {
        println!(
            "{} files had fewer source audio chunks than target slots",
            summary.short_on_audio
        );
    }
    println!("Proportion of failed files: {:.4}", summary.failure_ratio());

    Ok(if summary.failed() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn diff_trees(first: &Path, second: &Path) -> Result<ExitCode> {
    for (a, b) in [(first, second), (second, first)] {
        let unique = unique_files(a, b)
            .with_context(|| format!("Comparing {} with {}", a.display(), b.display()))?;
        println!("Files exclusively found in {}:", a.display());
        for file in &unique {
            println!("  {:>12}  {}", file.size, file.relative.display());
        }
        println!("Different files: {}", unique.len());
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn inspect_files(files: &[PathBuf], json: bool, options: &StitchOptions) -> Result<ExitCode> {
    let mut failed = false;
    for path in files {
        let summary = match summarize(path, options) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("{:#}", e);
                failed = true;
                continue;
            }
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            continue;
        }

        println!("{}", path.display());
        for stream in &summary.streams {
            let first = stream
                .first_offset
                .map(|o| format!("0x{:08X}", o))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:08X}  {:<8} {:>6} sections {:>12} bytes  first at {}",
                stream.stream_id,
                stream.format.extension(),
                stream.sections,
                stream.bytes,
                first
            );
        }
        if !summary.terminated {
            println!("  (no end-of-stream marker)");
        }
        if summary.trailing_bytes > 0 {
            println!("  ({} bytes after end-of-stream marker)", summary.trailing_bytes);
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn summarize(path: &Path, options: &StitchOptions) -> Result<ContainerSummary> {
    let data = read_container(path, &options.extension)?;
    let container = decode(&data, options.strictness)
        .with_context(|| format!("Decoding {}", path.display()))?;
    Ok(inspect(&container))
}
