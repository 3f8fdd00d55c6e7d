mod app;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use log::info;
use schematize::DisplayConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding bin2file.json and the chunk files it lists.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// JSON file overriding display settings.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    begin_bin: Option<i64>,

    #[arg(long)]
    end_bin: Option<i64>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let mut config = match &args.config {
        Some(path) => DisplayConfig::from_json_file(path)
            .with_context(|| format!("failed to load display config {}", path.display()))?,
        None => DisplayConfig::default(),
    };
    if let Some(begin) = args.begin_bin {
        config.begin_bin = begin;
    }
    if let Some(end) = args.end_bin {
        config.end_bin = end;
    }

    info!(
        "starting viewer on {} for bins {}..={}",
        args.data_dir.display(),
        config.begin_bin,
        config.end_bin
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "schematize",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::SchematizeApp::new(
                cc,
                args.data_dir.clone(),
                config,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
