use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Vec2};
use log::{error, info};
use schematize::provider::{DataProvider, FetchedChunks, Schematic};
use schematize::{ConfigField, ConfigStore, DisplayConfig, SchematicEngine};

mod render_utils;
mod schematic;
mod ui;

pub struct SchematizeApp {
    data_dir: PathBuf,
    initial_config: DisplayConfig,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedData, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct LoadedData {
    provider: Schematic,
    store: ConfigStore,
}

struct ViewModel {
    store: ConfigStore,
    engine: SchematicEngine,
    provider: Schematic,
    chunk_rx: Option<Receiver<Result<FetchedChunks, String>>>,
    deferred: BTreeSet<ConfigField>,
    pan: Vec2,
    path_filter: String,
    path_filter_cache: Option<PathFilterCache>,
    hovered_key: Option<String>,
    status: Option<String>,
}

struct PathFilterCache {
    query: String,
    revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl SchematizeApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        data_dir: PathBuf,
        initial_config: DisplayConfig,
    ) -> Self {
        let state = Self::start_load(data_dir.clone(), initial_config.clone());
        Self {
            data_dir,
            initial_config,
            state,
        }
    }

    fn spawn_load(data_dir: PathBuf, config: DisplayConfig) -> Receiver<Result<LoadedData, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_schematic(data_dir, config).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(data_dir: PathBuf, config: DisplayConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(data_dir, config),
        }
    }
}

fn load_schematic(data_dir: PathBuf, config: DisplayConfig) -> anyhow::Result<LoadedData> {
    let mut provider = Schematic::open(&data_dir)
        .with_context(|| format!("failed to open schematic data in {}", data_dir.display()))?;
    let mut store = ConfigStore::new(config);
    store.set_bin_width(provider.index().bin_width);

    if let Some(selection) = provider.index().chunks_for_window(store.display().window()) {
        provider
            .fetch_chunks(&selection.urls)
            .with_context(|| format!("failed to read chunks {:?}", selection.urls))?;
        store.update_chunks(selection.urls, selection.begin_end);
    }

    info!(
        "loader finished: {} chunks requested",
        store.chunk_urls().len()
    );
    Ok(LoadedData { provider, store })
}

impl eframe::App for SchematizeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(data)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(data))));
                    }
                    Ok(Err(message)) => {
                        error!("failed to load schematic: {message}");
                        transition = Some(AppState::Error(message));
                    }
                    Err(mpsc::TryRecvError::Empty) => ctx.request_repaint(),
                    Err(mpsc::TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading schematic chunks...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load schematic data");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(
                            self.data_dir.clone(),
                            self.initial_config.clone(),
                        ));
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx, &self.data_dir);
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
