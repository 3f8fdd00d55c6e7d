use std::collections::BTreeSet;
use std::path::Path;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use eframe::egui::{self, Align, Context, Layout, Vec2};
use log::{debug, info, warn};
use schematize::model::BinWindow;
use schematize::{ConfigField, Reaction, SchematicEngine};

use super::super::{LoadedData, ViewModel};

impl ViewModel {
    // A pushed-back top offset or bin window settles within two rounds.
    pub(in crate::app) const MAX_DISPATCH_ROUNDS: usize = 4;

    pub(in crate::app) fn new(data: LoadedData) -> Self {
        let LoadedData { provider, store } = data;
        let engine = SchematicEngine::new(store.display());

        let mut model = Self {
            store,
            engine,
            provider,
            chunk_rx: None,
            deferred: BTreeSet::new(),
            pan: Vec2::ZERO,
            path_filter: String::new(),
            path_filter_cache: None,
            hovered_key: None,
            status: None,
        };
        model.apply_pending_changes();
        model
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, data_dir: &Path) {
        self.apply_pending_changes();
        if self.chunk_rx.is_some() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("schematize");
                    ui.separator();
                    ui.label(format!("data: {}", data_dir.display()));
                    ui.label(format!(
                        "bins: {}..={}",
                        self.store.begin_bin(),
                        self.store.end_bin()
                    ));
                    ui.label(format!("components: {}", self.engine.components().len()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(link_text) = self.link_status_text() {
                            ui.label(link_text);
                        }
                        if let Some(status) = &self.status {
                            ui.colored_label(ui.visuals().warn_fg_color, status);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.engine.is_loading() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Waiting for chunk data...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_schematic(ui);
            }
        });
    }

    fn link_status_text(&self) -> Option<String> {
        let state = self.engine.highlight_state();
        if let Some(selected) = &state.selected_link {
            return Some(format!(
                "selected {} -> {}",
                selected.upstream, selected.downstream
            ));
        }
        state.highlighted_link.as_ref().map(|highlighted| {
            format!(
                "highlighted {} -> {}",
                highlighted.upstream, highlighted.downstream
            )
        })
    }

    pub(in crate::app) fn shift_window(&mut self, direction: i64) {
        let window = self.store.display().window();
        let step = (window.width() + 1) * direction;
        let last_bin = self.provider.index().last_bin().max(1);
        let begin = (window.begin + step).clamp(1, last_bin);
        self.store
            .update_begin_end_bin(begin, begin + window.width());
    }

    pub(in crate::app) fn set_window(&mut self, window: BinWindow) {
        let begin = window.begin.max(1);
        let end = window.end.max(begin);
        self.store.update_begin_end_bin(begin, end);
    }

    fn refresh_chunk_selection(&mut self) {
        let window = self.store.display().window();
        match self.provider.index().chunks_for_window(window) {
            Some(selection) => self.store.update_chunks(selection.urls, selection.begin_end),
            None => warn!(
                "no chunk covers bins {}..={}",
                window.begin, window.end
            ),
        }
    }

    fn start_chunk_fetch(&mut self) -> bool {
        let missing = self.provider.missing_chunks(self.store.chunk_urls());
        if missing.is_empty() {
            return false;
        }

        info!("reading {} chunks in the background", missing.len());
        let reader = self.provider.reader();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = reader
                .read(&missing)
                .map_err(|error| format!("failed to read chunks {missing:?}: {error}"));
            let _ = tx.send(result);
        });
        self.chunk_rx = Some(rx);
        true
    }

    fn poll_chunk_fetch(&mut self) {
        let Some(rx) = &self.chunk_rx else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(fetched)) => {
                debug!("{} chunks arrived", fetched.len());
                self.provider.insert_chunks(fetched);
            }
            Ok(Err(message)) => {
                warn!("{message}");
                self.status = Some(message);
                self.deferred.remove(&ConfigField::ChunkUrls);
            }
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.status = Some("Chunk reader disconnected".to_owned());
                self.deferred.remove(&ConfigField::ChunkUrls);
            }
        }
        self.chunk_rx = None;
    }

    fn apply_reaction(&mut self, reaction: &Reaction) {
        if let Some(top_offset) = reaction.top_offset {
            self.store.update_top_offset(top_offset);
        }
        if let Some(window) = reaction.bin_window {
            self.set_window(window);
        }
    }

    pub(in crate::app) fn apply_pending_changes(&mut self) {
        self.poll_chunk_fetch();

        for _ in 0..Self::MAX_DISPATCH_ROUNDS {
            let mut changed = self.store.take_changes();
            if self.chunk_rx.is_none() {
                changed.append(&mut self.deferred);
            }
            if changed.contains(&ConfigField::BeginEndBin) {
                self.refresh_chunk_selection();
                changed.extend(self.store.take_changes());
            }

            // The whole batch waits for the chunks.
            let fetching = self.chunk_rx.is_some()
                || (changed.contains(&ConfigField::ChunkUrls) && self.start_chunk_fetch());
            if fetching {
                self.deferred.append(&mut changed);
            }
            if changed.is_empty() {
                return;
            }

            debug!("config changed: {changed:?}");
            match self
                .engine
                .on_config_changed(&self.store, &mut self.provider, &changed)
            {
                Ok(reaction) => {
                    self.apply_reaction(&reaction);
                    if reaction.data_updated {
                        self.status = None;
                    }
                }
                Err(error) => {
                    warn!("failed to apply config change: {error}");
                    self.apply_reaction(&error.reaction);
                    self.status = Some(error.to_string());
                }
            }
        }

        if self.store.has_pending_changes() {
            debug!(
                "config changes still pending after {} rounds",
                Self::MAX_DISPATCH_ROUNDS
            );
        }
    }
}
