use eframe::egui::{self, Key, Response, Ui};
use schematize::DisplayConfig;
use schematize::config::LinkIdentity;
use schematize::model::BinWindow;
use schematize::provider::DataProvider;

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;
const MAX_LISTED_PATHS: usize = 40;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    hold_secs: f32,
    direction: i8,
    carry: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Arrow-key nudging for a focused integer slider, speeding up while held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut u32,
    min: u32,
    max: u32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });
    let direction = (increase_down as i8) - (decrease_down as i8);

    if !response.has_focus() || direction == 0 {
        ui.ctx().data_mut(|data| {
            data.insert_temp(state_id, SliderKeyHoldState::default())
        });
        return false;
    }

    if direction != hold_state.direction {
        hold_state = SliderKeyHoldState {
            direction,
            ..SliderKeyHoldState::default()
        };
    }
    hold_state.hold_secs += delta_time;

    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_state.hold_secs);
    hold_state.carry += direction as f32 * speed * delta_time;
    let whole_delta = hold_state.carry.trunc() as i64;
    hold_state.carry -= whole_delta as f32;

    let old_value = *value;
    if whole_delta != 0 {
        *value = (i64::from(*value) + whole_delta).clamp(i64::from(min), i64::from(max)) as u32;
    }

    ui.ctx().request_repaint();
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));
    *value != old_value
}

fn pixel_slider(ui: &mut Ui, value: &mut u32, min: u32, max: u32, label: &str, hint: &str) {
    let slider = ui
        .add(egui::Slider::new(&mut *value, min..=max).text(label))
        .on_hover_text(hint);
    if slider.hovered() {
        slider.request_focus();
    }
    apply_slider_arrow_acceleration(ui, &slider, value, min, max);
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Display");
        ui.separator();
        ui.add_space(4.0);

        let mut edited = self.store.display().clone();

        ui.checkbox(&mut edited.use_width_compression, "Width compression")
            .on_hover_text("Draw every component body with a fixed number of columns.");
        ui.add_enabled_ui(edited.use_width_compression, |ui| {
            pixel_slider(
                ui,
                &mut edited.bin_scaling_factor,
                1,
                20,
                "Bin scaling factor",
                "Body columns per component while width compression is on.",
            );
        });
        ui.checkbox(&mut edited.use_vertical_compression, "Vertical compression")
            .on_hover_text("Hide rows that no visible component occupies.");
        ui.checkbox(&mut edited.use_connector, "Show connector links")
            .on_hover_text("Keep link columns between neighbouring bins.");

        ui.separator();

        pixel_slider(
            ui,
            &mut edited.pixels_per_column,
            1,
            40,
            "Pixels per column",
            "Column width; also resizes the bin window to the viewport.",
        );
        pixel_slider(
            ui,
            &mut edited.pixels_per_row,
            1,
            30,
            "Pixels per row",
            "Row height; also scales link arrow elevation.",
        );
        ui.add(egui::Slider::new(&mut edited.left_offset, 0.0..=200.0).text("Left offset"));
        ui.add(egui::Slider::new(&mut edited.nucleotide_height, 4.0..=30.0).text("Nucleotide height"));

        ui.horizontal(|ui| {
            ui.label("Link identity");
            ui.selectable_value(&mut edited.link_identity, LinkIdentity::Fingerprint, "Fingerprint")
                .on_hover_text("Links match when (upstream + 1) * (downstream + 1) agree.");
            ui.selectable_value(&mut edited.link_identity, LinkIdentity::Pair, "Exact pair")
                .on_hover_text("Links match only on identical upstream and downstream bins.");
        });

        self.commit_display_edits(&edited);

        ui.separator();
        self.draw_window_controls(ui);

        ui.separator();
        self.draw_path_filter(ui);
    }

    fn commit_display_edits(&mut self, edited: &DisplayConfig) {
        self.store.set_use_width_compression(edited.use_width_compression);
        self.store.set_bin_scaling_factor(edited.bin_scaling_factor);
        self.store.set_use_vertical_compression(edited.use_vertical_compression);
        self.store.set_use_connector(edited.use_connector);
        self.store.set_pixels_per_column(edited.pixels_per_column);
        self.store.set_pixels_per_row(edited.pixels_per_row);
        self.store.set_left_offset(edited.left_offset);
        self.store.set_nucleotide_height(edited.nucleotide_height);
        self.store.set_link_identity(edited.link_identity);
    }

    fn draw_window_controls(&mut self, ui: &mut Ui) {
        ui.label("Bin window");

        let window = self.store.display().window();
        let last_bin = self.provider.index().last_bin().max(1);
        let mut begin = window.begin;
        let mut end = window.end;

        ui.horizontal(|ui| {
            ui.add(egui::DragValue::new(&mut begin).range(1..=last_bin).prefix("begin "));
            ui.add(egui::DragValue::new(&mut end).range(1..=last_bin).prefix("end "));
        });
        if (begin, end) != (window.begin, window.end) {
            self.set_window(BinWindow::new(begin, end));
        }

        ui.horizontal(|ui| {
            if ui
                .button("< Previous")
                .on_hover_text("Shift the window left by its own width.")
                .clicked()
            {
                self.shift_window(-1);
            }
            if ui
                .button("Next >")
                .on_hover_text("Shift the window right by its own width.")
                .clicked()
            {
                self.shift_window(1);
            }
        });

        let (chunk_begin, chunk_end) = self.store.chunk_begin_end_bin();
        ui.small(format!(
            "{} chunks loaded, bins {chunk_begin}..={chunk_end}, bin width {}",
            self.store.chunk_urls().len(),
            self.store.display().bin_width
        ));
    }

    fn draw_path_filter(&mut self, ui: &mut Ui) {
        ui.label("Path filter")
            .on_hover_text("Fuzzy-highlight rows whose path name matches.");
        ui.text_edit_singleline(&mut self.path_filter);

        let Some(matches) = self.cached_path_matches() else {
            ui.small(format!("{} paths", self.provider.path_names().len()));
            return;
        };

        ui.small(format!("{} matching paths", matches.len()));
        let mut rows = matches.iter().copied().collect::<Vec<_>>();
        rows.sort_unstable();

        egui::ScrollArea::vertical()
            .max_height(220.0)
            .show(ui, |ui| {
                for row in rows.into_iter().take(MAX_LISTED_PATHS) {
                    if let Some(name) = self.provider.path_names().get(row) {
                        ui.label(format!("{row}: {name}"));
                    }
                }
            });
    }
}
