use std::time::Duration;

use eframe::egui::{self, Rect, Ui, Vec2};
use log::debug;

use super::super::ViewModel;
use super::view::HitTarget;

impl ViewModel {
    pub(in crate::app) fn handle_schematic_pan(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || response.dragged_by(egui::PointerButton::Primary)
        {
            self.pan += response.drag_delta();
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.smooth_scroll_delta);
            if scroll != Vec2::ZERO {
                self.pan += scroll;
            }
        }

        let canvas_width = self.engine.layout().map_or(0.0, |layout| layout.actual_width);
        let min_x = (rect.width() - canvas_width - self.store.display().left_offset).min(0.0);
        self.pan.x = self.pan.x.clamp(min_x, 0.0);
        self.pan.y = self.pan.y.min(0.0);
    }

    pub(in crate::app) fn handle_link_pointer(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        hits: &[HitTarget],
        now: Duration,
    ) {
        let pointer = if response.hovered() {
            ui.input(|input| input.pointer.hover_pos())
        } else {
            None
        };

        let Some(hit) = Self::hovered_target(pointer, hits) else {
            if self.hovered_key.take().is_some() {
                self.engine.on_hover_end(now);
            }
            return;
        };

        if self.hovered_key.as_deref() != Some(hit.link_column.key.as_str()) {
            self.hovered_key = Some(hit.link_column.key.clone());
            self.engine.on_hover(&hit.link_column, now);
        }

        if response.clicked() && self.engine.on_click(&hit.link_column, now) {
            debug!(
                "selected link {} -> {}",
                hit.link_column.upstream, hit.link_column.downstream
            );
            ui.ctx().request_repaint();
        }
    }
}
