use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use schematize::layout::{LinkKind, link_column_cells, occupant_cells};
use schematize::model::LinkColumn;
use schematize::provider::DataProvider;
use schematize::rows::row_y;

use super::super::render_utils::{
    COMPONENT_OUTLINE, NUCLEOTIDE_TEXT, OCCUPANT_FILL, arrow_stroke, draw_background,
    layout_to_screen, link_fill, link_stroke, span_visible,
};
use super::super::{PathFilterCache, ViewModel};

const PATH_BAND: Color32 = Color32::from_rgba_premultiplied(60, 40, 0, 40);
const ARROW_HIT_PADDING: f32 = 3.0;

pub(in crate::app) struct HitTarget {
    pub(in crate::app) rect: Rect,
    pub(in crate::app) link_column: LinkColumn,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn cached_path_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.path_filter.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.engine.revision();
        if let Some(cached) = &self.path_filter_cache
            && cached.revision == revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .provider
            .path_names()
            .iter()
            .enumerate()
            .filter(|(_, name)| fuzzy_match_score(&matcher, name, query).is_some())
            .map(|(row, _)| row)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.path_filter_cache = Some(PathFilterCache {
            query: query.to_owned(),
            revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_schematic(&mut self, ui: &mut Ui) {
        let now = Duration::from_secs_f64(ui.input(|input| input.time));
        self.engine.tick(now);

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.engine.set_viewport_width(rect.width());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        self.handle_schematic_pan(ui, rect, &response);

        let path_matches = self.cached_path_matches();
        let hits = self.paint_schematic(&painter, rect, path_matches.as_deref());
        self.handle_link_pointer(ui, &response, &hits, now);

        if let Some(deadline) = self.engine.next_deadline() {
            ui.ctx().request_repaint_after(deadline.saturating_sub(now));
        }
    }

    fn paint_schematic(
        &self,
        painter: &Painter,
        rect: Rect,
        path_matches: Option<&HashSet<usize>>,
    ) -> Vec<HitTarget> {
        let mut hits = Vec::new();
        let Some(layout) = self.engine.layout() else {
            return hits;
        };

        let config = self.store.display();
        let mapping = self.engine.row_mapping();
        let origin = rect.left_top() + vec2(config.left_offset, 0.0);
        let pan = self.pan;
        let body_top = layout.top_offset;
        let body_height = self.engine.visible_height(config);
        let column_px = config.column_px();
        let to_screen = |x: f32, y: f32| layout_to_screen(origin, pan, x, y);

        if let Some(matches) = path_matches {
            for &row in matches {
                let Some(y) = row_y(row, config, mapping) else {
                    continue;
                };
                let top = to_screen(0.0, body_top + y).y;
                let band = Rect::from_x_y_ranges(rect.x_range(), top..=top + config.row_px());
                painter.rect_filled(band, 0.0, PATH_BAND);
            }
        }

        for record in &layout.links {
            let geometry = &record.geometry;
            if !span_visible(
                rect,
                to_screen(geometry.x1.min(geometry.x2), 0.0).x,
                to_screen(geometry.x1.max(geometry.x2), 0.0).x,
            ) {
                continue;
            }

            let appearance = self.engine.link_appearance(&record.link_column, config);
            let points = geometry.points().map(|(x, y)| to_screen(x, y));
            painter.add(Shape::line(points.to_vec(), arrow_stroke(&appearance, 1.0)));

            if record.kind != LinkKind::DanglingDeparture {
                let head = points[3];
                painter.add(Shape::convex_polygon(
                    vec![head, head + vec2(-3.0, -4.0), head + vec2(3.0, -4.0)],
                    link_fill(&appearance),
                    Stroke::NONE,
                ));
            }

            for segment in points.windows(2) {
                hits.push(HitTarget {
                    rect: Rect::from_two_pos(segment[0], segment[1]).expand(ARROW_HIT_PADDING),
                    link_column: record.link_column.clone(),
                });
            }
        }

        for (component, placed) in self.engine.components().iter().zip(&layout.components) {
            let left = to_screen(placed.x, 0.0).x;
            if !span_visible(rect, left, left + placed.width) {
                continue;
            }

            let body = Rect::from_min_size(
                to_screen(placed.body_x, body_top),
                vec2(placed.body_width, body_height),
            );
            painter.rect_stroke(
                body,
                0.0,
                Stroke::new(1.0, COMPONENT_OUTLINE),
                egui::StrokeKind::Inside,
            );

            for cell in occupant_cells(component, placed, config, mapping) {
                let cell_rect = Rect::from_min_size(
                    to_screen(cell.x, body_top + cell.y),
                    vec2(cell.width, cell.height),
                );
                painter.rect_filled(cell_rect, 0.0, OCCUPANT_FILL);
            }

            let columns = component
                .arrivals
                .iter()
                .zip(&placed.arrival_x)
                .chain(component.rendered_departures().iter().zip(&placed.departure_x));
            for (link_column, &x) in columns {
                let appearance = self.engine.link_appearance(link_column, config);
                for cell in link_column_cells(link_column, x, config, mapping) {
                    let cell_rect = Rect::from_min_size(
                        to_screen(cell.x, body_top + cell.y),
                        vec2(cell.width, cell.height),
                    );
                    painter.rect(
                        cell_rect,
                        0.0,
                        link_fill(&appearance),
                        link_stroke(&appearance, 1.0),
                        egui::StrokeKind::Inside,
                    );
                }

                hits.push(HitTarget {
                    rect: Rect::from_min_size(to_screen(x, body_top), vec2(column_px, body_height)),
                    link_column: link_column.clone(),
                });
            }
        }

        let overlay = self.engine.nucleotide_overlay(
            self.provider.nucleotides(),
            self.store.chunk_begin_end_bin().0,
            config,
        );
        let letter_y = body_top + body_height + config.nucleotide_height / 2.0;
        let font = FontId::monospace(config.nucleotide_height.max(6.0));
        for item in overlay {
            for (offset, letter) in item.letters.chars().enumerate() {
                let position = to_screen(item.x + (offset as f32 + 0.5) * column_px, letter_y);
                if position.x < rect.left() || position.x > rect.right() {
                    continue;
                }
                painter.text(position, Align2::CENTER_CENTER, letter, font.clone(), NUCLEOTIDE_TEXT);
            }
        }

        hits
    }

    pub(in crate::app) fn hovered_target<'a>(
        pointer: Option<Pos2>,
        hits: &'a [HitTarget],
    ) -> Option<&'a HitTarget> {
        let pointer = pointer?;
        // Link columns are pushed after arrows and sit on top of them.
        hits.iter().rev().find(|hit| hit.rect.contains(pointer))
    }
}
