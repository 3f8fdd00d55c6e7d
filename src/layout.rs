use std::collections::{HashMap, HashSet};

use log::debug;

use crate::config::DisplayConfig;
use crate::error::{Result, SchematicError};
use crate::model::{BinWindow, Component, LinkColumn};
use crate::rows::{CompressedRowMapping, row_y};

/// Pixel placement of one component and its drawn link columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentGeometry {
    pub ordinal: usize,
    pub index: usize,
    pub x: f32,
    pub width_columns: i64,
    pub width: f32,
    pub body_x: f32,
    pub body_width: f32,
    pub arrival_x: Vec<f32>,
    pub departure_x: Vec<f32>,
}

impl ComponentGeometry {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Paired,
    DanglingArrival,
    DanglingDeparture,
}

/// Rectilinear arrow: up from `(x1, y1)` to `turn_y`, across, down to `(x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkGeometry {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub turn_y: f32,
}

impl LinkGeometry {
    pub fn points(&self) -> [(f32, f32); 4] {
        [
            (self.x1, self.y1),
            (self.x1, self.turn_y),
            (self.x2, self.turn_y),
            (self.x2, self.y2),
        ]
    }

    pub fn span(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkRecord {
    pub link_column: LinkColumn,
    pub kind: LinkKind,
    pub geometry: LinkGeometry,
    pub level: usize,
    pub sort_key: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchematicLayout {
    pub actual_width: f32,
    pub components: Vec<ComponentGeometry>,
    // Longest span first.
    pub links: Vec<LinkRecord>,
    pub top_offset: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnLayout<'a> {
    config: &'a DisplayConfig,
    first_index: i64,
}

impl<'a> ColumnLayout<'a> {
    pub fn new(components: &[Component], config: &'a DisplayConfig) -> Self {
        Self {
            config,
            first_index: components.first().map_or(0, |first| first.index as i64),
        }
    }

    fn base_columns(&self, component: &Component) -> i64 {
        if self.config.use_width_compression {
            component.offset
                + (component.index as i64 - self.first_index)
                    * i64::from(self.config.bin_scaling_factor)
        } else {
            component.first_bin - self.config.begin_bin + component.offset
        }
    }

    // `first_departure_column` is 0 for arrivals and `arrivals + body` for departures.
    pub fn left_x_start(
        &self,
        component: &Component,
        ordinal: usize,
        first_departure_column: i64,
        column: usize,
    ) -> f32 {
        let columns =
            self.base_columns(component) + first_departure_column + column as i64 + ordinal as i64;
        columns as f32 * self.config.column_px()
    }

    pub fn first_departure_column(&self, component: &Component) -> i64 {
        component.arrivals.len() as i64 + self.config.body_columns(component.num_bin)
    }

    pub fn geometry(&self, component: &Component, ordinal: usize) -> ComponentGeometry {
        let column_px = self.config.column_px();
        let body_columns = self.config.body_columns(component.num_bin);
        let width_columns =
            component.arrivals.len() as i64 + body_columns + component.departures.len() as i64 - 1;
        let first_departure = self.first_departure_column(component);

        ComponentGeometry {
            ordinal,
            index: component.index,
            x: self.left_x_start(component, ordinal, 0, 0),
            width_columns,
            width: width_columns as f32 * column_px,
            body_x: self.left_x_start(component, ordinal, component.arrivals.len() as i64, 0),
            body_width: body_columns as f32 * column_px,
            arrival_x: (0..component.arrivals.len())
                .map(|column| self.left_x_start(component, ordinal, 0, column))
                .collect(),
            departure_x: (0..component.rendered_departures().len())
                .map(|column| self.left_x_start(component, ordinal, first_departure, column))
                .collect(),
        }
    }
}

pub fn column_count(component: &Component, config: &DisplayConfig) -> i64 {
    component.arrivals.len() as i64
        + (component.departures.len() as i64 - 1)
        + config.body_columns(component.num_bin)
        + 1
}

pub fn actual_width(components: &[Component], config: &DisplayConfig) -> f32 {
    let columns = components
        .iter()
        .map(|component| column_count(component, config))
        .sum::<i64>();
    let padding = components.len() as i64;
    (columns + padding) as f32 * config.column_px()
}

pub fn validate_components(components: &[Component]) -> Result<()> {
    components
        .iter()
        .enumerate()
        .try_for_each(|(position, component)| component.validate(position))
}

pub fn validate_window(components: &[Component], window: BinWindow) -> Result<()> {
    let first = components.iter().map(|component| component.first_bin).min();
    let last = components.iter().map(|component| component.last_bin).max();
    validate_window_in(window, first.zip(last))
}

pub fn validate_window_in(window: BinWindow, data_range: Option<(i64, i64)>) -> Result<()> {
    if window.begin > window.end {
        return Err(SchematicError::layout_range(
            window.begin,
            window.end,
            "begin bin is after end bin",
        ));
    }

    if let Some((first, last)) = data_range
        && (window.end < first || window.begin > last)
    {
        return Err(SchematicError::layout_range(
            window.begin,
            window.end,
            format!("loaded data covers bins [{first}, {last}]"),
        ));
    }

    Ok(())
}

struct Endpoint<'a> {
    link_column: &'a LinkColumn,
    center_x: f32,
}

// Shortest span first, so nested arrows stack.
fn assign_levels(spans: &[(f32, f32)]) -> Vec<usize> {
    let mut order = (0..spans.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let (a_lo, a_hi) = spans[a];
        let (b_lo, b_hi) = spans[b];
        (a_hi - a_lo)
            .total_cmp(&(b_hi - b_lo))
            .then_with(|| a_lo.total_cmp(&b_lo))
            .then_with(|| a.cmp(&b))
    });

    let mut placed: Vec<Vec<(f32, f32)>> = Vec::new();
    let mut levels = vec![0; spans.len()];
    for index in order {
        let (lo, hi) = spans[index];
        let level = placed
            .iter()
            .position(|intervals| intervals.iter().all(|&(a, b)| hi < a || lo > b))
            .unwrap_or(placed.len());
        if level == placed.len() {
            placed.push(Vec::new());
        }
        placed[level].push((lo, hi));
        levels[index] = level;
    }

    levels
}

fn link_records(
    components: &[Component],
    geometry: &[ComponentGeometry],
    config: &DisplayConfig,
) -> (Vec<LinkRecord>, f32) {
    let half_column = config.column_px() / 2.0;
    let row_px = config.row_px();

    let mut departures: HashMap<(i64, i64), Endpoint<'_>> = HashMap::new();
    let mut departure_order = Vec::new();
    for (component, placed) in components.iter().zip(geometry) {
        for (link_column, &x) in component.rendered_departures().iter().zip(&placed.departure_x) {
            if !departures.contains_key(&link_column.pair()) {
                departure_order.push(link_column.pair());
                departures.insert(
                    link_column.pair(),
                    Endpoint {
                        link_column,
                        center_x: x + half_column,
                    },
                );
            }
        }
    }

    let mut paired = Vec::new();
    let mut dangling = Vec::new();
    let mut matched = HashSet::new();
    for (component, placed) in components.iter().zip(geometry) {
        for (link_column, &x) in component.arrivals.iter().zip(&placed.arrival_x) {
            let arrival_x = x + half_column;
            match departures.get(&link_column.pair()) {
                Some(departure) => {
                    matched.insert(link_column.pair());
                    paired.push((link_column.clone(), departure.center_x, arrival_x));
                }
                None => dangling.push((link_column.clone(), LinkKind::DanglingArrival, arrival_x)),
            }
        }
    }
    for pair in departure_order {
        if matched.contains(&pair) {
            continue;
        }
        if let Some(departure) = departures.get(&pair) {
            dangling.push((
                departure.link_column.clone(),
                LinkKind::DanglingDeparture,
                departure.center_x,
            ));
        }
    }

    let spans = paired
        .iter()
        .map(|(_, from, to)| (from.min(*to), from.max(*to)))
        .collect::<Vec<_>>();
    let levels = assign_levels(&spans);
    let level_count = match levels.iter().max() {
        Some(max) => max + 1,
        None if dangling.is_empty() => 0,
        None => 1,
    };
    let top_offset = (level_count + 1) as f32 * row_px;

    let mut records = paired
        .into_iter()
        .zip(levels)
        .map(|((link_column, x1, x2), level)| {
            let geometry = LinkGeometry {
                x1,
                y1: top_offset,
                x2,
                y2: top_offset,
                turn_y: top_offset - (level + 1) as f32 * row_px,
            };
            LinkRecord {
                link_column,
                kind: LinkKind::Paired,
                sort_key: geometry.span(),
                geometry,
                level,
            }
        })
        .collect::<Vec<_>>();
    records.extend(dangling.into_iter().map(|(link_column, kind, x)| LinkRecord {
        link_column,
        kind,
        geometry: LinkGeometry {
            x1: x,
            y1: top_offset,
            x2: x,
            y2: top_offset,
            turn_y: top_offset - row_px,
        },
        level: 0,
        sort_key: 0.0,
    }));

    records.sort_by(|a, b| b.sort_key.total_cmp(&a.sort_key));
    (records, top_offset)
}

pub fn recompute_layout(components: &[Component], config: &DisplayConfig) -> Result<SchematicLayout> {
    validate_components(components)?;
    validate_window(components, config.window())?;

    let columns = ColumnLayout::new(components, config);
    let geometry = components
        .iter()
        .enumerate()
        .map(|(ordinal, component)| columns.geometry(component, ordinal))
        .collect::<Vec<_>>();

    let rightmost = geometry
        .iter()
        .map(|placed| placed.right() + config.column_px())
        .fold(0.0_f32, f32::max);
    let actual_width = actual_width(components, config).max(rightmost);

    let (links, top_offset) = link_records(components, &geometry, config);

    debug!(
        "recomputed layout: {} components, width {actual_width}, {} links, top offset {top_offset}",
        geometry.len(),
        links.len()
    );

    Ok(SchematicLayout {
        actual_width,
        components: geometry,
        links,
        top_offset,
    })
}

// One column per bin, so the window over-estimates when link columns or
// width compression are in play.
pub fn calculate_bin_width_of_screen(viewport_width_px: f32, config: &DisplayConfig) -> BinWindow {
    let width_in_cells = (viewport_width_px.max(0.0) / config.column_px()).ceil() as i64;
    BinWindow::new(config.begin_bin, config.begin_bin.saturating_add(width_in_cells))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn occupant_cells(
    component: &Component,
    placed: &ComponentGeometry,
    config: &DisplayConfig,
    mapping: Option<&CompressedRowMapping>,
) -> Vec<Cell> {
    component
        .occupants
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_some())
        .filter_map(|(row, _)| {
            row_y(row, config, mapping).map(|y| Cell {
                row,
                x: placed.body_x,
                y,
                width: placed.body_width,
                height: config.row_px(),
            })
        })
        .collect()
}

pub fn link_column_cells(
    link_column: &LinkColumn,
    x: f32,
    config: &DisplayConfig,
    mapping: Option<&CompressedRowMapping>,
) -> Vec<Cell> {
    link_column
        .participants
        .iter()
        .filter_map(|&row| {
            row_y(row, config, mapping).map(|y| Cell {
                row,
                x,
                y,
                width: config.column_px(),
                height: config.row_px(),
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct NucleotideOverlay {
    pub ordinal: usize,
    pub x: f32,
    pub letters: String,
}

/// Per-base letters over each component body, only at single-bin resolution
/// with width compression off.
pub fn nucleotide_overlay(
    components: &[Component],
    geometry: &[ComponentGeometry],
    nucleotides: &str,
    chunk_begin_bin: i64,
    config: &DisplayConfig,
) -> Vec<NucleotideOverlay> {
    if config.bin_width != 1 || config.use_width_compression || nucleotides.is_empty() {
        return Vec::new();
    }

    let available = nucleotides.len() as i64;
    components
        .iter()
        .zip(geometry)
        .filter_map(|(component, placed)| {
            let start = (component.first_bin - chunk_begin_bin).clamp(0, available);
            let end = (component.last_bin - chunk_begin_bin + 1).clamp(0, available);
            if start >= end {
                return None;
            }
            let letters = nucleotides.get(start as usize..end as usize)?;
            Some(NucleotideOverlay {
                ordinal: placed.ordinal,
                x: placed.body_x,
                letters: letters.to_owned(),
            })
        })
        .collect()
}
