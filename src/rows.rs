use std::collections::BTreeMap;

use crate::config::DisplayConfig;
use crate::model::Component;

const COMPRESSED_HEIGHT_PADDING_ROWS: f32 = 0.25;
const RAW_HEIGHT_PADDING_ROWS: f32 = 2.5;

/// Original occupant row -> dense row index, keeping only occupied rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompressedRowMapping {
    rows: BTreeMap<usize, usize>,
}

impl CompressedRowMapping {
    pub fn get(&self, row: usize) -> Option<usize> {
        self.rows.get(&row).copied()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains_key(&row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().map(|(&row, &compressed)| (row, compressed))
    }
}

pub fn compress_visible_rows(components: &[Component]) -> CompressedRowMapping {
    let mut occupied = Vec::<bool>::new();
    for component in components {
        if occupied.len() < component.occupants.len() {
            occupied.resize(component.occupants.len(), false);
        }
        for (row, slot) in component.occupants.iter().enumerate() {
            if slot.is_some() {
                occupied[row] = true;
            }
        }
    }

    let rows = occupied
        .iter()
        .enumerate()
        .filter(|(_, used)| **used)
        .enumerate()
        .map(|(compressed, (row, _))| (row, compressed))
        .collect();

    CompressedRowMapping { rows }
}

pub fn calc_max_rows(components: &[Component]) -> usize {
    components
        .iter()
        .map(Component::occupant_count)
        .max()
        .unwrap_or(0)
}

pub fn visible_height(
    config: &DisplayConfig,
    mapping: Option<&CompressedRowMapping>,
    max_rows_across_components: usize,
) -> f32 {
    match mapping {
        Some(mapping) if config.use_vertical_compression => {
            (mapping.len() as f32 + COMPRESSED_HEIGHT_PADDING_ROWS) * config.row_px()
        }
        _ => (max_rows_across_components as f32 + RAW_HEIGHT_PADDING_ROWS) * config.row_px(),
    }
}

/// Row position of an original row under the current vertical mode, or
/// `None` when compression hides it.
pub fn display_row(
    row: usize,
    config: &DisplayConfig,
    mapping: Option<&CompressedRowMapping>,
) -> Option<usize> {
    match mapping {
        Some(mapping) if config.use_vertical_compression => mapping.get(row),
        _ => Some(row),
    }
}

pub fn row_y(
    row: usize,
    config: &DisplayConfig,
    mapping: Option<&CompressedRowMapping>,
) -> Option<f32> {
    display_row(row, config, mapping).map(|row| row as f32 * config.row_px())
}
