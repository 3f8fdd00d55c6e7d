use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchematicError};
use crate::model::BinWindow;

/// How two link columns are judged to be "the same link" when highlighting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkIdentity {
    /// `(upstream + 1) * (downstream + 1)`; distinct pairs may collide.
    #[default]
    Fingerprint,
    /// Exact `(upstream, downstream)` comparison.
    Pair,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTimings {
    pub hover_delay_ms: u64,
    pub selection_timeout_ms: u64,
}

impl Default for InteractionTimings {
    fn default() -> Self {
        Self {
            hover_delay_ms: 600,
            selection_timeout_ms: 5000,
        }
    }
}

impl InteractionTimings {
    pub fn hover_delay(self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    pub fn selection_timeout(self) -> Duration {
        Duration::from_millis(self.selection_timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub pixels_per_row: u32,
    pub pixels_per_column: u32,
    pub use_vertical_compression: bool,
    pub use_width_compression: bool,
    pub bin_scaling_factor: u32,
    pub use_connector: bool,
    pub top_offset: f32,
    pub left_offset: f32,
    pub begin_bin: i64,
    pub end_bin: i64,
    pub nucleotide_height: f32,
    pub bin_width: u32,
    pub link_identity: LinkIdentity,
    pub timings: InteractionTimings,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            pixels_per_row: 7,
            pixels_per_column: 10,
            use_vertical_compression: false,
            use_width_compression: false,
            bin_scaling_factor: 3,
            use_connector: true,
            top_offset: 0.0,
            left_offset: 10.0,
            begin_bin: 1,
            end_bin: 100,
            nucleotide_height: 10.0,
            bin_width: 1,
            link_identity: LinkIdentity::Fingerprint,
            timings: InteractionTimings::default(),
        }
    }
}

impl DisplayConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| SchematicError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| SchematicError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    /// Raises the pixel sizes and bin counts to at least one, as the store setters do.
    pub fn normalized(mut self) -> Self {
        self.pixels_per_row = self.pixels_per_row.max(1);
        self.pixels_per_column = self.pixels_per_column.max(1);
        self.bin_scaling_factor = self.bin_scaling_factor.max(1);
        self.bin_width = self.bin_width.max(1);
        self
    }

    pub fn window(&self) -> BinWindow {
        BinWindow::new(self.begin_bin, self.end_bin)
    }

    pub fn column_px(&self) -> f32 {
        self.pixels_per_column.max(1) as f32
    }

    pub fn row_px(&self) -> f32 {
        self.pixels_per_row.max(1) as f32
    }

    /// Columns a component body occupies under the current width mode.
    pub fn body_columns(&self, num_bin: i64) -> i64 {
        if self.use_width_compression {
            i64::from(self.bin_scaling_factor)
        } else {
            num_bin
        }
    }
}

/// Observable fields of the store; the engine reacts to batches of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigField {
    BeginEndBin,
    ChunkUrls,
    PixelsPerRow,
    PixelsPerColumn,
    UseVerticalCompression,
    UseWidthCompression,
    UseConnector,
    BinScalingFactor,
    TopOffset,
    LeftOffset,
    NucleotideHeight,
    BinWidth,
    LinkIdentity,
}

/// Shared display settings plus the chunk selection, with change tracking.
#[derive(Clone, Debug, Default)]
pub struct ConfigStore {
    display: DisplayConfig,
    chunk_urls: Vec<String>,
    chunk_begin_end_bin: (i64, i64),
    pending: BTreeSet<ConfigField>,
}

fn assign<T: PartialEq>(
    slot: &mut T,
    value: T,
    field: ConfigField,
    pending: &mut BTreeSet<ConfigField>,
) {
    if *slot != value {
        *slot = value;
        pending.insert(field);
    }
}

impl ConfigStore {
    pub fn new(display: DisplayConfig) -> Self {
        Self {
            display: display.normalized(),
            ..Self::default()
        }
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn begin_bin(&self) -> i64 {
        self.display.begin_bin
    }

    pub fn end_bin(&self) -> i64 {
        self.display.end_bin
    }

    pub fn chunk_begin_end_bin(&self) -> (i64, i64) {
        self.chunk_begin_end_bin
    }

    pub fn chunk_urls(&self) -> &[String] {
        &self.chunk_urls
    }

    /// Drains the fields changed since the previous call.
    pub fn take_changes(&mut self) -> BTreeSet<ConfigField> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn update_begin_end_bin(&mut self, begin: i64, end: i64) {
        if self.display.begin_bin != begin || self.display.end_bin != end {
            self.display.begin_bin = begin;
            self.display.end_bin = end;
            self.pending.insert(ConfigField::BeginEndBin);
        }
    }

    pub fn update_top_offset(&mut self, value: f32) {
        assign(
            &mut self.display.top_offset,
            value,
            ConfigField::TopOffset,
            &mut self.pending,
        );
    }

    pub fn update_chunks(&mut self, urls: Vec<String>, begin_end: (i64, i64)) {
        self.chunk_begin_end_bin = begin_end;
        assign(&mut self.chunk_urls, urls, ConfigField::ChunkUrls, &mut self.pending);
    }

    pub fn set_pixels_per_row(&mut self, value: u32) {
        assign(
            &mut self.display.pixels_per_row,
            value.max(1),
            ConfigField::PixelsPerRow,
            &mut self.pending,
        );
    }

    pub fn set_pixels_per_column(&mut self, value: u32) {
        assign(
            &mut self.display.pixels_per_column,
            value.max(1),
            ConfigField::PixelsPerColumn,
            &mut self.pending,
        );
    }

    pub fn set_use_vertical_compression(&mut self, value: bool) {
        assign(
            &mut self.display.use_vertical_compression,
            value,
            ConfigField::UseVerticalCompression,
            &mut self.pending,
        );
    }

    pub fn set_use_width_compression(&mut self, value: bool) {
        assign(
            &mut self.display.use_width_compression,
            value,
            ConfigField::UseWidthCompression,
            &mut self.pending,
        );
    }

    pub fn set_use_connector(&mut self, value: bool) {
        assign(
            &mut self.display.use_connector,
            value,
            ConfigField::UseConnector,
            &mut self.pending,
        );
    }

    pub fn set_bin_scaling_factor(&mut self, value: u32) {
        assign(
            &mut self.display.bin_scaling_factor,
            value.max(1),
            ConfigField::BinScalingFactor,
            &mut self.pending,
        );
    }

    pub fn set_left_offset(&mut self, value: f32) {
        assign(
            &mut self.display.left_offset,
            value,
            ConfigField::LeftOffset,
            &mut self.pending,
        );
    }

    pub fn set_nucleotide_height(&mut self, value: f32) {
        assign(
            &mut self.display.nucleotide_height,
            value,
            ConfigField::NucleotideHeight,
            &mut self.pending,
        );
    }

    pub fn set_bin_width(&mut self, value: u32) {
        assign(
            &mut self.display.bin_width,
            value.max(1),
            ConfigField::BinWidth,
            &mut self.pending,
        );
    }

    pub fn set_link_identity(&mut self, value: LinkIdentity) {
        assign(
            &mut self.display.link_identity,
            value,
            ConfigField::LinkIdentity,
            &mut self.pending,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_values_do_not_mark_fields() {
        let mut store = ConfigStore::default();
        store.set_pixels_per_column(10);
        store.set_use_connector(true);
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn take_changes_drains_the_batch() {
        let mut store = ConfigStore::default();
        store.set_use_width_compression(true);
        store.set_bin_scaling_factor(4);
        store.update_begin_end_bin(10, 50);

        let changes = store.take_changes();
        assert_eq!(
            changes.into_iter().collect::<Vec<_>>(),
            vec![
                ConfigField::BeginEndBin,
                ConfigField::UseWidthCompression,
                ConfigField::BinScalingFactor,
            ]
        );
        assert!(store.take_changes().is_empty());
        assert_eq!(store.begin_bin(), 10);
        assert_eq!(store.end_bin(), 50);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DisplayConfig =
            serde_json::from_str(r#"{"pixels_per_column": 4, "link_identity": "pair"}"#)
                .unwrap();
        assert_eq!(config.pixels_per_column, 4);
        assert_eq!(config.link_identity, LinkIdentity::Pair);
        assert_eq!(config.pixels_per_row, 7);
        assert_eq!(config.timings.hover_delay(), Duration::from_millis(600));
        assert_eq!(config.timings.selection_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn zero_sizes_from_file_are_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("display.json");
        std::fs::write(
            &path,
            r#"{"pixels_per_column": 0, "pixels_per_row": 0, "bin_scaling_factor": 0}"#,
        )
        .unwrap();

        let config = DisplayConfig::from_json_file(&path).unwrap();
        assert_eq!(config.pixels_per_column, 1);
        assert_eq!(config.pixels_per_row, 1);
        assert_eq!(config.bin_scaling_factor, 1);
    }

    #[test]
    fn store_raises_zero_sizes() {
        let store = ConfigStore::new(DisplayConfig {
            pixels_per_column: 0,
            bin_width: 0,
            ..DisplayConfig::default()
        });
        assert_eq!(store.display().pixels_per_column, 1);
        assert_eq!(store.display().bin_width, 1);
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn body_columns_follow_width_mode() {
        let mut config = DisplayConfig::default();
        assert_eq!(config.body_columns(17), 17);
        config.use_width_compression = true;
        config.bin_scaling_factor = 4;
        assert_eq!(config.body_columns(17), 4);
    }
}
