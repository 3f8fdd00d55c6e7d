use std::collections::BTreeSet;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::appearance::{LinkAppearance, color_for};
use crate::config::{ConfigField, ConfigStore, DisplayConfig};
use crate::error::{Result, SchematicError};
use crate::interaction::{HighlightState, InteractionController};
use crate::layout::{
    NucleotideOverlay, SchematicLayout, calculate_bin_width_of_screen, nucleotide_overlay,
    recompute_layout, validate_window_in,
};
use crate::model::{BinWindow, Component, ComponentRequest, LinkColumn};
use crate::provider::DataProvider;
use crate::rows::{CompressedRowMapping, calc_max_rows, compress_visible_rows, visible_height};

const X_LAYOUT_FIELDS: [ConfigField; 5] = [
    ConfigField::UseWidthCompression,
    ConfigField::UseConnector,
    ConfigField::BinScalingFactor,
    ConfigField::PixelsPerColumn,
    ConfigField::PixelsPerRow,
];

const ROW_FIELDS: [ConfigField; 2] = [
    ConfigField::PixelsPerRow,
    ConfigField::UseVerticalCompression,
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reaction {
    pub top_offset: Option<f32>,
    pub bin_window: Option<BinWindow>,
    pub data_updated: bool,
    pub relaid_out: bool,
    pub appearance_changed: bool,
}

impl Reaction {
    fn merge(&mut self, other: Reaction) {
        self.top_offset = other.top_offset.or(self.top_offset);
        self.bin_window = other.bin_window.or(self.bin_window);
        self.data_updated |= other.data_updated;
        self.relaid_out |= other.relaid_out;
        self.appearance_changed |= other.appearance_changed;
    }
}

/// A failed dispatch, with whatever reactions the batch produced before and
/// around the failing step.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct DispatchError {
    pub reaction: Reaction,
    #[source]
    pub source: SchematicError,
}

#[derive(Debug)]
struct RowCache {
    revision: u64,
    mapping: CompressedRowMapping,
    max_rows: usize,
}

#[derive(Debug)]
pub struct SchematicEngine {
    components: Vec<Component>,
    revision: u64,
    layout: Option<SchematicLayout>,
    rows: Option<RowCache>,
    interaction: InteractionController,
    loading: bool,
    viewport_width: f32,
}

impl SchematicEngine {
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1920.0;

    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            components: Vec::new(),
            revision: 0,
            layout: None,
            rows: None,
            interaction: InteractionController::new(config.timings),
            loading: true,
            viewport_width: Self::DEFAULT_VIEWPORT_WIDTH,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn layout(&self) -> Option<&SchematicLayout> {
        self.layout.as_ref()
    }

    pub fn row_mapping(&self) -> Option<&CompressedRowMapping> {
        self.rows.as_ref().map(|rows| &rows.mapping)
    }

    pub fn max_rows(&self) -> usize {
        self.rows.as_ref().map_or(0, |rows| rows.max_rows)
    }

    pub fn highlight_state(&self) -> &HighlightState {
        self.interaction.state()
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width.max(1.0);
    }

    pub fn visible_height(&self, config: &DisplayConfig) -> f32 {
        visible_height(config, self.row_mapping(), self.max_rows())
    }

    // On error the previous components and layout are kept.
    pub fn set_components(
        &mut self,
        components: Vec<Component>,
        config: &DisplayConfig,
    ) -> Result<Reaction> {
        let layout = recompute_layout(&components, config)?;
        let top_offset = layout.top_offset;

        info!("schematic metadata updated: {} components", components.len());
        self.components = components;
        self.revision = self.revision.wrapping_add(1);
        self.layout = Some(layout);
        self.ensure_rows();
        self.loading = false;

        Ok(Reaction {
            top_offset: Some(top_offset),
            data_updated: true,
            relaid_out: true,
            ..Reaction::default()
        })
    }

    pub fn recalc_x_layout(&mut self, config: &DisplayConfig) -> Result<f32> {
        let layout = recompute_layout(&self.components, config)?;
        let top_offset = layout.top_offset;
        self.layout = Some(layout);
        Ok(top_offset)
    }

    pub fn recalc_y(&mut self, config: &DisplayConfig) -> bool {
        if config.use_vertical_compression {
            self.ensure_rows();
        }
        self.interaction.clear_highlight()
    }

    fn ensure_rows(&mut self) {
        if self
            .rows
            .as_ref()
            .is_some_and(|rows| rows.revision == self.revision)
        {
            return;
        }

        let mapping = compress_visible_rows(&self.components);
        let max_rows = calc_max_rows(&self.components);
        debug!(
            "row mapping rebuilt: {} occupied rows, {max_rows} max per component",
            mapping.len()
        );
        self.rows = Some(RowCache {
            revision: self.revision,
            mapping,
            max_rows,
        });
    }

    pub fn update_schematic_metadata(
        &mut self,
        provider: &mut dyn DataProvider,
        config: &DisplayConfig,
    ) -> Result<Reaction> {
        let window = config.window();
        validate_window_in(window, provider.bin_range())?;

        let request = ComponentRequest {
            window,
            use_connector: config.use_connector,
        };
        if !provider.process_array(request) {
            return Ok(Reaction::default());
        }
        if provider.components().is_empty() {
            return Err(SchematicError::layout_range(
                window.begin,
                window.end,
                "no components in window",
            ));
        }
        self.set_components(provider.components().to_vec(), config)
    }

    pub fn fetch_all_chunks(
        &mut self,
        provider: &mut dyn DataProvider,
        store: &ConfigStore,
    ) -> Result<Reaction> {
        if store.chunk_urls().is_empty() {
            warn!("No chunk URL defined.");
            return Ok(Reaction::default());
        }

        debug!("fetching chunks {:?}", store.chunk_urls());
        provider.fetch_chunks(store.chunk_urls())?;
        self.update_schematic_metadata(provider, store.display())
    }

    // `TopOffset` triggers nothing, so pushing the returned offset back cannot loop.
    pub fn on_config_changed(
        &mut self,
        store: &ConfigStore,
        provider: &mut dyn DataProvider,
        changed: &BTreeSet<ConfigField>,
    ) -> std::result::Result<Reaction, DispatchError> {
        let config = store.display();
        let mut reaction = Reaction::default();
        self.interaction.set_timings(config.timings);

        let outcome = self.apply_data_and_layout(store, provider, changed, &mut reaction);

        if ROW_FIELDS.iter().any(|field| changed.contains(field)) {
            reaction.appearance_changed |= self.recalc_y(config);
        }

        if changed.contains(&ConfigField::PixelsPerColumn) {
            reaction.bin_window = Some(calculate_bin_width_of_screen(self.viewport_width, config));
        }

        if changed.contains(&ConfigField::LinkIdentity) {
            reaction.appearance_changed = true;
        }

        match outcome {
            Ok(()) => Ok(reaction),
            Err(source) => Err(DispatchError { reaction, source }),
        }
    }

    fn apply_data_and_layout(
        &mut self,
        store: &ConfigStore,
        provider: &mut dyn DataProvider,
        changed: &BTreeSet<ConfigField>,
        reaction: &mut Reaction,
    ) -> Result<()> {
        let config = store.display();

        if changed.contains(&ConfigField::ChunkUrls) {
            reaction.merge(self.fetch_all_chunks(provider, store)?);
        }

        let data_fields = changed.contains(&ConfigField::BeginEndBin)
            || changed.contains(&ConfigField::UseConnector);
        if data_fields && !reaction.data_updated {
            reaction.merge(self.update_schematic_metadata(provider, config)?);
        }

        if !reaction.relaid_out && X_LAYOUT_FIELDS.iter().any(|field| changed.contains(field)) {
            let top_offset = self.recalc_x_layout(config)?;
            reaction.merge(Reaction {
                top_offset: Some(top_offset),
                relaid_out: true,
                ..Reaction::default()
            });
        }

        Ok(())
    }

    pub fn link_appearance(&self, link_column: &LinkColumn, config: &DisplayConfig) -> LinkAppearance {
        color_for(
            link_column,
            self.interaction.highlighted(),
            self.interaction.selected(),
            config.link_identity,
        )
    }

    pub fn nucleotide_overlay(
        &self,
        nucleotides: &str,
        chunk_begin_bin: i64,
        config: &DisplayConfig,
    ) -> Vec<NucleotideOverlay> {
        if self.loading {
            return Vec::new();
        }
        let Some(layout) = &self.layout else {
            return Vec::new();
        };
        nucleotide_overlay(
            &self.components,
            &layout.components,
            nucleotides,
            chunk_begin_bin,
            config,
        )
    }

    pub fn on_hover(&mut self, link_column: &LinkColumn, now: Duration) {
        self.interaction.on_hover(link_column, now);
    }

    pub fn on_hover_end(&mut self, now: Duration) {
        self.interaction.on_hover_end(now);
    }

    /// Returns whether link colours need repainting.
    pub fn on_click(&mut self, link_column: &LinkColumn, now: Duration) -> bool {
        self.interaction.on_click(link_column, now).is_some()
    }

    /// Fires due interaction timers; returns whether link colours changed.
    pub fn tick(&mut self, now: Duration) -> bool {
        !self.interaction.advance(now).is_empty()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.interaction.next_deadline()
    }
}
