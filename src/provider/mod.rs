mod collect;
mod parse;
mod read;
mod schematic;

use crate::error::Result;
use crate::model::{Component, ComponentRequest};

pub use schematic::{
    ChunkEntry, ChunkIndex, ChunkReader, ChunkSelection, FetchedChunks, INDEX_FILE, Schematic,
};

/// Source of component data for the engine.
pub trait DataProvider {
    /// Makes the listed chunks available; already cached chunks are kept.
    fn fetch_chunks(&mut self, urls: &[String]) -> Result<()>;

    /// Assembles components for `request` from cached chunks. Returns `true`
    /// when every requested chunk was available and new data is ready.
    fn process_array(&mut self, request: ComponentRequest) -> bool;

    fn components(&self) -> &[Component];

    /// First and last bin of all data this provider can serve.
    fn bin_range(&self) -> Option<(i64, i64)>;

    /// One base per bin, starting at the first loaded chunk's first bin.
    fn nucleotides(&self) -> &str;

    fn path_names(&self) -> &[String];
}
