use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Result, SchematicError};
use crate::model::{BinWindow, Component, ComponentRequest};

use super::DataProvider;
use super::collect::collect_components;
use super::parse::{RawChunk, RawIndex, parse_fasta_sequence};
use super::read::{read_json, read_text};

pub const INDEX_FILE: &str = "bin2file.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkEntry {
    pub file: String,
    pub first_bin: i64,
    pub last_bin: i64,
    pub fasta: Option<String>,
}

/// Contents of `bin2file.json`: which chunk file covers which bins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkIndex {
    pub bin_width: u32,
    pub pangenome_length: u64,
    pub entries: Vec<ChunkEntry>,
}

/// Chunk files to fetch for a window and the bin range they span together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkSelection {
    pub urls: Vec<String>,
    pub begin_end: (i64, i64),
}

impl ChunkIndex {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw: RawIndex = read_json(path)?;
        let mut entries = raw
            .files
            .into_iter()
            .map(|entry| ChunkEntry {
                file: entry.file,
                first_bin: entry.first_bin,
                last_bin: entry.last_bin,
                fasta: entry.fasta,
            })
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.first_bin);

        Ok(Self {
            bin_width: raw.bin_width,
            pangenome_length: raw.pangenome_length,
            entries,
        })
    }

    pub fn last_bin(&self) -> i64 {
        self.entries.iter().map(|entry| entry.last_bin).max().unwrap_or(0)
    }

    pub fn entry(&self, file: &str) -> Option<&ChunkEntry> {
        self.entries.iter().find(|entry| entry.file == file)
    }

    /// Chunks overlapping `window`, in bin order.
    pub fn chunks_for_window(&self, window: BinWindow) -> Option<ChunkSelection> {
        let selected = self
            .entries
            .iter()
            .filter(|entry| entry.last_bin >= window.begin && entry.first_bin <= window.end)
            .collect::<Vec<_>>();

        let (first, last) = (selected.first()?, selected.last()?);
        Some(ChunkSelection {
            urls: selected.iter().map(|entry| entry.file.clone()).collect(),
            begin_end: (first.first_bin, last.last_bin),
        })
    }
}

#[derive(Debug)]
struct LoadedChunk {
    raw: RawChunk,
    sequence: Option<String>,
}

/// Parsed chunks not yet handed to a [`Schematic`].
#[derive(Debug, Default)]
pub struct FetchedChunks {
    chunks: Vec<(String, LoadedChunk)>,
}

impl FetchedChunks {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Reads chunk and FASTA files; cheap to clone onto a worker thread.
#[derive(Clone, Debug)]
pub struct ChunkReader {
    root: PathBuf,
    index: ChunkIndex,
}

impl ChunkReader {
    pub fn read(&self, urls: &[String]) -> Result<FetchedChunks> {
        let chunks = urls
            .iter()
            .map(|url| Ok((url.clone(), self.load_chunk(url)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(FetchedChunks { chunks })
    }

    fn load_chunk(&self, url: &str) -> Result<LoadedChunk> {
        let raw: RawChunk = read_json(&self.root.join(url))?;
        if raw.last_bin < raw.first_bin {
            return Err(SchematicError::chunk(format!(
                "{url} ends at bin {} before it starts at {}",
                raw.last_bin, raw.first_bin
            )));
        }

        let sequence = match self.index.entry(url).and_then(|entry| entry.fasta.as_deref()) {
            Some(fasta) => Some(parse_fasta_sequence(&read_text(&self.root.join(fasta))?)),
            None => None,
        };

        debug!(
            "loaded chunk {url}: {} components, bins {}..={}",
            raw.components.len(),
            raw.first_bin,
            raw.last_bin
        );
        Ok(LoadedChunk { raw, sequence })
    }
}

/// Chunked schematic data read from a directory holding `bin2file.json`.
#[derive(Debug)]
pub struct Schematic {
    reader: ChunkReader,
    cache: HashMap<String, LoadedChunk>,
    requested: Vec<String>,
    components: Vec<Component>,
    nucleotides: String,
    path_names: Vec<String>,
}

impl Schematic {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let index = ChunkIndex::from_file(&root.join(INDEX_FILE))?;
        info!(
            "opened {} with {} chunks, bin width {}",
            root.display(),
            index.entries.len(),
            index.bin_width
        );

        Ok(Self {
            reader: ChunkReader { root, index },
            cache: HashMap::new(),
            requested: Vec::new(),
            components: Vec::new(),
            nucleotides: String::new(),
            path_names: Vec::new(),
        })
    }

    pub fn index(&self) -> &ChunkIndex {
        &self.reader.index
    }

    pub fn reader(&self) -> ChunkReader {
        self.reader.clone()
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    pub fn missing_chunks(&self, urls: &[String]) -> Vec<String> {
        urls.iter()
            .filter(|url| !self.is_cached(url))
            .cloned()
            .collect()
    }

    pub fn insert_chunks(&mut self, fetched: FetchedChunks) {
        for (url, chunk) in fetched.chunks {
            self.cache.insert(url, chunk);
        }
    }
}

impl DataProvider for Schematic {
    fn fetch_chunks(&mut self, urls: &[String]) -> Result<()> {
        let missing = self.missing_chunks(urls);
        for url in &missing {
            if self.index().entry(url).is_none() {
                warn!("chunk {url} is not listed in {INDEX_FILE}");
            }
        }
        let fetched = self.reader.read(&missing)?;
        self.insert_chunks(fetched);
        self.requested = urls.to_vec();
        Ok(())
    }

    fn process_array(&mut self, request: ComponentRequest) -> bool {
        if self.requested.is_empty() {
            return false;
        }

        let mut loaded = Vec::with_capacity(self.requested.len());
        for url in &self.requested {
            let Some(chunk) = self.cache.get(url) else {
                warn!("chunk {url} requested but not loaded yet");
                return false;
            };
            loaded.push(chunk);
        }

        let raws = loaded.iter().map(|chunk| &chunk.raw).collect::<Vec<_>>();
        self.components = collect_components(&raws, request);
        self.path_names = loaded
            .iter()
            .map(|chunk| &chunk.raw.path_names)
            .find(|names| !names.is_empty())
            .cloned()
            .unwrap_or_default();
        self.nucleotides = if loaded.iter().all(|chunk| chunk.sequence.is_some()) {
            loaded
                .iter()
                .filter_map(|chunk| chunk.sequence.as_deref())
                .collect()
        } else {
            String::new()
        };

        info!(
            "processed {} components for bins {}..={}",
            self.components.len(),
            request.window.begin,
            request.window.end
        );
        true
    }

    fn components(&self) -> &[Component] {
        &self.components
    }

    fn bin_range(&self) -> Option<(i64, i64)> {
        let listed = self
            .index()
            .entries
            .iter()
            .map(|entry| (entry.first_bin, entry.last_bin));
        let cached = self
            .cache
            .values()
            .map(|chunk| (chunk.raw.first_bin, chunk.raw.last_bin));
        listed
            .chain(cached)
            .reduce(|(first, last), (begin, end)| (first.min(begin), last.max(end)))
    }

    fn nucleotides(&self) -> &str {
        &self.nucleotides
    }

    fn path_names(&self) -> &[String] {
        &self.path_names
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, file: &str, contents: &str) {
        fs::write(dir.path().join(file), contents).unwrap();
    }

    fn dataset() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            INDEX_FILE,
            r#"{"bin_width": 1, "pangenome_length": 6, "files": [
                {"file": "chunk1.json", "first_bin": 4, "last_bin": 6, "fasta": "chunk1.fa"},
                {"file": "chunk0.json", "first_bin": 1, "last_bin": 3, "fasta": "chunk0.fa"}
            ]}"#,
        );
        write(
            &dir,
            "chunk0.json",
            r#"{"first_bin": 1, "last_bin": 3, "path_names": ["x", "y"], "components": [
                {"first_bin": 1, "last_bin": 3, "occupants": [true, true], "arrivals": [],
                 "departures": [{"upstream": 3, "downstream": 4}]}
            ]}"#,
        );
        write(
            &dir,
            "chunk1.json",
            r#"{"first_bin": 4, "last_bin": 6, "path_names": ["x", "y"], "components": [
                {"first_bin": 4, "last_bin": 6, "occupants": [true, false],
                 "arrivals": [{"upstream": 3, "downstream": 4, "participants": [true, false]}],
                 "departures": [{"upstream": 6, "downstream": 7}]}
            ]}"#,
        );
        write(&dir, "chunk0.fa", ">chunk0\nACG\n");
        write(&dir, "chunk1.fa", ">chunk1\nTTA\n");
        dir
    }

    fn both_chunks() -> Vec<String> {
        vec!["chunk0.json".to_string(), "chunk1.json".to_string()]
    }

    fn request(begin: i64, end: i64) -> ComponentRequest {
        ComponentRequest {
            window: BinWindow::new(begin, end),
            use_connector: true,
        }
    }

    #[test]
    fn index_is_sorted_and_selects_overlapping_chunks() {
        let dir = dataset();
        let schematic = Schematic::open(dir.path()).unwrap();

        assert_eq!(schematic.index().entries[0].file, "chunk0.json");
        assert_eq!(schematic.index().last_bin(), 6);
        assert_eq!(schematic.bin_range(), Some((1, 6)));

        let selection = schematic
            .index()
            .chunks_for_window(BinWindow::new(2, 5))
            .unwrap();
        assert_eq!(selection.urls, vec!["chunk0.json", "chunk1.json"]);
        assert_eq!(selection.begin_end, (1, 6));

        assert!(schematic.index().chunks_for_window(BinWindow::new(7, 9)).is_none());
    }

    #[test]
    fn process_before_fetch_reports_no_data() {
        let dir = dataset();
        let mut schematic = Schematic::open(dir.path()).unwrap();
        assert!(!schematic.process_array(request(1, 6)));
        assert!(schematic.components().is_empty());
    }

    #[test]
    fn fetched_chunks_are_merged_with_sequence() {
        let dir = dataset();
        let mut schematic = Schematic::open(dir.path()).unwrap();
        schematic.fetch_chunks(&both_chunks()).unwrap();

        assert!(schematic.process_array(request(1, 6)));
        assert_eq!(schematic.components().len(), 2);
        assert_eq!(schematic.components()[1].offset, 0);
        assert_eq!(schematic.nucleotides(), "ACGTTA");
        assert_eq!(schematic.path_names(), ["x", "y"]);
    }

    #[test]
    fn chunks_read_on_a_worker_serve_later_fetches() {
        let dir = dataset();
        let mut schematic = Schematic::open(dir.path()).unwrap();
        let urls = both_chunks();
        assert_eq!(schematic.missing_chunks(&urls), urls);

        let reader = schematic.reader();
        let worker_urls = urls.clone();
        let fetched = thread::spawn(move || reader.read(&worker_urls))
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(fetched.len(), 2);
        schematic.insert_chunks(fetched);
        assert!(schematic.missing_chunks(&urls).is_empty());

        // Cached chunks are not read again.
        fs::remove_file(dir.path().join("chunk0.json")).unwrap();
        fs::remove_file(dir.path().join("chunk1.json")).unwrap();
        schematic.fetch_chunks(&urls).unwrap();
        assert!(schematic.process_array(request(1, 6)));
        assert_eq!(schematic.nucleotides(), "ACGTTA");
    }

    #[test]
    fn failed_read_caches_nothing() {
        let dir = dataset();
        let mut schematic = Schematic::open(dir.path()).unwrap();
        let urls = vec!["chunk0.json".to_string(), "chunk9.json".to_string()];

        assert!(schematic.fetch_chunks(&urls).is_err());
        assert!(!schematic.is_cached("chunk0.json"));
    }

    #[test]
    fn missing_chunk_file_is_reported_with_path() {
        let dir = dataset();
        let mut schematic = Schematic::open(dir.path()).unwrap();
        let error = schematic
            .fetch_chunks(&["chunk9.json".to_string()])
            .unwrap_err();
        assert!(matches!(error, SchematicError::File { .. }));
    }

    #[test]
    fn malformed_chunk_is_a_json_error() {
        let dir = dataset();
        write(&dir, "chunk0.json", r#"{"first_bin": 1, "last_bin": 3, "components": [{}]}"#);
        let mut schematic = Schematic::open(dir.path()).unwrap();
        let error = schematic
            .fetch_chunks(&["chunk0.json".to_string()])
            .unwrap_err();
        assert!(matches!(error, SchematicError::Json { .. }));
    }
}
