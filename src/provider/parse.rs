use serde::Deserialize;

fn default_bin_width() -> u32 {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawIndex {
    #[serde(default = "default_bin_width")]
    pub(super) bin_width: u32,
    #[serde(default)]
    pub(super) pangenome_length: u64,
    pub(super) files: Vec<RawIndexEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawIndexEntry {
    pub(super) file: String,
    pub(super) first_bin: i64,
    pub(super) last_bin: i64,
    #[serde(default)]
    pub(super) fasta: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawChunk {
    pub(super) first_bin: i64,
    pub(super) last_bin: i64,
    #[serde(default)]
    pub(super) path_names: Vec<String>,
    pub(super) components: Vec<RawComponent>,
}

/// Link columns carry no default: a component without them cannot be laid out.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawComponent {
    pub(super) first_bin: i64,
    pub(super) last_bin: i64,
    #[serde(default)]
    pub(super) occupants: Vec<bool>,
    pub(super) arrivals: Vec<RawLink>,
    pub(super) departures: Vec<RawLink>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawLink {
    pub(super) upstream: i64,
    pub(super) downstream: i64,
    #[serde(default)]
    pub(super) participants: Vec<bool>,
}

/// Concatenates the sequence lines of a FASTA file, skipping headers.
pub(super) fn parse_fasta_sequence(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('>') && !line.starts_with(';'))
        .collect()
}
