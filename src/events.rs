use std::path::PathBuf;

use crate::error::AssetError;
use crate::layout::ViewportSize;
use crate::progress::ProgressUpdate;

#[derive(Debug, Clone)]
pub struct PreparedImageCpu {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug)]
pub enum AssetOutcome {
    Loaded(PreparedImageCpu),
    Failed(AssetError),
}

/// One finished load attempt; `index` is the position in the manifest.
#[derive(Debug)]
pub struct AssetSettled {
    pub index: usize,
    pub outcome: AssetOutcome,
}

/// Preloader -> viewer.
#[derive(Debug)]
pub enum PreloadEvent {
    Settled {
        asset: AssetSettled,
        progress: ProgressUpdate,
    },
    /// Sent once, when every manifest entry has settled (or immediately for
    /// an empty manifest).
    /// A load settled but its wrapper task failed, so the index is unknown.
    /// The attempt still counts toward progress.
    Progress(ProgressUpdate),
    Ready { total: usize },
}

/// Messages accepted by the catalog state reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    Resized(ViewportSize),
    Progress(ProgressUpdate),
    PreloadReady,
    NextRequested,
    PrevRequested,
    PageFlipped(usize),
}
