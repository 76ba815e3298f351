use std::path::PathBuf;

use thiserror::Error;

/// Why a catalog asset could not be prepared for display.
///
/// These never abort the catalog: the page simply renders without its image.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file could not be opened or read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes were read but are not a supported image.
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The blocking decode job panicked or was torn down.
    #[error("load job for {} did not finish: {source}", .path.display())]
    Join {
        path: PathBuf,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl AssetError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            AssetError::Io { path, .. }
            | AssetError::Decode { path, .. }
            | AssetError::Join { path, .. } => path,
        }
    }
}
