use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use image::imageops::FilterType;
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AssetError;
use crate::events::{AssetOutcome, AssetSettled, PreloadEvent, PreparedImageCpu};
use crate::manifest::AssetManifest;
use crate::progress::{LoadProgress, ProgressUpdate};

/// Loads one asset and reports success or failure. Called on the blocking
/// pool, so implementations may do synchronous I/O.
pub trait AssetSource: Send + Sync + 'static {
    fn load(&self, path: &Path) -> Result<PreparedImageCpu, AssetError>;
}

/// Decodes image files from disk into RGBA8, shrinking anything larger than
/// `max_dimension` on its longest edge.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    max_dimension: u32,
}

impl ImageFileSource {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl AssetSource for ImageFileSource {
    fn load(&self, path: &Path) -> Result<PreparedImageCpu, AssetError> {
        let io_err = |source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        };
        let decoded = image::ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)?
            .decode()
            .map_err(|source| AssetError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let decoded = if decoded.width() > self.max_dimension || decoded.height() > self.max_dimension
        {
            debug!(
                path = %path.display(),
                width = decoded.width(),
                height = decoded.height(),
                max = self.max_dimension,
                "downscaling oversized page image"
            );
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
        } else {
            decoded
        };

        let rgba8 = decoded.to_rgba8();
        let (width, height) = rgba8.dimensions();
        Ok(PreparedImageCpu {
            path: path.to_path_buf(),
            width,
            height,
            pixels: rgba8.into_raw(),
        })
    }
}

/// Starts every manifest load at once and reports each settlement, success
/// or failure, with the updated progress. Emits `Ready` exactly once when the
/// last load settles, or immediately for an empty manifest.
///
/// Cancellation stops reporting; loads already running are detached rather
/// than aborted.
pub async fn run<S: AssetSource>(
    manifest: AssetManifest,
    source: Arc<S>,
    events: Sender<PreloadEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut progress = LoadProgress::new(manifest.len());
    if progress.is_ready() {
        info!("asset manifest is empty; catalog ready immediately");
        let _ = events.send(PreloadEvent::Ready { total: 0 }).await;
        return Ok(());
    }

    let mut tasks: JoinSet<AssetSettled> = JoinSet::new();
    for (index, path) in manifest.iter().enumerate() {
        let source = Arc::clone(&source);
        let path = path.to_path_buf();
        tasks.spawn(async move {
            let job_path = path.clone();
            let outcome = match tokio::task::spawn_blocking(move || source.load(&job_path)).await
            {
                Ok(Ok(prepared)) => AssetOutcome::Loaded(prepared),
                Ok(Err(err)) => AssetOutcome::Failed(err),
                Err(source) => AssetOutcome::Failed(AssetError::Join { path, source }),
            };
            AssetSettled { index, outcome }
        });
    }
    info!(count = manifest.len(), "preloading catalog assets");

    loop {
        select! {
            _ = cancel.cancelled() => {
                debug!(in_flight = tasks.len(), "preloader cancelled; detaching in-flight loads");
                tasks.detach_all();
                break;
            }

            joined = tasks.join_next() => {
                let Some(joined) = joined else {
                    break;
                };
                let update = progress.record_completion();
                let event = settlement_event(joined, update);
                if events.send(event).await.is_err() {
                    debug!("preload receiver dropped; stopping");
                    tasks.detach_all();
                    break;
                }
                if update.became_ready {
                    info!(total = update.total, "all catalog assets settled");
                    let _ = events.send(PreloadEvent::Ready { total: update.total }).await;
                }
            }
        }
    }
    Ok(())
}

/// Every settled attempt produces an event carrying the new progress, even
/// when the wrapper task died and the index is lost.
fn settlement_event(
    joined: Result<AssetSettled, tokio::task::JoinError>,
    update: ProgressUpdate,
) -> PreloadEvent {
    match joined {
        Ok(asset) => {
            log_settled(&asset, update);
            PreloadEvent::Settled {
                asset,
                progress: update,
            }
        }
        Err(err) => {
            warn!(
                error = %err,
                completed = update.completed,
                total = update.total,
                "asset load wrapper failed; counting it as settled"
            );
            PreloadEvent::Progress(update)
        }
    }
}

fn log_settled(asset: &AssetSettled, update: ProgressUpdate) {
    match &asset.outcome {
        AssetOutcome::Loaded(prepared) => debug!(
            index = asset.index,
            path = %prepared.path.display(),
            width = prepared.width,
            height = prepared.height,
            completed = update.completed,
            total = update.total,
            "asset loaded"
        ),
        AssetOutcome::Failed(err) => warn!(
            index = asset.index,
            path = %err.path().display(),
            error = %err,
            completed = update.completed,
            total = update.total,
            "asset failed to load; page will render without it"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct FakeSource {
        failing: HashSet<PathBuf>,
    }

    impl AssetSource for FakeSource {
        fn load(&self, path: &Path) -> Result<PreparedImageCpu, AssetError> {
            // Later pages finish first so completions arrive out of order.
            let n: u64 = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.trim_start_matches("p").parse().ok())
                .unwrap_or(0);
            std::thread::sleep(Duration::from_millis(40u64.saturating_sub(n * 10)));
            if self.failing.contains(path) {
                return Err(AssetError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(PreparedImageCpu {
                path: path.to_path_buf(),
                width: 1,
                height: 1,
                pixels: vec![255; 4],
            })
        }
    }

    #[tokio::test]
    async fn failures_still_count_toward_ready() {
        let manifest = AssetManifest::from_pattern(Path::new("/x"), "p{n}.png", 3).unwrap();
        let source = Arc::new(FakeSource {
            failing: [PathBuf::from("/x/p2.png")].into_iter().collect(),
        });
        let (tx, mut rx) = mpsc::channel(8);
        run(manifest, source, tx, CancellationToken::new())
            .await
            .unwrap();

        let mut completed = Vec::new();
        let mut failed = 0;
        let mut ready = 0;
        while let Some(event) = rx.recv().await {
            match event {
                PreloadEvent::Settled { asset, progress } => {
                    completed.push(progress.completed);
                    if matches!(asset.outcome, AssetOutcome::Failed(_)) {
                        failed += 1;
                    }
                }
                PreloadEvent::Progress(progress) => completed.push(progress.completed),
                PreloadEvent::Ready { total } => {
                    assert_eq!(total, 3);
                    ready += 1;
                }
            }
        }
        assert_eq!(completed, vec![1, 2, 3]);
        assert_eq!(failed, 1);
        assert_eq!(ready, 1);
    }

    #[tokio::test]
    async fn cancelled_preloader_stops_reporting() {
        let manifest = AssetManifest::from_pattern(Path::new("/x"), "p{n}.png", 2).unwrap();
        let source = Arc::new(FakeSource {
            failing: HashSet::new(),
        });
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();
        run(manifest, source, tx, cancel).await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn empty_manifest_is_ready_immediately() {
        let (tx, mut rx) = mpsc::channel(1);
        let source = Arc::new(ImageFileSource::new(64));
        run(AssetManifest::new(Vec::new()), source, tx, CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(rx.recv().await, Some(PreloadEvent::Ready { total: 0 })));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn lost_wrapper_task_still_reports_progress() {
        let err = tokio::spawn(async { panic!("wrapper died") })
            .await
            .unwrap_err();
        let mut progress = LoadProgress::new(2);
        progress.record_completion();
        let update = progress.record_completion();

        match settlement_event(Err(err), update) {
            PreloadEvent::Progress(reported) => {
                assert_eq!(reported.completed, 2);
                assert!(reported.became_ready);
            }
            other => panic!("expected an index-less progress report, got {other:?}"),
        }
    }

    #[test]
    fn settled_asset_carries_its_progress() {
        let asset = AssetSettled {
            index: 4,
            outcome: AssetOutcome::Failed(AssetError::Io {
                path: PathBuf::from("/x/p5.png"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            }),
        };
        let update = LoadProgress::new(5).record_completion();
        let PreloadEvent::Settled { asset, progress } = settlement_event(Ok(asset), update) else {
            panic!("expected a settled report");
        };
        assert_eq!(asset.index, 4);
        assert_eq!(progress.completed, 1);
    }

    #[test]
    fn image_file_source_downscales_large_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        image::RgbaImage::from_pixel(200, 100, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let prepared = ImageFileSource::new(50).load(&path).unwrap();
        assert_eq!((prepared.width, prepared.height), (50, 25));
        assert_eq!(prepared.pixels.len(), 50 * 25 * 4);
    }

    #[test]
    fn image_file_source_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            ImageFileSource::new(64).load(&missing),
            Err(AssetError::Io { .. })
        ));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"definitely not a png").unwrap();
        assert!(matches!(
            ImageFileSource::new(64).load(&garbage),
            Err(AssetError::Decode { .. })
        ));
    }
}
