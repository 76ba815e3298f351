use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rust_flipbook::config::Configuration;
use rust_flipbook::events::PreloadEvent;
use rust_flipbook::layout::{ChromeLayout, Rect, ViewportSize, compute_book_dimensions};
use rust_flipbook::tasks::{preloader, viewer};

#[derive(Debug, Parser)]
#[command(name = "flipbook", version, about = "Page-flipping product catalog viewer")]
struct Args {
    /// Path to YAML config; built-in defaults are used when the file is missing
    #[arg(value_name = "CONFIG", default_value = "flipbook.yaml")]
    config: PathBuf,
    /// Override the number of catalog image pages
    #[arg(long = "pages", value_name = "N")]
    pages: Option<usize>,
    /// Override the directory image paths are resolved against
    #[arg(long = "image-root", value_name = "DIR")]
    image_root: Option<PathBuf>,
    /// Print the computed layout for a WIDTHxHEIGHT viewport and exit
    #[arg(long = "layout-dry-run", value_name = "WxH", value_parser = parse_viewport)]
    layout_dry_run: Option<ViewportSize>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn parse_viewport(raw: &str) -> Result<ViewportSize> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width: f32 = w.trim().parse().context("invalid viewport width")?;
    let height: f32 = h.trim().parse().context("invalid viewport height")?;
    Ok(ViewportSize::new(width, height))
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = match verbosity {
                0 => "info",
                1 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("rust_flipbook={level},flipbook={level}"))
                .add_directive("wgpu=warn".parse()?)
                .add_directive("wgpu_core=warn".parse()?)
                .add_directive("wgpu_hal=warn".parse()?)
                .add_directive("naga=warn".parse()?)
                .add_directive("winit=warn".parse()?)
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn load_configuration(args: &Args) -> Result<Configuration> {
    let mut cfg = if args.config.exists() {
        Configuration::from_yaml_file(&args.config).with_context(|| {
            format!("failed to load configuration from {}", args.config.display())
        })?
    } else {
        tracing::info!(
            path = %args.config.display(),
            "configuration file not found; using built-in defaults"
        );
        Configuration::default()
    };

    if let Some(pages) = args.pages {
        cfg.catalog.page_count = pages;
    }
    if let Some(root) = &args.image_root {
        cfg.catalog.image_root = root.clone();
    }
    cfg.validated().context("invalid configuration values")
}

fn print_rect(name: &str, rect: Rect) {
    println!(
        "  {name:<16} x={:>8.1} y={:>8.1} w={:>8.1} h={:>8.1}",
        rect.x, rect.y, rect.width, rect.height
    );
}

fn run_layout_dry_run(cfg: &Configuration, viewport: ViewportSize) {
    let dims = compute_book_dimensions(viewport, &cfg.chrome, cfg.book.aspect_ratio);
    let layout = ChromeLayout::compute(viewport, &cfg.chrome, dims);
    println!(
        "# layout dry run\n# viewport: {} x {}\n# aspect-ratio: {}\n",
        viewport.width, viewport.height, cfg.book.aspect_ratio
    );
    println!("book: {:.1} x {:.1}", dims.width, dims.height);
    if dims.is_degenerate() {
        println!("(viewport too small; the book would not be drawn)");
    }
    print_rect("header", layout.header);
    print_rect("content", layout.content);
    print_rect("book", layout.book);
    print_rect("buttons", layout.buttons);
    print_rect("prev-button", layout.prev_button);
    print_rect("page-label", layout.page_label);
    print_rect("next-button", layout.next_button);
    print_rect("loading-message", layout.loading_message);
    print_rect("progress-track", layout.progress_track);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let cfg = load_configuration(&args)?;
    tracing::debug!("Loaded configuration:\n{:#?}", cfg);

    if let Some(viewport) = args.layout_dry_run {
        run_layout_dry_run(&cfg, viewport);
        return Ok(());
    }

    let manifest = cfg.catalog.manifest()?;
    tracing::info!(
        pages = manifest.len(),
        root = %cfg.catalog.image_root.display(),
        pattern = %cfg.catalog.image_pattern,
        "catalog manifest built"
    );

    let (preload_tx, preload_rx) = mpsc::channel::<PreloadEvent>(manifest.len().max(1) + 1);
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let preload = tokio::spawn({
        let cancel = cancel.clone();
        let source = Arc::new(preloader::ImageFileSource::new(cfg.loader.max_dimension));
        async move {
            preloader::run(manifest, source, preload_tx, cancel)
                .await
                .context("preloader task failed")
        }
    });

    // The window owns the main thread until it closes or cancellation fires.
    if let Err(e) = viewer::run_windowed(preload_rx, cancel.clone(), cfg).context("viewer failed")
    {
        tracing::error!("{e:?}");
    }
    cancel.cancel();

    match preload.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("task error: {e:?}"),
        Err(e) => tracing::error!("join error: {e}"),
    }

    Ok(())
}
