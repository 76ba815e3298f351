use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::chrome::text::{to_linear_array, to_wgpu_color};
use crate::chrome::{ChromeButton, ChromeOverlay, cover_text_color};
use crate::config::Configuration;
use crate::covers::{CoverText, cover_size, gradient_pixels, paint_cover_text};
use crate::events::{AssetOutcome, CatalogEvent, PreloadEvent, PreparedImageCpu};
use crate::flipbook::{FlipEvent, Flipbook, FlipbookOptions, PageContent, PageRenderer};
use crate::layout::ViewportSize;
use crate::state::{CatalogState, Effect};

#[derive(Debug)]
enum ViewerEvent {
    Preload(PreloadEvent),
    Cancelled,
}

type PreloadReceiver = mpsc::Receiver<PreloadEvent>;

struct Gpu {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

struct Scene {
    pages: PageRenderer,
    chrome: ChromeOverlay,
}

struct ViewerApp {
    cfg: Configuration,
    cancel: CancellationToken,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    scene: Option<Scene>,
    state: CatalogState,
    book: Flipbook,
    /// Images that arrived before the GPU was ready, keyed by book page.
    pending_images: Vec<(usize, PreparedImageCpu)>,
    cursor: Option<(f32, f32)>,
    pending_redraw: bool,
}

impl ViewerApp {
    fn new(cfg: Configuration, cancel: CancellationToken) -> Self {
        let content_pages = cfg.catalog.page_count;
        let viewport = ViewportSize::new(cfg.window.width as f32, cfg.window.height as f32);
        let state = CatalogState::new(
            content_pages,
            cfg.book.start_page,
            cfg.chrome,
            cfg.book.aspect_ratio,
            viewport,
        );
        let book = Flipbook::new(
            FlipbookOptions::new(&cfg.book, state.book_dimensions()),
            PageContent::catalog(content_pages),
        );
        Self {
            cfg,
            cancel,
            window: None,
            gpu: None,
            scene: None,
            state,
            book,
            pending_images: Vec::new(),
            cursor: None,
            pending_redraw: false,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }

        let mut attrs = WindowAttributes::default()
            .with_title(self.cfg.window_title())
            .with_inner_size(LogicalSize::new(self.cfg.window.width, self.cfg.window.height));
        if self.cfg.window.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create catalog window");
                None
            }
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to acquire GPU adapter")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|fmt| fmt.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("catalog-device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .context("failed to acquire GPU device")?;

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            "catalog surface configured",
        );

        let mut chrome = ChromeOverlay::new(&device, &queue, format, &self.cfg);
        let palette = *chrome.palette();
        let mut pages = PageRenderer::new(
            &device,
            &queue,
            format,
            self.book.pages().len(),
            to_linear_array(palette.paper),
        );
        self.paint_covers(&device, &queue, &mut pages, &mut chrome);
        for (page, image) in self.pending_images.drain(..) {
            pages.set_page_image(&device, &queue, page, &image);
        }

        self.gpu = Some(Gpu {
            surface,
            config,
            device,
            queue,
        });
        self.scene = Some(Scene { pages, chrome });
        self.sync_chrome();
        self.handle_resize(size);
        Ok(())
    }

    fn paint_covers(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pages: &mut PageRenderer,
        chrome: &mut ChromeOverlay,
    ) {
        let size = cover_size(self.cfg.book.aspect_ratio);
        let pixels = gradient_pixels(size.0, size.1);
        let color = cover_text_color(chrome.palette());
        let (front_title, front_subtitle) = self.cfg.catalog.front_cover_text();
        let (back_title, back_message) = self.cfg.catalog.back_cover_text();
        let front = CoverText {
            title: front_title.into_owned(),
            subtitle: front_subtitle.into_owned(),
        };
        let back = CoverText {
            title: back_title.into_owned(),
            subtitle: back_message.into_owned(),
        };

        for (index, content) in self.book.pages().iter().enumerate() {
            let text = match content {
                PageContent::FrontCover => &front,
                PageContent::BackCover => &back,
                PageContent::Image(_) => continue,
            };
            let Some(view) = pages.set_cover(device, queue, index, size.0, size.1, &pixels)
            else {
                continue;
            };
            let (font_system, family) = chrome.fonts_mut();
            paint_cover_text(device, queue, font_system, family, &view, size, text, color);
            debug!(page = index, title = %text.title, "cover painted");
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        gpu.config.width = new_size.width.max(1);
        gpu.config.height = new_size.height.max(1);
        gpu.surface.configure(&gpu.device, &gpu.config);
        debug!(
            width = gpu.config.width,
            height = gpu.config.height,
            "catalog surface resized",
        );

        let scale_factor = window.scale_factor();
        let logical: LogicalSize<f32> = new_size.to_logical(scale_factor);
        let viewport = ViewportSize::new(logical.width, logical.height);
        let effects = self.state.update(CatalogEvent::Resized(viewport));
        self.apply_effects(effects);

        let layout = self.state.chrome_layout();
        if let Some(scene) = self.scene.as_mut() {
            scene
                .chrome
                .resize(layout, viewport, new_size, scale_factor);
        }
        self.request_redraw();
    }

    fn dispatch(&mut self, event: CatalogEvent) {
        let effects = self.state.update(event);
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        if effects.is_empty() {
            return;
        }
        let now = Instant::now();
        for effect in effects {
            match effect {
                Effect::Relayout(dims) => {
                    let book_rect = self.state.chrome_layout().book;
                    self.book.set_container(book_rect);
                    if dims.is_degenerate() {
                        debug!("window too small for the book; nothing to draw");
                    }
                }
                Effect::ProgressChanged(update) => {
                    if let Some(scene) = self.scene.as_mut() {
                        scene.chrome.set_progress(update.completed, update.total);
                    }
                }
                Effect::ShowBook { start_page } => {
                    self.book.turn_to(start_page);
                    if let Some(scene) = self.scene.as_mut() {
                        scene.chrome.show_book();
                    }
                }
                Effect::FlipNext => {
                    if !self.book.flip_next(now) {
                        debug!("flip forward ignored by flipbook");
                    }
                }
                Effect::FlipPrev => {
                    if !self.book.flip_prev(now) {
                        debug!("flip backward ignored by flipbook");
                    }
                }
                Effect::PageChanged(page) => {
                    info!(page, "page changed");
                }
            }
        }
        self.sync_chrome();
        self.request_redraw();
    }

    /// Pushes progress, mode and navigation state into the overlay.
    fn sync_chrome(&mut self) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let progress = self.state.progress();
        scene
            .chrome
            .set_progress(progress.completed(), progress.total());
        if self.state.book_shown() {
            scene.chrome.show_book();
        }
        let nav = self.state.navigator();
        scene
            .chrome
            .set_navigation(nav.label(), nav.can_prev(), nav.can_next());
    }

    fn handle_preload(&mut self, event: PreloadEvent) {
        match event {
            PreloadEvent::Settled { asset, progress } => {
                if let AssetOutcome::Loaded(image) = asset.outcome {
                    let page = asset.index + 1;
                    match (self.gpu.as_ref(), self.scene.as_mut()) {
                        (Some(gpu), Some(scene)) => {
                            scene
                                .pages
                                .set_page_image(&gpu.device, &gpu.queue, page, &image);
                        }
                        _ => self.pending_images.push((page, image)),
                    }
                }
                self.dispatch(CatalogEvent::Progress(progress));
            }
            PreloadEvent::Progress(progress) => {
                self.dispatch(CatalogEvent::Progress(progress));
            }
            PreloadEvent::Ready { total } => {
                debug!(total, "preload ready");
                self.dispatch(CatalogEvent::PreloadReady);
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        match event.logical_key.as_ref() {
            Key::Named(NamedKey::ArrowRight | NamedKey::PageDown | NamedKey::Space) => {
                self.dispatch(CatalogEvent::NextRequested);
            }
            Key::Named(NamedKey::ArrowLeft | NamedKey::PageUp) => {
                self.dispatch(CatalogEvent::PrevRequested);
            }
            Key::Named(NamedKey::Escape) => {
                info!("escape pressed; closing catalog");
                event_loop.exit();
            }
            Key::Character(c) if c.eq_ignore_ascii_case("q") => {
                info!("quit key pressed; closing catalog");
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, state: ElementState, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        let Some((x, y)) = self.cursor else {
            return;
        };
        match state {
            ElementState::Pressed => {
                let hit = self.scene.as_ref().and_then(|scene| scene.chrome.hit_test(x, y));
                match hit {
                    Some(ChromeButton::Next) => self.dispatch(CatalogEvent::NextRequested),
                    Some(ChromeButton::Prev) => self.dispatch(CatalogEvent::PrevRequested),
                    None if self.state.book_shown() => self.book.pointer_pressed(x, y),
                    None => {}
                }
            }
            ElementState::Released => {
                if self.book.pointer_released(x, y, Instant::now()) {
                    self.request_redraw();
                }
            }
        }
    }

    fn set_cursor(&mut self, position: PhysicalPosition<f64>) {
        let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
        let logical = position.to_logical::<f32>(scale);
        self.cursor = Some((logical.x, logical.y));
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if let Some(FlipEvent::Flipped(page)) = self.book.tick(now) {
            self.dispatch(CatalogEvent::PageFlipped(page));
        }

        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Outdated) | Err(SurfaceError::Lost) => {
                info!("catalog surface lost; reconfiguring");
                self.handle_resize(window.inner_size());
                return;
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("catalog surface out of memory; exiting event loop");
                event_loop.exit();
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("catalog surface acquisition timed out");
                return;
            }
            Err(SurfaceError::Other) => {
                warn!("catalog surface reported an unknown error; retrying");
                self.handle_resize(window.inner_size());
                return;
            }
        };

        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        let quads = if self.state.book_shown() {
            self.book.quads(now)
        } else {
            Vec::new()
        };
        let page = self.book.page_rect();
        let page_aspect = if page.height > 0.0 {
            page.width / page.height
        } else {
            1.0
        };
        scene.pages.prepare(
            &gpu.device,
            &gpu.queue,
            &quads,
            self.state.viewport(),
            page_aspect,
        );
        scene.chrome.prepare();

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("catalog-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("catalog-frame"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_wgpu_color(scene.chrome.palette().background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            scene.pages.draw(&mut pass);
            scene.chrome.draw(&mut pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        window.pre_present_notify();
        frame.present();
        scene.chrome.after_frame();

        self.pending_redraw = self.book.is_animating();
    }

    fn request_redraw(&mut self) {
        self.pending_redraw = true;
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler<ViewerEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }

        let Some(window) = self.ensure_window(event_loop) else {
            event_loop.exit();
            return;
        };

        if self.gpu.is_none() {
            if let Err(err) = self.init_gpu(window) {
                error!(error = ?err, "failed to initialize GPU state");
                event_loop.exit();
                return;
            }
        }

        self.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("catalog window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.set_cursor(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse(state, button);
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.pending_redraw {
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Preload(event) => self.handle_preload(event),
            ViewerEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }
}

/// Runs the catalog window on the calling thread until it closes or `cancel`
/// fires. Preload events are relayed into the event loop as user events.
pub fn run_windowed(
    from_preloader: PreloadReceiver,
    cancel: CancellationToken,
    cfg: Configuration,
) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    let forward_task = {
        let cancel = cancel.clone();
        let mut from_preloader = from_preloader;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = proxy.send_event(ViewerEvent::Cancelled);
                        break;
                    }
                    received = from_preloader.recv() => {
                        let Some(event) = received else {
                            // Preloader finished; keep waiting for shutdown.
                            cancel.cancelled().await;
                            let _ = proxy.send_event(ViewerEvent::Cancelled);
                            break;
                        };
                        if proxy.send_event(ViewerEvent::Preload(event)).is_err() {
                            break;
                        }
                    }
                }
            }
        })
    };

    let mut app = ViewerApp::new(cfg, cancel);
    let run_result = event_loop.run_app(&mut app);
    forward_task.abort();

    run_result.context("viewer event loop failed")
}
