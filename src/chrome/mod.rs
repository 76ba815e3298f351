//! Fixed UI around the book: header, loading screen, navigation buttons and
//! page label.

pub mod shapes;
pub mod text;

use glyphon::{
    Cache, Color, FamilyOwned, FontSystem, Resolution, SwashCache, TextAtlas, TextRenderer,
    Viewport,
};
use palette::LinSrgba;
use tracing::warn;
use winit::dpi::PhysicalSize;

use crate::config::Configuration;
use crate::layout::{ChromeLayout, Rect, ViewportSize};

use shapes::{RoundedRect, ShapeRenderer};
use text::{
    TextBlock, new_font_system, resolve_color, resolve_font_family, to_linear_array,
    to_text_color,
};

const TITLE_SIZE: f32 = 28.0;
const SUBTITLE_SIZE: f32 = 16.0;
const MESSAGE_SIZE: f32 = 20.0;
const LABEL_SIZE: f32 = 16.0;
const BUTTON_TEXT: &str = "#FFFFFF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeButton {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Loading,
    Book,
}

#[derive(Debug, Clone, Copy)]
pub struct ChromePalette {
    pub background: LinSrgba<f32>,
    pub font: LinSrgba<f32>,
    pub accent: LinSrgba<f32>,
    pub track: LinSrgba<f32>,
    pub button: LinSrgba<f32>,
    pub button_disabled: LinSrgba<f32>,
    pub paper: LinSrgba<f32>,
}

impl ChromePalette {
    pub fn from_config(cfg: &Configuration) -> Self {
        let colors = &cfg.loading_screen.colors;
        Self {
            background: resolve_color(colors.background.as_deref(), "#F9FAFB"),
            font: resolve_color(colors.font.as_deref(), "#1F2937"),
            accent: resolve_color(colors.accent.as_deref(), "#2563EB"),
            track: resolve_color(colors.track.as_deref(), "#E5E7EB"),
            button: resolve_color(colors.button.as_deref(), "#2563EB"),
            button_disabled: resolve_color(colors.button_disabled.as_deref(), "#9CA3AF"),
            paper: resolve_color(None, "#FFFFFF"),
        }
    }
}

struct Texts {
    title: TextBlock,
    subtitle: TextBlock,
    message: TextBlock,
    label: TextBlock,
    prev: TextBlock,
    next: TextBlock,
}

/// Renders everything outside the page quads.
pub struct ChromeOverlay {
    device: wgpu::Device,
    queue: wgpu::Queue,
    _cache: Cache,
    viewport: Viewport,
    atlas: TextAtlas,
    text_renderer: TextRenderer,
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: FamilyOwned,
    shapes: ShapeRenderer,
    texts: Texts,
    state: ChromeState,
    title: String,
    subtitle: String,
    message: String,
    logical: ViewportSize,
    size: PhysicalSize<u32>,
    scale_factor: f32,
    dirty: bool,
}

impl ChromeOverlay {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        cfg: &Configuration,
    ) -> Self {
        let mut font_system = new_font_system();
        let family = resolve_font_family(&font_system, cfg.loading_screen.font.as_deref());

        let cache = Cache::new(device);
        let viewport = Viewport::new(device, &cache);
        let mut atlas = TextAtlas::new(device, queue, &cache, format);
        let text_renderer =
            TextRenderer::new(&mut atlas, device, wgpu::MultisampleState::default(), None);

        let palette = ChromePalette::from_config(cfg);
        let font = to_text_color(palette.font);
        let on_button = to_text_color(resolve_color(None, BUTTON_TEXT));
        let texts = Texts {
            title: TextBlock::new(&mut font_system, TITLE_SIZE, true, font),
            subtitle: TextBlock::new(&mut font_system, SUBTITLE_SIZE, false, font),
            message: TextBlock::new(&mut font_system, MESSAGE_SIZE, false, font),
            label: TextBlock::new(&mut font_system, LABEL_SIZE, false, font),
            prev: TextBlock::new(&mut font_system, LABEL_SIZE, false, on_button),
            next: TextBlock::new(&mut font_system, LABEL_SIZE, false, on_button),
        };

        Self {
            device: device.clone(),
            queue: queue.clone(),
            shapes: ShapeRenderer::new(device, format),
            _cache: cache,
            viewport,
            atlas,
            text_renderer,
            font_system,
            swash_cache: SwashCache::new(),
            family,
            texts,
            state: ChromeState::new(palette, cfg.loading_screen.effective_corner_radius_dip()),
            title: cfg.catalog.title.clone(),
            subtitle: cfg.catalog.subtitle.clone(),
            message: cfg.loading_screen.message_or_default().into_owned(),
            logical: ViewportSize::new(0.0, 0.0),
            size: PhysicalSize::new(0, 0),
            scale_factor: 1.0,
            dirty: true,
        }
    }

    pub fn palette(&self) -> &ChromePalette {
        &self.state.palette
    }

    /// Shared font state for painting cover text.
    pub fn fonts_mut(&mut self) -> (&mut FontSystem, &FamilyOwned) {
        (&mut self.font_system, &self.family)
    }

    pub fn resize(
        &mut self,
        layout: ChromeLayout,
        logical: ViewportSize,
        size: PhysicalSize<u32>,
        scale_factor: f64,
    ) {
        self.state.layout = layout;
        self.logical = logical;
        self.size = size;
        self.scale_factor = scale_factor as f32;
        self.dirty = true;
    }

    pub fn set_progress(&mut self, completed: usize, total: usize) {
        self.dirty |= self.state.set_progress(completed, total);
    }

    pub fn show_book(&mut self) {
        if self.state.mode != Mode::Book {
            self.state.mode = Mode::Book;
            self.dirty = true;
        }
    }

    pub fn set_navigation(&mut self, label: String, can_prev: bool, can_next: bool) {
        self.dirty |= self.state.set_navigation(label, can_prev, can_next);
    }

    /// Button under the logical point, if the book is showing.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<ChromeButton> {
        if self.state.mode != Mode::Book {
            return None;
        }
        if self.state.layout.prev_button.contains(x, y) {
            Some(ChromeButton::Prev)
        } else if self.state.layout.next_button.contains(x, y) {
            Some(ChromeButton::Next)
        } else {
            None
        }
    }

    /// Rebuilds shapes and text for the current state. Call before the
    /// render pass that uses [`ChromeOverlay::draw`].
    pub fn prepare(&mut self) -> bool {
        if self.size.width == 0 || self.size.height == 0 {
            return false;
        }
        if self.dirty {
            self.relayout();
            self.dirty = false;
        }

        self.viewport.update(
            &self.queue,
            Resolution {
                width: self.size.width,
                height: self.size.height,
            },
        );

        let scale = self.scale_factor;
        let clip = (self.size.width, self.size.height);
        let texts = &self.texts;
        let areas: Vec<_> = self
            .state
            .text_slots()
            .into_iter()
            .map(|slot| texts.block(slot).area(scale, clip))
            .collect();
        if let Err(err) = self.text_renderer.prepare(
            &self.device,
            &self.queue,
            &mut self.font_system,
            &mut self.atlas,
            &self.viewport,
            areas,
            &mut self.swash_cache,
        ) {
            warn!(error = %err, "chrome text prepare failed");
        }
        true
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.shapes.draw(pass);
        if let Err(err) = self.text_renderer.render(&self.atlas, &self.viewport, pass) {
            warn!(error = %err, "chrome text draw failed");
        }
    }

    pub fn after_frame(&mut self) {
        self.atlas.trim();
    }

    fn relayout(&mut self) {
        let layout = self.state.layout;
        let scale = self.scale_factor;
        let fs = &mut self.font_system;
        let family = &self.family;
        let texts = &mut self.texts;

        let header = layout.header;
        let title_rect = Rect::new(header.x, header.y, header.width, header.height * 0.6);
        let subtitle_rect = Rect::new(
            header.x,
            title_rect.bottom(),
            header.width,
            header.height - title_rect.height,
        );
        texts.title.layout(fs, family, &self.title, title_rect, scale);
        texts
            .subtitle
            .layout(fs, family, &self.subtitle, subtitle_rect, scale);
        texts.prev.layout(fs, family, "Previous", layout.prev_button, scale);
        texts.next.layout(fs, family, "Next", layout.next_button, scale);
        texts
            .label
            .layout(fs, family, &self.state.page_label, layout.page_label, scale);
        if self.state.mode == Mode::Loading {
            texts
                .message
                .layout(fs, family, &self.message, layout.loading_message, scale);
        }

        let shapes = self.state.shapes();
        self.shapes.update(&self.device, &shapes, self.logical);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextSlot {
    Title,
    Subtitle,
    Message,
    Prev,
    Label,
    Next,
}

impl Texts {
    fn block(&self, slot: TextSlot) -> &TextBlock {
        match slot {
            TextSlot::Title => &self.title,
            TextSlot::Subtitle => &self.subtitle,
            TextSlot::Message => &self.message,
            TextSlot::Prev => &self.prev,
            TextSlot::Label => &self.label,
            TextSlot::Next => &self.next,
        }
    }
}

/// What the overlay shows, independent of the GPU resources drawing it.
///
/// The header and the button row are always present. Only the middle band
/// switches between the loading stack and the book.
#[derive(Debug, Clone)]
struct ChromeState {
    mode: Mode,
    layout: ChromeLayout,
    palette: ChromePalette,
    corner_radius: f32,
    fraction: f32,
    page_label: String,
    can_prev: bool,
    can_next: bool,
}

impl ChromeState {
    fn new(palette: ChromePalette, corner_radius: f32) -> Self {
        Self {
            mode: Mode::Loading,
            layout: ChromeLayout::default(),
            palette,
            corner_radius,
            fraction: 0.0,
            page_label: String::new(),
            can_prev: false,
            can_next: false,
        }
    }

    /// Returns true when the bar needs redrawing.
    fn set_progress(&mut self, completed: usize, total: usize) -> bool {
        let fraction = if total == 0 {
            1.0
        } else {
            (completed as f32 / total as f32).clamp(0.0, 1.0)
        };
        if (fraction - self.fraction).abs() > f32::EPSILON {
            self.fraction = fraction;
            return true;
        }
        false
    }

    fn set_navigation(&mut self, label: String, can_prev: bool, can_next: bool) -> bool {
        if self.page_label == label && self.can_prev == can_prev && self.can_next == can_next {
            return false;
        }
        self.page_label = label;
        self.can_prev = can_prev;
        self.can_next = can_next;
        true
    }

    fn text_slots(&self) -> Vec<TextSlot> {
        let mut slots = vec![
            TextSlot::Title,
            TextSlot::Subtitle,
            TextSlot::Prev,
            TextSlot::Label,
            TextSlot::Next,
        ];
        if self.mode == Mode::Loading {
            slots.push(TextSlot::Message);
        }
        slots
    }

    fn shapes(&self) -> Vec<RoundedRect> {
        let layout = &self.layout;
        let button_color = |enabled: bool| {
            to_linear_array(if enabled {
                self.palette.button
            } else {
                self.palette.button_disabled
            })
        };
        let mut shapes = vec![
            RoundedRect {
                rect: layout.prev_button,
                radius: self.corner_radius,
                color: button_color(self.can_prev),
            },
            RoundedRect {
                rect: layout.next_button,
                radius: self.corner_radius,
                color: button_color(self.can_next),
            },
        ];
        if self.mode == Mode::Loading {
            let track = layout.progress_track;
            let radius = track.height * 0.5;
            let mut fill = track;
            fill.width = track.width * self.fraction;
            shapes.push(RoundedRect {
                rect: track,
                radius,
                color: to_linear_array(self.palette.track),
            });
            shapes.push(RoundedRect {
                rect: fill,
                radius: radius.min(fill.width * 0.5),
                color: to_linear_array(self.palette.accent),
            });
        }
        shapes
    }
}

/// Text colour used on cover pages.
pub fn cover_text_color(palette: &ChromePalette) -> Color {
    to_text_color(palette.font)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_book_dimensions;

    fn loading_state() -> ChromeState {
        let cfg = Configuration::default();
        let viewport = ViewportSize::new(1000.0, 800.0);
        let dims = compute_book_dimensions(viewport, &cfg.chrome, cfg.book.aspect_ratio);
        let mut state = ChromeState::new(ChromePalette::from_config(&cfg), 8.0);
        state.layout = ChromeLayout::compute(viewport, &cfg.chrome, dims);
        state.set_navigation("Page 1 of 5".into(), false, true);
        state
    }

    #[test]
    fn loading_screen_keeps_header_and_buttons() {
        let state = loading_state();
        let slots = state.text_slots();
        for slot in [
            TextSlot::Title,
            TextSlot::Subtitle,
            TextSlot::Prev,
            TextSlot::Label,
            TextSlot::Next,
            TextSlot::Message,
        ] {
            assert!(slots.contains(&slot), "missing {slot:?}");
        }

        let shapes = state.shapes();
        let prev = shapes
            .iter()
            .find(|shape| shape.rect == state.layout.prev_button)
            .expect("prev button drawn while loading");
        assert_eq!(prev.color, to_linear_array(state.palette.button_disabled));
        let next = shapes
            .iter()
            .find(|shape| shape.rect == state.layout.next_button)
            .expect("next button drawn while loading");
        assert_eq!(next.color, to_linear_array(state.palette.button));
        assert!(shapes.iter().any(|shape| shape.rect == state.layout.progress_track));
    }

    #[test]
    fn book_mode_drops_only_the_loading_stack() {
        let mut state = loading_state();
        state.mode = Mode::Book;
        let slots = state.text_slots();
        assert!(!slots.contains(&TextSlot::Message));
        assert_eq!(slots.len(), 5);

        let shapes = state.shapes();
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().all(|shape| shape.rect != state.layout.progress_track));
    }

    #[test]
    fn progress_fill_tracks_fraction() {
        let mut state = loading_state();
        assert!(state.set_progress(1, 4));
        assert!(!state.set_progress(1, 4));
        let fill = state.shapes()[3];
        assert!((fill.rect.width - state.layout.progress_track.width * 0.25).abs() < 1e-3);
    }
}
