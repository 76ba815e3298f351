//! Page-turning book widget.
//!
//! The widget shows one page at a time and turns pages about the left edge.
//! It owns its own notion of the current page and reports every completed
//! turn through [`FlipEvent::Flipped`].

pub mod animation;
pub mod renderer;

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::BookConfig;
use crate::layout::{BookDimensions, Rect, SizeBounds, SizeMode, resolve_page_size};

pub use animation::{FlipAnimation, FlipDirection, PageQuad, QuadSource};
pub use renderer::PageRenderer;

#[derive(Debug, Clone, PartialEq)]
pub struct FlipbookOptions {
    pub width: f32,
    pub height: f32,
    pub size_mode: SizeMode,
    pub bounds: SizeBounds,
    pub max_shadow_opacity: f32,
    pub start_page: usize,
    pub flip_duration: Duration,
    pub swipe_threshold: f32,
    pub aspect_ratio: f32,
    size_tolerance: f32,
}

impl FlipbookOptions {
    pub fn new(book: &BookConfig, dims: BookDimensions) -> Self {
        Self {
            width: dims.width,
            height: dims.height,
            size_mode: book.size_mode,
            bounds: SizeBounds::around(dims, book.size_tolerance),
            max_shadow_opacity: book.max_shadow_opacity,
            start_page: book.start_page,
            flip_duration: book.flip_duration,
            swipe_threshold: book.swipe_threshold,
            aspect_ratio: book.aspect_ratio,
            size_tolerance: book.size_tolerance,
        }
    }

    fn resize(&mut self, dims: BookDimensions) {
        self.width = dims.width;
        self.height = dims.height;
        self.bounds = SizeBounds::around(dims, self.size_tolerance);
    }
}

/// What a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageContent {
    FrontCover,
    /// Manifest entry at this index.
    Image(usize),
    BackCover,
}

impl PageContent {
    /// Front cover, `content_pages` image pages, back cover.
    pub fn catalog(content_pages: usize) -> Vec<PageContent> {
        std::iter::once(PageContent::FrontCover)
            .chain((0..content_pages).map(PageContent::Image))
            .chain(std::iter::once(PageContent::BackCover))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipEvent {
    Flipped(usize),
}

#[derive(Debug, Clone, Copy)]
struct PointerDown {
    x: f32,
    y: f32,
}

#[derive(Debug)]
pub struct Flipbook {
    options: FlipbookOptions,
    pages: Vec<PageContent>,
    current: usize,
    container: Rect,
    page_rect: Rect,
    animation: Option<FlipAnimation>,
    pointer: Option<PointerDown>,
}

impl Flipbook {
    pub fn new(options: FlipbookOptions, pages: Vec<PageContent>) -> Self {
        let last = pages.len().saturating_sub(1);
        let current = options.start_page.min(last);
        let container = Rect::new(0.0, 0.0, options.width, options.height);
        let mut book = Self {
            options,
            pages,
            current,
            container,
            page_rect: container,
            animation: None,
            pointer: None,
        };
        book.set_container(container);
        book
    }

    pub fn options(&self) -> &FlipbookOptions {
        &self.options
    }

    pub fn pages(&self) -> &[PageContent] {
        &self.pages
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn page_rect(&self) -> Rect {
        self.page_rect
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Places the widget inside `container` (logical pixels) and resolves the
    /// rendered page size from the size mode.
    pub fn set_container(&mut self, container: Rect) {
        let dims = BookDimensions {
            width: container.width,
            height: container.height,
        };
        self.options.resize(dims);
        let page = resolve_page_size(
            dims,
            dims,
            &self.options.bounds,
            self.options.size_mode,
            self.options.aspect_ratio,
        );
        self.container = container;
        self.page_rect = container.centered(page.width, page.height);
    }

    /// Shows `page` without animating; used when the book first appears.
    pub fn turn_to(&mut self, page: usize) {
        self.animation = None;
        self.current = page.min(self.last_page());
    }

    pub fn flip_next(&mut self, now: Instant) -> bool {
        if self.current >= self.last_page() {
            return false;
        }
        self.start_flip(FlipDirection::Forward, self.current + 1, now)
    }

    pub fn flip_prev(&mut self, now: Instant) -> bool {
        if self.current == 0 {
            return false;
        }
        self.start_flip(FlipDirection::Backward, self.current - 1, now)
    }

    pub fn pointer_pressed(&mut self, x: f32, y: f32) {
        self.pointer = self.page_rect.contains(x, y).then_some(PointerDown { x, y });
    }

    /// Ends a press. A horizontal swipe past the threshold turns toward the
    /// swipe; a click turns forward on the right half and back on the left.
    pub fn pointer_released(&mut self, x: f32, y: f32, now: Instant) -> bool {
        let Some(down) = self.pointer.take() else {
            return false;
        };
        let dx = x - down.x;
        let dy = y - down.y;
        if dx.abs() >= self.options.swipe_threshold && dx.abs() > dy.abs() {
            return if dx < 0.0 {
                self.flip_next(now)
            } else {
                self.flip_prev(now)
            };
        }
        if dx.abs() < self.options.swipe_threshold && self.page_rect.contains(x, y) {
            return if x >= self.page_rect.center_x() {
                self.flip_next(now)
            } else {
                self.flip_prev(now)
            };
        }
        false
    }

    /// Advances the running animation; reports the new page once it lands.
    pub fn tick(&mut self, now: Instant) -> Option<FlipEvent> {
        let anim = self.animation?;
        if !anim.is_finished(now) {
            return None;
        }
        self.animation = None;
        self.current = anim.to;
        debug!(page = self.current, "page flip completed");
        Some(FlipEvent::Flipped(self.current))
    }

    /// Draw list at `now`, back to front.
    pub fn quads(&self, now: Instant) -> Vec<PageQuad> {
        match &self.animation {
            Some(anim) => anim.quads(self.page_rect, now, self.options.max_shadow_opacity),
            None => vec![PageQuad::flat(QuadSource::Page(self.current), self.page_rect)],
        }
    }

    fn last_page(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    fn start_flip(&mut self, direction: FlipDirection, to: usize, now: Instant) -> bool {
        if self.animation.is_some() {
            return false;
        }
        debug!(from = self.current, to, ?direction, "page flip started");
        self.animation = Some(FlipAnimation::new(
            direction,
            self.current,
            to,
            now,
            self.options.flip_duration,
        ));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(content_pages: usize) -> Flipbook {
        let options = FlipbookOptions::new(
            &BookConfig::default(),
            BookDimensions {
                width: 400.0,
                height: 309.0,
            },
        );
        let mut book = Flipbook::new(options, PageContent::catalog(content_pages));
        book.set_container(Rect::new(100.0, 100.0, 400.0, 309.0));
        book
    }

    #[test]
    fn catalog_wraps_images_in_covers() {
        assert_eq!(
            PageContent::catalog(2),
            vec![
                PageContent::FrontCover,
                PageContent::Image(0),
                PageContent::Image(1),
                PageContent::BackCover,
            ]
        );
    }

    #[test]
    fn flip_reports_page_after_duration() {
        let mut book = book(3);
        let start = Instant::now();
        assert!(book.flip_next(start));
        assert!(!book.flip_next(start), "second flip ignored while animating");
        assert_eq!(book.tick(start + Duration::from_millis(100)), None);
        assert_eq!(
            book.tick(start + Duration::from_millis(700)),
            Some(FlipEvent::Flipped(1))
        );
        assert!(!book.is_animating());
        assert_eq!(book.current_page(), 1);
    }

    #[test]
    fn ends_refuse_to_flip() {
        let mut book = book(0);
        let now = Instant::now();
        assert!(!book.flip_prev(now));
        book.turn_to(1);
        assert!(!book.flip_next(now));
    }

    #[test]
    fn swipe_left_turns_forward() {
        let mut book = book(3);
        let now = Instant::now();
        let rect = book.page_rect();
        let y = rect.y + rect.height / 2.0;
        book.pointer_pressed(rect.center_x() + 50.0, y);
        assert!(book.pointer_released(rect.center_x() - 50.0, y, now));
        assert_eq!(book.tick(now + Duration::from_secs(1)), Some(FlipEvent::Flipped(1)));
    }

    #[test]
    fn click_on_left_half_turns_back() {
        let mut book = book(3);
        book.turn_to(2);
        let now = Instant::now();
        let rect = book.page_rect();
        let (x, y) = (rect.x + 10.0, rect.y + 10.0);
        book.pointer_pressed(x, y);
        assert!(book.pointer_released(x, y, now));
        assert_eq!(book.tick(now + Duration::from_secs(1)), Some(FlipEvent::Flipped(1)));
    }

    #[test]
    fn press_outside_page_is_ignored() {
        let mut book = book(3);
        book.pointer_pressed(0.0, 0.0);
        assert!(!book.pointer_released(0.0, 0.0, Instant::now()));
    }

    #[test]
    fn fixed_mode_keeps_container_size() {
        let mut book = book(1);
        book.options.size_mode = SizeMode::Fixed;
        book.set_container(Rect::new(10.0, 20.0, 300.0, 200.0));
        assert_eq!(book.page_rect(), Rect::new(10.0, 20.0, 300.0, 200.0));
    }
}
