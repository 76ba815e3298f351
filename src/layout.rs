//! Responsive geometry for the catalog window.
//!
//! Everything here works in logical pixels and is free of window or GPU
//! types so the numbers can be checked directly in tests.

pub use book_model::{ChromeConfig, SizeMode};

/// Current window size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Width and height of one book page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BookDimensions {
    pub width: f32,
    pub height: f32,
}

impl BookDimensions {
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Computes the page size that fits between the chrome without scrolling.
///
/// Height is the primary constraint; width only takes over when the
/// height-derived width would overflow the horizontal allowance. The page is
/// treated as `width = height / aspect_ratio`. Degenerate viewports produce a
/// zero-sized result rather than negative numbers.
pub fn compute_book_dimensions(
    viewport: ViewportSize,
    chrome: &ChromeConfig,
    aspect_ratio: f32,
) -> BookDimensions {
    let available_height =
        viewport.height - chrome.header_height - chrome.buttons_height - chrome.padding;
    let available_width = viewport.width - chrome.horizontal_margin;

    let mut height = available_height;
    let mut width = height / aspect_ratio;

    if width > available_width {
        width = available_width;
        height = width * aspect_ratio;
    }

    BookDimensions {
        width: width.max(0.0),
        height: height.max(0.0),
    }
}

/// Soft min/max bounds handed to the flipbook widget.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeBounds {
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
}

impl SizeBounds {
    /// Band of `±tolerance` around the computed size (0.2 gives 80%..120%).
    pub fn around(dims: BookDimensions, tolerance: f32) -> Self {
        let low = (1.0 - tolerance).max(0.0);
        let high = 1.0 + tolerance;
        Self {
            min_width: dims.width * low,
            max_width: dims.width * high,
            min_height: dims.height * low,
            max_height: dims.height * high,
        }
    }
}

/// Resolves the size the widget actually renders a page at.
///
/// `Fixed` returns the computed size. `Stretch` fills `container` at the
/// page aspect ratio, then clamps into `bounds`.
pub fn resolve_page_size(
    container: BookDimensions,
    computed: BookDimensions,
    bounds: &SizeBounds,
    mode: SizeMode,
    aspect_ratio: f32,
) -> BookDimensions {
    match mode {
        SizeMode::Fixed => computed,
        SizeMode::Stretch => {
            let mut width = container.width.min(container.height / aspect_ratio);
            width = width.clamp(bounds.min_width, bounds.max_width.max(bounds.min_width));
            let mut height = width * aspect_ratio;
            if height > bounds.max_height || height < bounds.min_height {
                height = height.clamp(bounds.min_height, bounds.max_height.max(bounds.min_height));
                width = height / aspect_ratio;
            }
            BookDimensions {
                width: width.max(0.0),
                height: height.max(0.0),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width * 0.5
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Rectangle of `width`x`height` centred on this one.
    pub fn centered(&self, width: f32, height: f32) -> Rect {
        Rect {
            x: self.x + (self.width - width) * 0.5,
            y: self.y + (self.height - height) * 0.5,
            width,
            height,
        }
    }
}

/// Largest rectangle with the image's aspect ratio that fits inside `frame`,
/// centred on both axes.
pub fn fit_contain(image_width: u32, image_height: u32, frame: Rect) -> Rect {
    if image_width == 0 || image_height == 0 || frame.width <= 0.0 || frame.height <= 0.0 {
        return Rect::new(frame.x, frame.y, 0.0, 0.0);
    }
    let scale = (frame.width / image_width as f32).min(frame.height / image_height as f32);
    frame.centered(image_width as f32 * scale, image_height as f32 * scale)
}

/// UV scale that letterboxes an image inside a page of the given aspect
/// (width / height). Sampled coordinates are `(uv - 0.5) * scale + 0.5`;
/// anything outside `0..1` is paper.
pub fn contain_uv_scale(image_width: u32, image_height: u32, page_aspect: f32) -> [f32; 2] {
    if !(page_aspect > 0.0) {
        return [1.0, 1.0];
    }
    let page = Rect::new(0.0, 0.0, page_aspect, 1.0);
    let placed = fit_contain(image_width, image_height, page);
    if placed.width <= 0.0 || placed.height <= 0.0 {
        return [1.0, 1.0];
    }
    [page.width / placed.width, page.height / placed.height]
}

const BUTTON_WIDTH: f32 = 120.0;
const BUTTON_HEIGHT: f32 = 36.0;
const LABEL_WIDTH: f32 = 160.0;
const BUTTON_GAP: f32 = 16.0;
const PROGRESS_TRACK_WIDTH: f32 = 256.0;
const PROGRESS_TRACK_HEIGHT: f32 = 16.0;
const LOADING_MESSAGE_HEIGHT: f32 = 40.0;

/// Placement of every chrome element for one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChromeLayout {
    pub header: Rect,
    /// Area between header and button row; the book is centred inside it.
    pub content: Rect,
    pub book: Rect,
    pub buttons: Rect,
    pub prev_button: Rect,
    pub page_label: Rect,
    pub next_button: Rect,
    pub loading_message: Rect,
    pub progress_track: Rect,
}

impl ChromeLayout {
    pub fn compute(viewport: ViewportSize, chrome: &ChromeConfig, page: BookDimensions) -> Self {
        let width = viewport.width.max(0.0);
        let height = viewport.height.max(0.0);
        let header = Rect::new(0.0, 0.0, width, chrome.header_height.min(height));
        let buttons_top = (height - chrome.buttons_height).max(header.bottom());
        let buttons = Rect::new(0.0, buttons_top, width, height - buttons_top);
        let content = Rect::new(
            0.0,
            header.bottom(),
            width,
            (buttons.y - header.bottom()).max(0.0),
        );
        let book = content.centered(page.width, page.height);

        let row_width = BUTTON_WIDTH * 2.0 + LABEL_WIDTH + BUTTON_GAP * 2.0;
        let row = buttons.centered(row_width, BUTTON_HEIGHT.min(buttons.height));
        let prev_button = Rect::new(row.x, row.y, BUTTON_WIDTH, row.height);
        let page_label = Rect::new(
            prev_button.right() + BUTTON_GAP,
            row.y,
            LABEL_WIDTH,
            row.height,
        );
        let next_button = Rect::new(
            page_label.right() + BUTTON_GAP,
            row.y,
            BUTTON_WIDTH,
            row.height,
        );

        let stack = content.centered(
            PROGRESS_TRACK_WIDTH,
            LOADING_MESSAGE_HEIGHT + PROGRESS_TRACK_HEIGHT,
        );
        let loading_message = Rect::new(
            content.x,
            stack.y,
            content.width,
            LOADING_MESSAGE_HEIGHT,
        );
        let progress_track = Rect::new(
            stack.x,
            loading_message.bottom(),
            PROGRESS_TRACK_WIDTH,
            PROGRESS_TRACK_HEIGHT,
        );

        Self {
            header,
            content,
            book,
            buttons,
            prev_button,
            page_label,
            next_button,
            loading_message,
            progress_track,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome() -> ChromeConfig {
        ChromeConfig::default()
    }

    #[test]
    fn degenerate_viewport_is_non_negative() {
        let dims = compute_book_dimensions(ViewportSize::new(10.0, 10.0), &chrome(), 8.5 / 11.0);
        assert_eq!(dims, BookDimensions::default());
        assert!(dims.is_degenerate());
    }

    #[test]
    fn bounds_follow_tolerance() {
        let bounds = SizeBounds::around(
            BookDimensions {
                width: 100.0,
                height: 50.0,
            },
            0.2,
        );
        assert!((bounds.min_width - 80.0).abs() < 1e-4);
        assert!((bounds.max_width - 120.0).abs() < 1e-4);
        assert!((bounds.min_height - 40.0).abs() < 1e-4);
        assert!((bounds.max_height - 60.0).abs() < 1e-4);
    }

    #[test]
    fn stretch_clamps_to_band() {
        let computed = BookDimensions {
            width: 200.0,
            height: 100.0,
        };
        let bounds = SizeBounds::around(computed, 0.2);
        let huge = BookDimensions {
            width: 2000.0,
            height: 1000.0,
        };
        let size = resolve_page_size(huge, computed, &bounds, SizeMode::Stretch, 0.5);
        assert!((size.width - 240.0).abs() < 1e-3);
        assert!((size.height - 120.0).abs() < 1e-3);

        let fixed = resolve_page_size(huge, computed, &bounds, SizeMode::Fixed, 0.5);
        assert_eq!(fixed, computed);
    }

    #[test]
    fn stretch_matches_container_inside_band() {
        let computed = BookDimensions {
            width: 200.0,
            height: 100.0,
        };
        let bounds = SizeBounds::around(computed, 0.2);
        let size = resolve_page_size(computed, computed, &bounds, SizeMode::Stretch, 0.5);
        assert!((size.width - 200.0).abs() < 1e-3);
        assert!((size.height - 100.0).abs() < 1e-3);
    }

    #[test]
    fn uv_scale_letterboxes_tall_image_on_wide_page() {
        let scale = contain_uv_scale(1000, 2000, 2.0);
        assert!((scale[0] - 4.0).abs() < 1e-4);
        assert!((scale[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn uv_scale_matches_placed_rect() {
        let page = Rect::new(0.0, 0.0, 8.5 / 11.0, 1.0);
        let placed = fit_contain(1600, 900, page);
        let scale = contain_uv_scale(1600, 900, page.width);
        assert!((scale[0] - 1.0).abs() < 1e-4);
        assert!((scale[1] * placed.height - 1.0).abs() < 1e-4);
        assert_eq!(contain_uv_scale(0, 900, 1.0), [1.0, 1.0]);
    }

    #[test]
    fn chrome_layout_centres_book_between_bands() {
        let viewport = ViewportSize::new(1000.0, 800.0);
        let dims = compute_book_dimensions(viewport, &chrome(), 8.5 / 11.0);
        let layout = ChromeLayout::compute(viewport, &chrome(), dims);
        assert_eq!(layout.header.height, 80.0);
        assert_eq!(layout.buttons.y, 740.0);
        assert!((layout.book.center_x() - 500.0).abs() < 1e-3);
        assert!(layout.book.y >= layout.header.bottom());
        assert!(layout.book.bottom() <= layout.buttons.y);
        assert!(layout.prev_button.right() < layout.page_label.x);
        assert!(layout.page_label.right() < layout.next_button.x);
    }
}
