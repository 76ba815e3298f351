use rust_flipbook::layout::{
    BookDimensions, ChromeConfig, ChromeLayout, Rect, SizeBounds, SizeMode, ViewportSize,
    compute_book_dimensions, fit_contain, resolve_page_size,
};

const LETTER: f32 = 8.5 / 11.0;

fn close(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "{a} vs {b}");
}

#[test]
fn desktop_viewport_is_height_constrained() {
    let dims = compute_book_dimensions(
        ViewportSize::new(1000.0, 800.0),
        &ChromeConfig::default(),
        LETTER,
    );
    // available height = 800 - 80 - 60 - 30 = 630; width = 630 / (8.5 / 11)
    close(dims.height, 630.0, 1e-3);
    close(dims.width, 815.294, 0.01);
}

#[test]
fn narrow_viewport_falls_back_to_width() {
    let chrome = ChromeConfig::default();
    let dims = compute_book_dimensions(ViewportSize::new(500.0, 800.0), &chrome, LETTER);
    // available width = 500 - 40
    close(dims.width, 460.0, 1e-3);
    close(dims.height, 460.0 * LETTER, 1e-3);
}

#[test]
fn height_constrained_results_keep_the_ratio() {
    let chrome = ChromeConfig::default();
    for (w, h) in [(1920.0, 1080.0), (2560.0, 1440.0), (1280.0, 900.0)] {
        let dims = compute_book_dimensions(ViewportSize::new(w, h), &chrome, LETTER);
        let available_width = w - chrome.horizontal_margin;
        assert!(dims.width <= available_width + 1e-3);
        close(dims.width, dims.height / LETTER, 1e-2);
    }
}

#[test]
fn layout_is_deterministic() {
    let viewport = ViewportSize::new(1366.0, 768.0);
    let chrome = ChromeConfig {
        header_height: 64.0,
        buttons_height: 48.0,
        padding: 12.0,
        horizontal_margin: 24.0,
    };
    let a = compute_book_dimensions(viewport, &chrome, 1.3);
    let b = compute_book_dimensions(viewport, &chrome, 1.3);
    assert_eq!(a, b);
}

#[test]
fn tiny_viewport_collapses_to_zero() {
    let dims = compute_book_dimensions(
        ViewportSize::new(10.0, 10.0),
        &ChromeConfig::default(),
        LETTER,
    );
    assert_eq!(dims, BookDimensions::default());
    assert!(dims.is_degenerate());
}

#[test]
fn book_is_centred_between_header_and_buttons() {
    let viewport = ViewportSize::new(1000.0, 800.0);
    let chrome = ChromeConfig::default();
    let dims = compute_book_dimensions(viewport, &chrome, LETTER);
    let layout = ChromeLayout::compute(viewport, &chrome, dims);

    close(layout.header.height, 80.0, 1e-3);
    close(layout.buttons.y, 740.0, 1e-3);
    close(layout.book.y, 95.0, 1e-3);
    close(layout.book.center_x(), 500.0, 1e-3);
    assert!(layout.prev_button.right() < layout.page_label.x);
    assert!(layout.page_label.right() < layout.next_button.x);
    assert!(layout.buttons.contains(layout.next_button.center_x(), layout.next_button.y + 1.0));
}

#[test]
fn stretch_mode_stays_inside_tolerance_band() {
    let computed = BookDimensions {
        width: 500.0,
        height: 500.0 * LETTER,
    };
    let bounds = SizeBounds::around(computed, 0.2);
    let huge = BookDimensions {
        width: 5000.0,
        height: 5000.0,
    };
    let page = resolve_page_size(huge, computed, &bounds, SizeMode::Stretch, LETTER);
    assert!(page.width <= bounds.max_width + 1e-3);
    assert!(page.height <= bounds.max_height + 1e-3);
    close(page.height, page.width * LETTER, 1e-2);

    let fixed = resolve_page_size(huge, computed, &bounds, SizeMode::Fixed, LETTER);
    assert_eq!(fixed, computed);
}

#[test]
fn portrait_image_letterboxes_on_a_landscape_page() {
    let page = Rect::new(0.0, 0.0, 800.0, 600.0);
    let placed = fit_contain(600, 900, page);
    close(placed.height, 600.0, 1e-3);
    close(placed.width, 400.0, 1e-3);
    close(placed.x, 200.0, 1e-3);
}
