use std::time::{Duration, Instant};

use rust_flipbook::config::{BookConfig, ChromeConfig};
use rust_flipbook::events::CatalogEvent;
use rust_flipbook::flipbook::{FlipEvent, Flipbook, FlipbookOptions, PageContent};
use rust_flipbook::layout::ViewportSize;
use rust_flipbook::state::{CatalogState, Effect};

const PAGES: usize = 3;

struct Harness {
    state: CatalogState,
    book: Flipbook,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        let state = CatalogState::new(
            PAGES,
            0,
            ChromeConfig::default(),
            8.5 / 11.0,
            ViewportSize::new(1000.0, 800.0),
        );
        let options = FlipbookOptions::new(&BookConfig::default(), state.book_dimensions());
        let mut book = Flipbook::new(options, PageContent::catalog(PAGES));
        book.set_container(state.chrome_layout().book);
        Self {
            state,
            book,
            now: Instant::now(),
        }
    }

    /// Feeds an event through the state and applies its effects to the book
    /// the way the viewer does.
    fn send(&mut self, event: CatalogEvent) {
        for effect in self.state.update(event) {
            match effect {
                Effect::ShowBook { start_page } => self.book.turn_to(start_page),
                Effect::FlipNext => {
                    self.book.flip_next(self.now);
                }
                Effect::FlipPrev => {
                    self.book.flip_prev(self.now);
                }
                Effect::Relayout(_) => self.book.set_container(self.state.chrome_layout().book),
                Effect::ProgressChanged(_) | Effect::PageChanged(_) => {}
            }
        }
    }

    /// Lets any running turn finish and reports it back.
    fn settle(&mut self) {
        self.now += Duration::from_secs(2);
        if let Some(FlipEvent::Flipped(page)) = self.book.tick(self.now) {
            self.send(CatalogEvent::PageFlipped(page));
        }
    }
}

#[test]
fn buttons_walk_from_cover_to_cover() {
    let mut h = Harness::new();
    h.send(CatalogEvent::PreloadReady);
    assert_eq!(h.state.navigator().label(), "Page 1 of 5");
    assert!(!h.state.navigator().can_prev());

    for expected in 1..=4 {
        h.send(CatalogEvent::NextRequested);
        h.settle();
        assert_eq!(h.book.current_page(), expected);
        assert_eq!(h.state.navigator().current(), expected);
    }
    assert!(!h.state.navigator().can_next());
    assert_eq!(h.state.navigator().label(), "Page 5 of 5");

    h.send(CatalogEvent::NextRequested);
    assert!(!h.book.is_animating());
}

#[test]
fn widget_report_corrects_optimistic_navigation() {
    let mut h = Harness::new();
    h.send(CatalogEvent::PreloadReady);

    // The second request arrives while the first turn is still running, so
    // the widget ignores it and the navigator runs ahead.
    h.send(CatalogEvent::NextRequested);
    h.send(CatalogEvent::NextRequested);
    assert_eq!(h.state.navigator().current(), 2);

    h.settle();
    assert_eq!(h.book.current_page(), 1);
    assert_eq!(h.state.navigator().current(), 1);
}

#[test]
fn click_on_right_half_turns_forward() {
    let mut h = Harness::new();
    h.send(CatalogEvent::PreloadReady);
    let page = h.book.page_rect();
    let x = page.x + page.width * 0.75;
    let y = page.y + page.height * 0.5;

    h.book.pointer_pressed(x, y);
    assert!(h.book.pointer_released(x, y, h.now));
    h.settle();
    assert_eq!(h.state.navigator().current(), 1);
    assert_eq!(h.state.navigator().label(), "Page 2 of 5");
}

#[test]
fn resize_keeps_the_book_inside_the_content_area() {
    let mut h = Harness::new();
    h.send(CatalogEvent::PreloadReady);
    h.send(CatalogEvent::Resized(ViewportSize::new(500.0, 800.0)));
    let layout = h.state.chrome_layout();
    let page = h.book.page_rect();
    assert!(page.x >= layout.content.x - 1e-3);
    assert!(page.right() <= layout.content.right() + 1e-3);
    assert!(page.y >= layout.content.y - 1e-3);
    assert!(page.bottom() <= layout.content.bottom() + 1e-3);
}

#[test]
fn navigation_before_ready_does_nothing() {
    let mut h = Harness::new();
    h.send(CatalogEvent::NextRequested);
    assert!(!h.book.is_animating());
    assert_eq!(h.state.navigator().current(), 0);
}
