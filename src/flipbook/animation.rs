use std::f32::consts::PI;
use std::time::{Duration, Instant};

use crate::layout::Rect;

/// Share of the page width the fold shadow covers at its widest.
const SHADOW_WIDTH_FRACTION: f32 = 0.12;
/// How far the free edge of a turning page lifts, as a share of page height.
const LIFT_FRACTION: f32 = 0.03;
/// Darkening applied to the turning page at its steepest angle.
const TURN_DARKENING: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Forward,
    Backward,
}

/// Cubic ease-in-out over `0..=1`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let f = -2.0 * t + 2.0;
        1.0 - f * f * f / 2.0
    }
}

/// One page turn in flight.
#[derive(Debug, Clone, Copy)]
pub struct FlipAnimation {
    pub direction: FlipDirection,
    pub from: usize,
    pub to: usize,
    started: Instant,
    duration: Duration,
}

impl FlipAnimation {
    pub fn new(direction: FlipDirection, from: usize, to: usize, started: Instant, duration: Duration) -> Self {
        Self {
            direction,
            from,
            to,
            started,
            duration,
        }
    }

    /// Linear progress in `0..=1`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Draw list for this animation at `now`, back to front.
    pub fn quads(&self, page: Rect, now: Instant, max_shadow_opacity: f32) -> Vec<PageQuad> {
        let eased = ease_in_out(self.progress(now));
        // A backward flip is a forward flip of the previous page, played in reverse.
        let (turning, under, turn) = match self.direction {
            FlipDirection::Forward => (self.from, self.to, eased),
            FlipDirection::Backward => (self.to, self.from, 1.0 - eased),
        };
        turn_quads(page, turning, under, turn, max_shadow_opacity)
    }
}

/// What a quad samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadSource {
    Page(usize),
    /// Reverse side of a turning page.
    PaperBack,
    /// Fold shadow; fades out across the quad.
    Shadow,
}

/// A textured quad in logical pixels. Corners are top-left, bottom-left,
/// top-right, bottom-right (triangle strip order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageQuad {
    pub source: QuadSource,
    pub corners: [[f32; 2]; 4],
    pub brightness: f32,
    pub alpha: f32,
}

impl PageQuad {
    pub fn flat(source: QuadSource, rect: Rect) -> Self {
        Self {
            source,
            corners: [
                [rect.x, rect.y],
                [rect.x, rect.bottom()],
                [rect.right(), rect.y],
                [rect.right(), rect.bottom()],
            ],
            brightness: 1.0,
            alpha: 1.0,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.corners.iter().map(|c| c[0]).fold(f32::MAX, f32::min)
    }

    pub fn max_x(&self) -> f32 {
        self.corners.iter().map(|c| c[0]).fold(f32::MIN, f32::max)
    }
}

/// Quads for `turning` rotating about the left (spine) edge of `page` over
/// `under`. `turn` is 0 when the page lies flat and 1 when it has fully
/// turned over.
pub fn turn_quads(
    page: Rect,
    turning: usize,
    under: usize,
    turn: f32,
    max_shadow_opacity: f32,
) -> Vec<PageQuad> {
    let turn = turn.clamp(0.0, 1.0);
    let angle = turn * PI;
    let cos = angle.cos();
    let sin = angle.sin();
    let lift = page.height * LIFT_FRACTION * sin;
    let spine = page.x;

    let mut quads = vec![PageQuad::flat(QuadSource::Page(under), page)];

    if cos >= 0.0 {
        let edge = spine + page.width * cos;
        let shadow_width = (page.width * SHADOW_WIDTH_FRACTION * sin).min(page.right() - edge);
        if shadow_width > 0.0 {
            let mut shadow = PageQuad::flat(
                QuadSource::Shadow,
                Rect::new(edge, page.y, shadow_width, page.height),
            );
            shadow.alpha = max_shadow_opacity * sin;
            quads.push(shadow);
        }
        quads.push(PageQuad {
            source: QuadSource::Page(turning),
            corners: [
                [spine, page.y],
                [spine, page.bottom()],
                [edge, page.y - lift],
                [edge, page.bottom() + lift],
            ],
            brightness: 1.0 - TURN_DARKENING * sin,
            alpha: 1.0,
        });
    } else {
        // Past the vertical: the back of the page folds out left of the spine
        // and fades as it settles.
        let edge = spine + page.width * cos;
        quads.push(PageQuad {
            source: QuadSource::PaperBack,
            corners: [
                [edge, page.y - lift],
                [edge, page.bottom() + lift],
                [spine, page.y],
                [spine, page.bottom()],
            ],
            brightness: 1.0 - TURN_DARKENING * sin,
            alpha: sin,
        });
    }
    quads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Rect {
        Rect::new(100.0, 50.0, 400.0, 300.0)
    }

    #[test]
    fn easing_hits_endpoints_and_midpoint() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!(ease_in_out(0.25) < 0.25);
        assert!(ease_in_out(0.75) > 0.75);
    }

    #[test]
    fn flat_page_covers_underlying_page() {
        let quads = turn_quads(page(), 1, 2, 0.0, 0.5);
        assert_eq!(quads.first().map(|q| q.source), Some(QuadSource::Page(2)));
        let top = quads.last().unwrap();
        assert_eq!(top.source, QuadSource::Page(1));
        assert!((top.max_x() - page().right()).abs() < 1e-3);
    }

    #[test]
    fn shadow_never_exceeds_configured_opacity() {
        for step in 0..=20 {
            let turn = step as f32 / 20.0;
            for quad in turn_quads(page(), 0, 1, turn, 0.4) {
                if quad.source == QuadSource::Shadow {
                    assert!(quad.alpha <= 0.4 + 1e-6, "alpha {} at {turn}", quad.alpha);
                    assert!(quad.max_x() <= page().right() + 1e-3);
                }
            }
        }
    }

    #[test]
    fn second_half_shows_back_left_of_spine() {
        let quads = turn_quads(page(), 0, 1, 0.75, 0.5);
        let back = quads.last().unwrap();
        assert_eq!(back.source, QuadSource::PaperBack);
        assert!(back.max_x() <= page().x + 1e-3);
        assert!(back.min_x() < page().x);
    }

    #[test]
    fn backward_flip_starts_fully_turned() {
        let start = Instant::now();
        let anim = FlipAnimation::new(
            FlipDirection::Backward,
            2,
            1,
            start,
            Duration::from_millis(700),
        );
        let quads = anim.quads(page(), start, 0.5);
        assert_eq!(quads[0].source, QuadSource::Page(2));
        let back = quads.last().unwrap();
        assert_eq!(back.source, QuadSource::PaperBack);
        assert!(back.alpha < 1e-3);
        assert!(anim.is_finished(start + Duration::from_millis(700)));
        assert!(!anim.is_finished(start + Duration::from_millis(350)));
    }
}
