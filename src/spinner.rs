use std::cell::RefCell;
use std::rc::Rc;

use egui::{Color32, Sense, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Animation, Icon};
use crate::grid;
use crate::schedule::{Scheduler, Scope};

/// Resting dot colour.
const DOT_BASE: Color32 = Color32::WHITE;
/// Fade-mode highlight tint.
const FADE_HIGHLIGHT: Color32 = Color32::from_gray(170);

/// Spiral-mode highlight: an almost fully transparent grey, so the
/// highlighted dot blinks out against the white of the others.
fn spiral_highlight() -> Color32 {
    Color32::from_rgba_unmultiplied(126, 126, 126, 1)
}

/// Length of one spiral cycle, in seconds.
const SPIRAL_PERIOD: f64 = 1.0;

/// Per-dot highlight delays within one spiral cycle, indexed by dot.
/// The values encode a hand-tuned spiral visual order, not index order.
const SPIRAL_DELAYS: [f64; grid::DOT_COUNT] = [0.1, 0.2, 0.3, 0.8, 0.9, 0.4, 0.7, 0.6, 0.5];

/// Fade-mode pulse duration range, in seconds.
const FADE_DURATION: std::ops::RangeInclusive<f64> = 1.0..=1.5;
/// Fade-mode initial delay range, in seconds.
const FADE_DELAY: std::ops::RangeInclusive<f64> = 0.5..=0.8;

#[derive(Debug, Clone, PartialEq)]
struct FadeTiming {
    duration: f64,
    delay: f64,
}

/// Per-dot fade timings, drawn once from a seeded RNG at construction.
#[derive(Debug, Clone, PartialEq)]
struct FadePlan {
    start: f64,
    dots: [FadeTiming; grid::DOT_COUNT],
}

impl FadePlan {
    fn seeded(seed: u64, start: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let dots = std::array::from_fn(|_| FadeTiming {
            duration: rng.random_range(FADE_DURATION),
            delay: rng.random_range(FADE_DELAY),
        });
        Self { start, dots }
    }

    /// Highlight level of a dot in `0.0..=1.0` at absolute time `now`.
    ///
    /// Each dot holds its base colour through its initial delay, then
    /// cycles forever with mirrored reverse: up over one duration, back
    /// down over the next, eased in and out.
    fn level_at(&self, index: usize, now: f64) -> f32 {
        let timing = &self.dots[index];
        let t = now - self.start - timing.delay;
        if t <= 0.0 {
            return 0.0;
        }
        let phase = (t / timing.duration) % 2.0;
        let raw = if phase <= 1.0 { phase } else { 2.0 - phase };
        ease_in_out(raw as f32)
    }
}

fn ease_in_out(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// A 3×3 grid of dots animated to suggest loading activity.
///
/// Construct one with [`Spinner::new`] against a host-owned [`Scheduler`]
/// and add it to a Ui (`ui.add(&spinner)`); the natural size is 42×42
/// points. Dropping the spinner cancels its repeating cycle and any
/// in-flight delayed callbacks; nothing outlives the widget.
pub struct Spinner {
    icon: Icon,
    animation: Animation,
    scheduler: Scheduler,
    dots: Rc<RefCell<[Color32; grid::DOT_COUNT]>>,
    fade: Option<FadePlan>,
    _scope: Scope,
}

impl Spinner {
    /// Natural size of the widget.
    pub const SIZE: Vec2 = Vec2::splat(grid::GRID_SIDE);

    /// Create a spinner with a freshly drawn fade seed.
    pub fn new(scheduler: &Scheduler, icon: Icon, animation: Animation) -> Self {
        Self::with_seed(scheduler, icon, animation, rand::random())
    }

    /// Create a spinner with an explicit fade seed. Two spinners built with
    /// the same seed animate identically in fade mode; spiral mode ignores
    /// the seed.
    pub fn with_seed(scheduler: &Scheduler, icon: Icon, animation: Animation, seed: u64) -> Self {
        let dots = Rc::new(RefCell::new([DOT_BASE; grid::DOT_COUNT]));
        let scope = scheduler.scope();
        let fade = match animation {
            Animation::Fade => Some(FadePlan::seeded(seed, scheduler.now())),
            Animation::Spiral => {
                install_spiral(scheduler, &scope, &dots);
                None
            }
        };
        Self {
            icon,
            animation,
            scheduler: scheduler.clone(),
            dots,
            fade,
            _scope: scope,
        }
    }

    pub fn icon(&self) -> Icon {
        self.icon
    }

    pub fn animation(&self) -> Animation {
        self.animation
    }

    /// Current colour of every dot at absolute time `now`.
    ///
    /// Fade colours are a pure function of time. Spiral colours reflect the
    /// callbacks the scheduler has run so far, so advance the scheduler to
    /// `now` first (the widget's paint path does this itself).
    pub fn dot_colors(&self, now: f64) -> [Color32; grid::DOT_COUNT] {
        match &self.fade {
            Some(plan) => std::array::from_fn(|index| {
                DOT_BASE.lerp_to_gamma(FADE_HIGHLIGHT, plan.level_at(index, now))
            }),
            None => *self.dots.borrow(),
        }
    }
}

/// Register the spiral cycle: a repeating timer that, on each tick,
/// schedules one delayed highlight per dot. Each highlight callback resets
/// all dots to base and then tints its own, so dots light up one after
/// another and the grid clears as the next cycle begins.
fn install_spiral(
    scheduler: &Scheduler,
    scope: &Scope,
    dots: &Rc<RefCell<[Color32; grid::DOT_COUNT]>>,
) {
    let scope_id = scope.id();
    let dots = Rc::clone(dots);
    scheduler.every(scope_id, SPIRAL_PERIOD, move |sched, _| {
        for (index, delay) in SPIRAL_DELAYS.iter().enumerate() {
            let dots = Rc::clone(&dots);
            sched.after(scope_id, *delay, move |_, _| {
                let mut dots = dots.borrow_mut();
                dots.fill(DOT_BASE);
                dots[index] = spiral_highlight();
            });
        }
    });
}

impl egui::Widget for &Spinner {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(Spinner::SIZE, Sense::hover());
        let now = ui.input(|i| i.time);
        self.scheduler.advance_to(now);

        if ui.is_rect_visible(rect) {
            let radius = grid::corner_radius(self.icon);
            let colors = self.dot_colors(now);
            let painter = ui.painter();
            for (index, color) in colors.iter().enumerate() {
                painter.rect_filled(grid::dot_rect(rect.min, index), radius, *color);
            }
        }

        // The animation never settles; keep frames coming.
        ui.ctx().request_repaint();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRAL_ORDER: [usize; 9] = [0, 1, 2, 5, 6, 3, 8, 7, 4];

    fn highlighted(colors: &[Color32; grid::DOT_COUNT]) -> Vec<usize> {
        colors
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != DOT_BASE)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_delay_table_encodes_spiral_order() {
        let mut order: Vec<usize> = (0..grid::DOT_COUNT).collect();
        order.sort_by(|a, b| SPIRAL_DELAYS[*a].total_cmp(&SPIRAL_DELAYS[*b]));
        assert_eq!(order, SPIRAL_ORDER);
    }

    #[test]
    fn test_spiral_highlights_one_dot_at_a_time_in_spiral_order() {
        let scheduler = Scheduler::new();
        let spinner = Spinner::with_seed(&scheduler, Icon::Square, Animation::Spiral, 0);

        // Before the first cycle fires, all dots rest at base.
        scheduler.advance_to(0.9);
        assert!(highlighted(&spinner.dot_colors(scheduler.now())).is_empty());

        let mut observed = Vec::new();
        for step in 1..=9 {
            scheduler.advance_to(1.0 + 0.1 * step as f64 + 0.05);
            let lit = highlighted(&spinner.dot_colors(scheduler.now()));
            assert_eq!(lit.len(), 1, "exactly one dot highlighted per step");
            observed.push(lit[0]);
        }
        assert_eq!(observed, SPIRAL_ORDER);
    }

    #[test]
    fn test_spiral_cycle_repeats() {
        let scheduler = Scheduler::new();
        let spinner = Spinner::with_seed(&scheduler, Icon::Circle, Animation::Spiral, 0);

        scheduler.advance_to(2.15);
        assert_eq!(highlighted(&spinner.dot_colors(scheduler.now())), vec![0]);
        scheduler.advance_to(3.15);
        assert_eq!(highlighted(&spinner.dot_colors(scheduler.now())), vec![0]);
    }

    #[test]
    fn test_fade_timings_stay_in_range() {
        for seed in 0..32 {
            let plan = FadePlan::seeded(seed, 0.0);
            for timing in &plan.dots {
                assert!((1.0..=1.5).contains(&timing.duration));
                assert!((0.5..=0.8).contains(&timing.delay));
            }
        }
    }

    #[test]
    fn test_fade_is_reproducible_for_a_seed() {
        let scheduler = Scheduler::new();
        let a = Spinner::with_seed(&scheduler, Icon::Circle, Animation::Fade, 7);
        let b = Spinner::with_seed(&scheduler, Icon::Circle, Animation::Fade, 7);
        assert_eq!(a.fade, b.fade);
        assert_eq!(a.dot_colors(1.3), b.dot_colors(1.3));
    }

    #[test]
    fn test_fade_holds_base_through_initial_delay() {
        let plan = FadePlan::seeded(3, 0.0);
        for index in 0..grid::DOT_COUNT {
            let delay = plan.dots[index].delay;
            assert_eq!(plan.level_at(index, delay * 0.5), 0.0);
            assert_eq!(plan.level_at(index, 0.0), 0.0);
        }
    }

    #[test]
    fn test_fade_repeats_with_mirrored_reverse() {
        let plan = FadePlan::seeded(11, 0.0);
        for index in 0..grid::DOT_COUNT {
            let FadeTiming { duration, delay } = plan.dots[index];
            for x in [0.1, 0.4, 0.9] {
                let rising = plan.level_at(index, delay + x * duration);
                let falling = plan.level_at(index, delay + (2.0 - x) * duration);
                assert!((rising - falling).abs() < 1e-5);
                // One full cycle later the curve is back where it was.
                let next_cycle = plan.level_at(index, delay + (2.0 + x) * duration);
                assert!((rising - next_cycle).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_fade_installs_no_scheduler_tasks() {
        let scheduler = Scheduler::new();
        let _spinner = Spinner::with_seed(&scheduler, Icon::Square, Animation::Fade, 0);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_teardown_cancels_spiral_cycle() {
        let scheduler = Scheduler::new();
        let spinner = Spinner::with_seed(&scheduler, Icon::Square, Animation::Spiral, 0);
        assert!(!scheduler.is_idle());

        // Mid-cycle: the timer has fired and queued per-dot highlights.
        scheduler.advance_to(1.15);
        drop(spinner);
        assert!(scheduler.is_idle());

        scheduler.advance_to(20.0);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_spinners_on_one_scheduler_are_independent() {
        let scheduler = Scheduler::new();
        let doomed = Spinner::with_seed(&scheduler, Icon::Square, Animation::Spiral, 0);
        let survivor = Spinner::with_seed(&scheduler, Icon::Circle, Animation::Spiral, 0);

        drop(doomed);
        assert!(!scheduler.is_idle());

        scheduler.advance_to(1.15);
        assert_eq!(highlighted(&survivor.dot_colors(scheduler.now())), vec![0]);
    }
}
