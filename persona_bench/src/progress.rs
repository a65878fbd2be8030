//! Cosmetic evaluation progress and the timer that drives it.
//!
//! The percentage carries no information about the server's real progress.
//! It creeps towards a ceiling while a request is outstanding and snaps to
//! 100 % (or back to 0 %) when the request settles.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::DashboardConfig;

#[derive(Clone, Debug)]
pub struct CosmeticProgress {
    percent: f64,
    start_pct: f64,
    ceiling_pct: f64,
    max_step_pct: f64,
    rng: SmallRng,
}

impl CosmeticProgress {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            percent: 0.0,
            start_pct: config.progress_start_pct,
            ceiling_pct: config.progress_ceiling_pct,
            max_step_pct: config.progress_max_step_pct,
            rng: SmallRng::seed_from_u64(config.progress_seed),
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn start(&mut self) {
        self.percent = self.start_pct;
    }

    /// Advance by a random step in `[0, max_step)`, always staying below the ceiling.
    pub fn tick(&mut self) {
        let jitter: f64 = self.rng.gen();
        self.advance(jitter);
    }

    /// Advance by `jitter * max_step`; `jitter` is clamped to `[0, 1]`.
    /// A step that would reach the ceiling is dropped.
    pub fn advance(&mut self, jitter: f64) {
        let step = jitter.clamp(0.0, 1.0) * self.max_step_pct;
        let next = self.percent + step;
        if next < self.ceiling_pct {
            self.percent = next;
        }
    }

    pub fn complete(&mut self) {
        self.percent = 100.0;
    }

    pub fn reset(&mut self) {
        self.percent = 0.0;
    }
}

impl PartialEq for CosmeticProgress {
    fn eq(&self, other: &Self) -> bool {
        self.percent == other.percent
    }
}

/// A running periodic task that can be cancelled.
pub trait TimerHandle {
    fn cancel(self);
}

/// Starts periodic tasks on the host's event loop.
pub trait IntervalScheduler {
    type Handle: TimerHandle;

    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Self::Handle;
}

/// Owns the progress ticker for one evaluation attempt.
///
/// The ticker is cancelled exactly once: by [`ProgressTimer::stop`] on the
/// normal paths, or by `Drop` if the attempt is abandoned mid-flight.
pub struct ProgressTimer<H: TimerHandle> {
    handle: Option<H>,
}

impl<H: TimerHandle> ProgressTimer<H> {
    pub fn start<S>(scheduler: &S, period_ms: u32, tick: Box<dyn FnMut()>) -> Self
    where
        S: IntervalScheduler<Handle = H> + ?Sized,
    {
        Self {
            handle: Some(scheduler.every(period_ms, tick)),
        }
    }

    pub fn stop(mut self) {
        self.cancel_once();
    }

    fn cancel_once(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }
}

impl<H: TimerHandle> Drop for ProgressTimer<H> {
    fn drop(&mut self) {
        self.cancel_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingHandle(Rc<Cell<u32>>);

    impl TimerHandle for CountingHandle {
        fn cancel(self) {
            self.0.set(self.0.get() + 1);
        }
    }

    struct CountingScheduler(Rc<Cell<u32>>);

    impl IntervalScheduler for CountingScheduler {
        type Handle = CountingHandle;

        fn every(&self, _period_ms: u32, _tick: Box<dyn FnMut()>) -> CountingHandle {
            CountingHandle(self.0.clone())
        }
    }

    #[test]
    fn ticks_stay_below_ceiling() {
        let mut progress = CosmeticProgress::new(&DashboardConfig::default());
        progress.start();
        assert_eq!(progress.percent(), 10.0);
        for _ in 0..1_000 {
            progress.tick();
            assert!(progress.percent() < 90.0);
        }
        assert!(progress.percent() > 85.0);
        let before = progress.percent();
        progress.advance(1.0);
        assert_eq!(progress.percent(), before);
        progress.complete();
        assert_eq!(progress.percent(), 100.0);
        progress.reset();
        assert_eq!(progress.percent(), 0.0);
    }

    #[test]
    fn steps_that_would_reach_the_ceiling_are_dropped() {
        let mut progress = CosmeticProgress::new(&DashboardConfig::default());
        progress.start();
        progress.advance(1.0);
        assert_eq!(progress.percent(), 15.0);
        for _ in 0..15 {
            progress.advance(1.0);
        }
        assert_eq!(progress.percent(), 85.0);
        progress.advance(1.0);
        assert_eq!(progress.percent(), 85.0);
        progress.advance(0.5);
        assert_eq!(progress.percent(), 87.5);
    }

    #[test]
    fn stop_cancels_once() {
        let cancels = Rc::new(Cell::new(0));
        let scheduler = CountingScheduler(cancels.clone());
        let timer = ProgressTimer::start(&scheduler, 500, Box::new(|| {}));
        timer.stop();
        assert_eq!(cancels.get(), 1);
    }

    #[test]
    fn drop_cancels_once() {
        let cancels = Rc::new(Cell::new(0));
        let scheduler = CountingScheduler(cancels.clone());
        {
            let _timer = ProgressTimer::start(&scheduler, 500, Box::new(|| {}));
        }
        assert_eq!(cancels.get(), 1);
    }
}
