//! Clock and sleep behind a trait so sweeps can be driven without waiting
//! on the wall clock.

use std::cell::RefCell;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};

pub trait Pacer {
    fn now(&self) -> DateTime<Local>;
    fn pause(&self, duration: Duration);
}

impl<T: Pacer + ?Sized> Pacer for &T {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }

    fn pause(&self, duration: Duration) {
        (**self).pause(duration)
    }
}

/// Wall clock and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPacer;

impl Pacer for SystemPacer {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Virtual clock that advances by the requested pause instead of sleeping,
/// and ticks one second per `now()` call so generated timestamps never
/// collide.
#[derive(Debug)]
pub struct ManualPacer {
    clock: RefCell<DateTime<Local>>,
    pauses: RefCell<Vec<Duration>>,
}

impl ManualPacer {
    pub fn starting_at(start: DateTime<Local>) -> Self {
        Self {
            clock: RefCell::new(start),
            pauses: RefCell::new(Vec::new()),
        }
    }

    /// Every pause requested so far, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }
}

impl Pacer for ManualPacer {
    fn now(&self) -> DateTime<Local> {
        let mut clock = self.clock.borrow_mut();
        let current = *clock;
        *clock = current + chrono::Duration::seconds(1);
        current
    }

    fn pause(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
        if let Ok(step) = chrono::Duration::from_std(duration) {
            let mut clock = self.clock.borrow_mut();
            *clock = *clock + step;
        }
    }
}
