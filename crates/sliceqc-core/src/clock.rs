//! Wall-clock source for record timestamps.
//!
//! Timestamps are local time at whole-second precision. The backing file
//! stores them without an offset, matching what a reviewer sees on their
//! own machine.

use std::cell::Cell;

use chrono::{Local, NaiveDateTime, SubsecRound as _};

/// A source of record timestamps.
pub trait Clock {
  /// The current time, truncated to whole seconds. Successive calls never
  /// go backwards.
  fn now(&self) -> NaiveDateTime;
}

/// Local system time, clamped so it never runs backwards within a process.
#[derive(Debug, Default)]
pub struct SystemClock {
  last: Cell<Option<NaiveDateTime>>,
}

impl SystemClock {
  pub fn new() -> Self { Self::default() }
}

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime {
    let now = Local::now().naive_local().trunc_subsecs(0);
    let now = match self.last.get() {
      Some(last) if last > now => last,
      _ => now,
    };
    self.last.set(Some(now));
    now
  }
}

/// A clock that only moves when told to. Used in tests.
#[derive(Debug)]
pub struct ManualClock {
  now: Cell<NaiveDateTime>,
}

impl ManualClock {
  pub fn new(start: NaiveDateTime) -> Self {
    Self { now: Cell::new(start.trunc_subsecs(0)) }
  }

  /// Move the clock forward by `secs` seconds.
  pub fn advance(&self, secs: i64) {
    self.now.set(self.now.get() + chrono::Duration::seconds(secs));
  }
}

impl Clock for ManualClock {
  fn now(&self) -> NaiveDateTime { self.now.get() }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
  fn now(&self) -> NaiveDateTime { (**self).now() }
}
