//! Resumable task abstraction
//!
//! A task is a computation with exactly one saved resumption point, not a
//! full call-stack snapshot. Implementations keep the resumption point as
//! an explicit state enum and dispatch on it at the top of [`Task::resume`]
//! (stackful coroutines are deliberately not part of this model):
//!
//! ```
//! use metron_core::task::{Context, Task, TaskStatus};
//!
//! enum Phase {
//!     Armed,
//!     Draining,
//! }
//!
//! struct DrainTask {
//!     phase: Phase,
//! }
//!
//! impl Task for DrainTask {
//!     fn name(&self) -> &'static str {
//!         "drain"
//!     }
//!
//!     fn restart(&mut self) {
//!         self.phase = Phase::Armed;
//!     }
//!
//!     fn resume(&mut self, cx: &mut Context<'_>) -> TaskStatus {
//!         loop {
//!             match self.phase {
//!                 Phase::Armed => {
//!                     // one-shot side effects go before the phase change,
//!                     // so a still-false wait never repeats them
//!                     self.phase = Phase::Draining;
//!                 }
//!                 Phase::Draining => {
//!                     return match cx.events().pop() {
//!                         Some(_) => TaskStatus::Yielded,
//!                         None => TaskStatus::Waiting,
//!                     };
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! Suspension must be idempotent: resuming a task whose wait predicate is
//! still false returns immediately without re-running side effects already
//! performed earlier in the pass. A task body that loops forever must
//! suspend at least once per iteration, or it starves every other task -
//! that is a correctness requirement of the cooperative model, not a
//! performance concern.

use crate::event::{Event, EventKind};
use crate::queue::EventQueue;
use crate::time::Interval;

/// Result of driving a task one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskStatus {
    /// Suspended on a wait predicate that is still false
    Waiting,
    /// Voluntarily gave up the rest of this tick
    Yielded,
    /// Stopped itself before its natural end
    Exited,
    /// Ran off the end of its body
    Ended,
}

impl TaskStatus {
    /// Check if the task is permanently done
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Exited | TaskStatus::Ended)
    }
}

/// Per-tick execution context handed to every resume
///
/// Carries the scheduler's shared event queue and the tick timestamp,
/// sampled once at the start of the pass. Binding the queue through the
/// context (rather than storing a pointer per task) is what guarantees a
/// task only touches the queue while it is being resumed.
pub struct Context<'q> {
    events: &'q EventQueue,
    now_us: u32,
    tick: u32,
}

impl<'q> Context<'q> {
    pub(crate) fn new(events: &'q EventQueue, now_us: u32, tick: u32) -> Self {
        Self {
            events,
            now_us,
            tick,
        }
    }

    /// The shared event queue
    pub fn events(&self) -> &'q EventQueue {
        self.events
    }

    /// Timestamp of this pass in µs (wrapping timebase)
    pub fn now_us(&self) -> u32 {
        self.now_us
    }

    /// Scheduler pass counter
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Post an event to the shared queue, stamped with the tick timestamp
    ///
    /// Returns `false` when the queue is full and the event was dropped.
    pub fn post(&self, kind: EventKind, data: u32) -> bool {
        self.events.push(Event::new(kind, data, self.now_us))
    }
}

/// A unit of cooperative work driven by the scheduler
pub trait Task {
    /// Task name for diagnostics
    fn name(&self) -> &'static str;

    /// Reset the resumption point back to the task entry
    fn restart(&mut self) {}

    /// Execute from the saved resumption point to the next suspension
    ///
    /// Runs until the task hits a wait predicate or explicit yield
    /// (returning [`TaskStatus::Waiting`] / [`TaskStatus::Yielded`] with
    /// the resumption point saved exactly there), stops itself
    /// ([`TaskStatus::Exited`]), or runs off its natural end
    /// ([`TaskStatus::Ended`]). The scheduler resumes a task at most once
    /// per tick and never concurrently with itself.
    fn resume(&mut self, cx: &mut Context<'_>) -> TaskStatus;
}

/// Periodic tick task
///
/// Posts a `TimerTick` event at a fixed period, carrying the number of
/// ticks fired so far. A ready-made coarse clock source for tasks that
/// only need a periodic wake-up through the event queue.
pub struct TickerTask {
    interval: Interval,
    count: u32,
}

impl TickerTask {
    /// Create a ticker with the given period
    pub const fn new(period_us: u32) -> Self {
        Self {
            interval: Interval::new(period_us),
            count: 0,
        }
    }

    /// Ticks fired since creation or restart
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Task for TickerTask {
    fn name(&self) -> &'static str {
        "ticker"
    }

    fn restart(&mut self) {
        self.count = 0;
    }

    fn resume(&mut self, cx: &mut Context<'_>) -> TaskStatus {
        if self.interval.poll(cx.now_us()) {
            self.count = self.count.wrapping_add(1);
            cx.post(EventKind::TimerTick, self.count);
            TaskStatus::Yielded
        } else {
            TaskStatus::Waiting
        }
    }
}
