//! Round-robin cooperative scheduler
//!
//! Owns a bounded, ordered set of tasks and drives each to its next
//! suspension point once per tick. Task order is registration order and
//! doubles as polling priority; within one tick an event pushed by an
//! earlier task is visible to a later task's resume.
//!
//! Tasks are registered as exclusive borrows, so a task cannot be added
//! twice and cannot be resumed concurrently with itself; registration
//! hands back an opaque [`TaskId`] for later removal or cancellation.

use heapless::Vec;
use metron_hal::MonotonicClock;

use crate::event::{Event, EventKind};
use crate::queue::EventQueue;
use crate::task::{Context, Task};

/// Maximum number of registered tasks
pub const MAX_TASKS: usize = 16;

/// Handle identifying a registered task
///
/// Stays valid until the task is removed or ends; a stale id simply
/// stops matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(u32);

/// Scheduler-side bookkeeping for one registered task
struct Slot<'t> {
    task: &'t mut dyn Task,
    id: TaskId,
    /// Cleared by [`Scheduler::stop_task`]; consulted at the tick boundary
    active: bool,
    run_count: u32,
    last_run_us: u32,
}

/// Cooperative round-robin scheduler
///
/// The shared event queue is handed to every resume through [`Context`];
/// that is the binding between tasks and the queue, there is no stored
/// per-task pointer.
pub struct Scheduler<'a, C> {
    slots: Vec<Slot<'a>, MAX_TASKS>,
    events: &'a EventQueue,
    clock: C,
    next_id: u32,
    ticks: u32,
    running: bool,
}

impl<'a, C: MonotonicClock> Scheduler<'a, C> {
    /// Create a scheduler around a shared event queue and a timebase
    pub fn new(events: &'a EventQueue, clock: C) -> Self {
        Self {
            slots: Vec::new(),
            events,
            clock,
            next_id: 0,
            ticks: 0,
            running: false,
        }
    }

    /// Register a task at the end of the polling order
    ///
    /// Returns `None` when all [`MAX_TASKS`] slots are taken; typically a
    /// startup-time configuration error.
    pub fn add_task(&mut self, task: &'a mut dyn Task) -> Option<TaskId> {
        if self.slots.is_full() {
            return None;
        }
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.slots.push(Slot {
            task,
            id,
            active: true,
            run_count: 0,
            last_run_us: 0,
        });
        Some(id)
    }

    /// Remove a task, compacting the polling order around the survivors
    ///
    /// Returns `false` when the id no longer matches; safely ignorable.
    pub fn remove_task(&mut self, id: TaskId) -> bool {
        match self.slots.iter().position(|s| s.id == id) {
            Some(i) => {
                self.slots.remove(i);
                true
            }
            None => false,
        }
    }

    /// Request cooperative cancellation of a task
    ///
    /// Only marks the task inactive; the flag is consulted at the next
    /// tick boundary, so a task mid-resume always completes to its next
    /// suspension point. Returns `false` when the id no longer matches.
    pub fn stop_task(&mut self, id: TaskId) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                slot.active = false;
                true
            }
            None => false,
        }
    }

    /// Run one tick over the active task set
    ///
    /// Resumes every active task once, in registration order. A task
    /// returning a terminal status is removed within the same pass without
    /// skipping the task after it; a task stopped since the last tick is
    /// removed without a final resume.
    pub fn run_once(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        let now = self.clock.now_us();
        let events = self.events;
        let tick = self.ticks;

        let mut i = 0;
        while i < self.slots.len() {
            if !self.slots[i].active {
                self.slots.remove(i);
                continue;
            }

            let slot = &mut self.slots[i];
            slot.last_run_us = now;
            let mut cx = Context::new(events, now, tick);
            let status = slot.task.resume(&mut cx);
            slot.run_count = slot.run_count.wrapping_add(1);

            if status.is_terminal() {
                self.slots.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Run ticks until [`stop`](Self::stop) or the task set empties
    ///
    /// `idle` is invoked between ticks as a platform idle hint (WFI, a
    /// busy-loop nop, a test counter); it is not required for correctness.
    pub fn run(&mut self, mut idle: impl FnMut()) {
        self.running = true;
        while self.running && !self.slots.is_empty() {
            self.run_once();
            idle();
        }
    }

    /// Stop the [`run`](Self::run) loop after the current tick
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Post an event to the shared queue, stamped with the current time
    ///
    /// Returns `false` when the queue is full and the event was dropped.
    pub fn post_event(&self, kind: EventKind, data: u32) -> bool {
        self.events
            .push(Event::new(kind, data, self.clock.now_us()))
    }

    /// The shared event queue
    pub fn events(&self) -> &'a EventQueue {
        self.events
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.slots.len()
    }

    /// Completed scheduler passes
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Resume count of a registered task, for diagnostics
    pub fn run_count(&self, id: TaskId) -> Option<u32> {
        self.slots.iter().find(|s| s.id == id).map(|s| s.run_count)
    }

    /// Timestamp of a registered task's last resume, for diagnostics
    pub fn last_run_us(&self, id: TaskId) -> Option<u32> {
        self.slots.iter().find(|s| s.id == id).map(|s| s.last_run_us)
    }

    /// Name of a registered task, for diagnostics
    pub fn task_name(&self, id: TaskId) -> Option<&'static str> {
        self.slots.iter().find(|s| s.id == id).map(|s| s.task.name())
    }
}
