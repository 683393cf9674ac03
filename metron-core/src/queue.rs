//! Interrupt-safe event queue
//!
//! A fixed-capacity FIFO handing events from interrupt context to task
//! context. Every push and pop runs inside a critical section, so a shared
//! `&'static EventQueue` may be pushed from an interrupt handler while a
//! task pops it.
//!
//! When the queue is full, `push` fails and the *new* event is dropped
//! (drop-newest). Overflow is not an error condition: producers must
//! tolerate a lost event, e.g. a missed encoder tick.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::event::Event;

/// Queue capacity in events
pub const QUEUE_CAPACITY: usize = 32;

struct Fifo {
    slots: [Event; QUEUE_CAPACITY],
    /// Next write index
    head: usize,
    /// Next read index
    tail: usize,
    count: usize,
}

impl Fifo {
    const fn new() -> Self {
        Self {
            slots: [Event::empty(); QUEUE_CAPACITY],
            head: 0,
            tail: 0,
            count: 0,
        }
    }
}

/// Fixed-capacity FIFO of timestamped events
pub struct EventQueue {
    inner: Mutex<RefCell<Fifo>>,
}

impl EventQueue {
    /// Create an empty queue (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Fifo::new())),
        }
    }

    /// Enqueue an event
    ///
    /// Returns `false` when the queue is full; the event is lost. Callers
    /// must not retry within the same tick, nothing drains the queue
    /// faster.
    pub fn push(&self, event: Event) -> bool {
        critical_section::with(|cs| {
            let mut fifo = self.inner.borrow_ref_mut(cs);
            if fifo.count >= QUEUE_CAPACITY {
                return false;
            }
            let head = fifo.head;
            fifo.slots[head] = event;
            fifo.head = (head + 1) % QUEUE_CAPACITY;
            fifo.count += 1;
            true
        })
    }

    /// Dequeue the oldest event, strict FIFO
    pub fn pop(&self) -> Option<Event> {
        critical_section::with(|cs| {
            let mut fifo = self.inner.borrow_ref_mut(cs);
            if fifo.count == 0 {
                return None;
            }
            let event = fifo.slots[fifo.tail];
            fifo.tail = (fifo.tail + 1) % QUEUE_CAPACITY;
            fifo.count -= 1;
            Some(event)
        })
    }

    /// Check if the queue is empty
    ///
    /// Advisory: the answer may be stale by the time the caller acts on
    /// it. Use only for non-critical decisions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of queued events (advisory, see [`is_empty`](Self::is_empty))
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).count)
    }

    /// Drop all queued events
    ///
    /// Only for reinitialization; queued events are lost.
    pub fn clear(&self) {
        critical_section::with(|cs| {
            let mut fifo = self.inner.borrow_ref_mut(cs);
            fifo.head = 0;
            fifo.tail = 0;
            fifo.count = 0;
        });
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::event::EventKind;

    fn user_event(data: u32) -> Event {
        Event::new(EventKind::UserEvent, data, 0)
    }

    #[test]
    fn test_pop_empty() {
        let queue = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let queue = EventQueue::new();
        for i in 0..5 {
            assert!(queue.push(user_event(i)));
        }
        assert_eq!(queue.len(), 5);
        for i in 0..5 {
            assert_eq!(queue.pop(), Some(user_event(i)));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_overflow_drops_newest() {
        let queue = EventQueue::new();
        for i in 0..QUEUE_CAPACITY as u32 {
            assert!(queue.push(user_event(i)));
        }
        // Capacity + 1: exactly one failed push
        assert!(!queue.push(user_event(999)));
        assert_eq!(queue.len(), QUEUE_CAPACITY);

        // The earliest events survive; the newest was dropped
        for i in 0..QUEUE_CAPACITY as u32 {
            assert_eq!(queue.pop(), Some(user_event(i)));
        }
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_wraparound_indices() {
        let queue = EventQueue::new();
        // Drive head/tail past the capacity boundary several times
        for round in 0..3 {
            for i in 0..QUEUE_CAPACITY as u32 {
                assert!(queue.push(user_event(round * 100 + i)));
            }
            for i in 0..QUEUE_CAPACITY as u32 {
                assert_eq!(queue.pop(), Some(user_event(round * 100 + i)));
            }
        }
    }

    #[test]
    fn test_clear() {
        let queue = EventQueue::new();
        for i in 0..10 {
            queue.push(user_event(i));
        }
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
        // Still usable after reinitialization
        assert!(queue.push(user_event(1)));
        assert_eq!(queue.pop(), Some(user_event(1)));
    }

    proptest! {
        // FIFO law: pushing p1..pn (n <= capacity) then popping n times
        // yields p1..pn in order
        #[test]
        fn prop_fifo_law(payloads in prop::collection::vec(any::<u32>(), 0..=QUEUE_CAPACITY)) {
            let queue = EventQueue::new();
            for &p in &payloads {
                prop_assert!(queue.push(user_event(p)));
            }
            for &p in &payloads {
                prop_assert_eq!(queue.pop(), Some(user_event(p)));
            }
            prop_assert_eq!(queue.pop(), None);
        }

        // Interleaved push/pop never reorders and never exceeds capacity
        #[test]
        fn prop_interleaved_ops(ops in prop::collection::vec(any::<Option<u32>>(), 0..200)) {
            let queue = EventQueue::new();
            let mut model = std::collections::VecDeque::new();
            for op in ops {
                match op {
                    Some(p) => {
                        let pushed = queue.push(user_event(p));
                        if model.len() < QUEUE_CAPACITY {
                            prop_assert!(pushed);
                            model.push_back(p);
                        } else {
                            prop_assert!(!pushed);
                        }
                    }
                    None => {
                        prop_assert_eq!(queue.pop(), model.pop_front().map(user_event));
                    }
                }
                prop_assert_eq!(queue.len(), model.len());
            }
        }
    }
}
