//! Events handed from interrupt context to task context
//!
//! The taxonomy is closed: input state machines and the sequencer engine
//! produce these kinds and nothing else. Tasks consume them from the shared
//! [`EventQueue`](crate::queue::EventQueue).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventKind {
    /// Empty slot marker; never delivered by a successful pop
    None,
    /// Encoder moved; `data` is the new absolute position (`i32` as `u32`)
    EncoderTurn,
    /// Button or encoder switch pressed; `data` is the instance id
    ButtonPress,
    /// Button or encoder switch released; `data` is the instance id
    ButtonRelease,
    /// Gate input went active; `data` is the instance id
    GateRising,
    /// Gate input went inactive; `data` is the instance id
    GateFalling,
    /// Periodic tick posted by a timer task; `data` is caller-defined
    TimerTick,
    /// CV input moved past the hysteresis threshold; `data` is the channel
    CvChange,
    /// Sequencer advanced; `data` is the new step index
    SequenceStep,
    /// Application-defined event posted through the scheduler
    UserEvent,
}

impl EventKind {
    /// Check if this kind is produced by an input state machine
    pub fn is_input(self) -> bool {
        matches!(
            self,
            EventKind::EncoderTurn
                | EventKind::ButtonPress
                | EventKind::ButtonRelease
                | EventKind::GateRising
                | EventKind::GateFalling
                | EventKind::CvChange
        )
    }

    /// Check if this kind is a gate edge
    pub fn is_gate_edge(self) -> bool {
        matches!(self, EventKind::GateRising | EventKind::GateFalling)
    }
}

/// A timestamped event record
///
/// Immutable once created; the timestamp is fixed at construction. The
/// queue owns an event until exactly one consumer pops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    /// What happened
    pub kind: EventKind,
    /// Event-specific payload (position, instance id, step index, ...)
    pub data: u32,
    /// Time of occurrence in µs (wrapping timebase)
    pub timestamp: u32,
}

impl Event {
    /// Create an event stamped with the given time
    pub const fn new(kind: EventKind, data: u32, timestamp: u32) -> Self {
        Self {
            kind,
            data,
            timestamp,
        }
    }

    /// Empty slot value used to initialize queue storage
    pub const fn empty() -> Self {
        Self {
            kind: EventKind::None,
            data: 0,
            timestamp: 0,
        }
    }

    /// Decode the absolute encoder position carried by an `EncoderTurn`
    pub fn encoder_position(&self) -> Option<i32> {
        match self.kind {
            EventKind::EncoderTurn => Some(self.data as i32),
            _ => None,
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::empty()
    }
}
