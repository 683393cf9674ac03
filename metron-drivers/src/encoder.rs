//! Rotary encoder decoding
//!
//! Decodes quadrature signals into an absolute position and emits
//! `EncoderTurn` events carrying it; consumers derive deltas themselves.
//! An optional push-switch on the encoder shaft reports independently as
//! `ButtonPress`/`ButtonRelease` with the decoder's instance id.

use metron_core::event::{Event, EventKind};
use metron_core::queue::EventQueue;

/// Quadrature decoder with optional push-switch
///
/// Direction comes from the relative phase of the two channels: when A
/// transitions, A == B means one detent forward, A != B one detent
/// backward. A simultaneous glitch on both channels decodes as a forward
/// step instead of faulting; panel encoders are too slow for it to happen
/// outside of noise.
pub struct QuadratureDecoder<'q> {
    id: u8,
    position: i32,
    last_a: bool,
    pressed: bool,
    last_change_us: u32,
    queue: Option<&'q EventQueue>,
}

impl<'q> QuadratureDecoder<'q> {
    /// Create a decoder at position 0
    ///
    /// Both channels are assumed idle-low until [`prime`](Self::prime) is
    /// called with the real levels; without priming, the first sample
    /// against a pulled-up channel reads as a transition.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            position: 0,
            last_a: false,
            pressed: false,
            last_change_us: 0,
            queue: None,
        }
    }

    /// Bind the event queue that receives this decoder's events
    pub fn bind_queue(&mut self, queue: &'q EventQueue) {
        self.queue = Some(queue);
    }

    /// Record the idle channel-A level without emitting
    pub fn prime(&mut self, a: bool) {
        self.last_a = a;
    }

    /// Feed one sample of both channels
    pub fn sample(&mut self, a: bool, b: bool, now_us: u32) {
        if a != self.last_a {
            if a == b {
                self.position = self.position.wrapping_add(1);
            } else {
                self.position = self.position.wrapping_sub(1);
            }
            self.last_change_us = now_us;
            self.emit(EventKind::EncoderTurn, self.position as u32, now_us);
        }
        self.last_a = a;
    }

    /// Feed one sample of the push-switch (active-low, no debounce)
    pub fn sample_button(&mut self, raw: bool, now_us: u32) {
        let pressed = !raw;
        if pressed != self.pressed {
            self.pressed = pressed;
            self.last_change_us = now_us;
            let kind = if pressed {
                EventKind::ButtonPress
            } else {
                EventKind::ButtonRelease
            };
            self.emit(kind, self.id as u32, now_us);
        }
    }

    /// Instance id carried in button events
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Current absolute position
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Overwrite the position (e.g. re-centering a parameter)
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    /// Current push-switch state
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Timestamp of the last position or switch change
    pub fn last_change_us(&self) -> u32 {
        self.last_change_us
    }

    fn emit(&self, kind: EventKind, data: u32, now_us: u32) {
        if let Some(queue) = self.queue {
            let _ = queue.push(Event::new(kind, data, now_us));
        }
    }
}
