//! Debounced switches and buttons
//!
//! Mechanical contacts bounce for a few milliseconds on every actuation.
//! The debounce rule here is a refractory window: a new logical state is
//! accepted only when enough time has passed since the last *accepted*
//! change. Transitions inside the window are discarded entirely, never
//! queued for later.

use metron_core::event::{Event, EventKind};
use metron_core::queue::EventQueue;
use metron_core::time::elapsed_us;

/// Default debounce window
pub const DEFAULT_DEBOUNCE_US: u32 = 50_000;

/// Switch wiring and debounce configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchConfig {
    /// Pin reads low when the switch is actuated (pull-up wiring)
    pub active_low: bool,
    /// Minimum time between accepted transitions
    pub debounce_us: u32,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            active_low: true,
            debounce_us: DEFAULT_DEBOUNCE_US,
        }
    }
}

/// Debounced switch state machine
pub struct DebouncedSwitch<'q> {
    id: u8,
    config: SwitchConfig,
    pressed: bool,
    last_change_us: u32,
    queue: Option<&'q EventQueue>,
}

impl<'q> DebouncedSwitch<'q> {
    /// Create a released switch
    ///
    /// The debounce window starts at time 0, so a transition in the first
    /// window after power-up is treated as bounce.
    pub fn new(id: u8, config: SwitchConfig) -> Self {
        Self {
            id,
            config,
            pressed: false,
            last_change_us: 0,
            queue: None,
        }
    }

    /// Bind the event queue that receives Press/Release events
    pub fn bind_queue(&mut self, queue: &'q EventQueue) {
        self.queue = Some(queue);
    }

    /// Feed one raw pin sample
    pub fn sample(&mut self, raw: bool, now_us: u32) {
        let pressed = if self.config.active_low { !raw } else { raw };
        if pressed == self.pressed {
            return;
        }
        if elapsed_us(now_us, self.last_change_us) <= self.config.debounce_us {
            // Inside the window: bounce, discard
            return;
        }
        self.pressed = pressed;
        self.last_change_us = now_us;
        let kind = if pressed {
            EventKind::ButtonPress
        } else {
            EventKind::ButtonRelease
        };
        if let Some(queue) = self.queue {
            let _ = queue.push(Event::new(kind, self.id as u32, now_us));
        }
    }

    /// Instance id carried in events
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Current debounced state
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Timestamp of the last accepted transition
    pub fn last_change_us(&self) -> u32 {
        self.last_change_us
    }
}
