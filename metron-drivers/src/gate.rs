//! Gate input timing and timed gate output
//!
//! Gate jacks carry clean logic-level edges from other modules, so the
//! input side tracks every polarity change without debounce and measures
//! pulse widths. The output side produces fire-and-forget timed pulses
//! from polled updates; there is no dedicated timer interrupt.

use metron_core::event::{Event, EventKind};
use metron_core::queue::EventQueue;
use metron_core::time::elapsed_us;
use metron_hal::DigitalIo;

/// Default output pulse width
pub const DEFAULT_GATE_DURATION_US: u32 = 10_000;

/// Gate input edge tracker
///
/// Emits `GateRising`/`GateFalling` on every polarity change and stores
/// the duration between a rising edge and the following falling edge.
pub struct EdgeTimer<'q> {
    id: u8,
    active_high: bool,
    active: bool,
    last_edge_us: u32,
    pulse_width_us: u32,
    queue: Option<&'q EventQueue>,
}

impl<'q> EdgeTimer<'q> {
    /// Create an idle gate input
    pub fn new(id: u8, active_high: bool) -> Self {
        Self {
            id,
            active_high,
            active: false,
            last_edge_us: 0,
            pulse_width_us: 0,
            queue: None,
        }
    }

    /// Bind the event queue that receives edge events
    pub fn bind_queue(&mut self, queue: &'q EventQueue) {
        self.queue = Some(queue);
    }

    /// Feed one raw pin sample
    pub fn sample(&mut self, raw: bool, now_us: u32) {
        let active = if self.active_high { raw } else { !raw };
        if active == self.active {
            return;
        }
        if self.active {
            // Falling edge closes the pulse opened by the rising edge
            self.pulse_width_us = elapsed_us(now_us, self.last_edge_us);
        }
        self.active = active;
        self.last_edge_us = now_us;
        let kind = if active {
            EventKind::GateRising
        } else {
            EventKind::GateFalling
        };
        if let Some(queue) = self.queue {
            let _ = queue.push(Event::new(kind, self.id as u32, now_us));
        }
    }

    /// Instance id carried in events
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Current logical gate state
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Width of the last completed pulse
    pub fn pulse_width_us(&self) -> u32 {
        self.pulse_width_us
    }

    /// Timestamp of the last edge
    pub fn last_edge_us(&self) -> u32 {
        self.last_edge_us
    }
}

/// Timed gate output
///
/// `trigger` drives the line active and starts the pulse clock; a polled
/// `update` drives it back inactive once the configured duration elapses.
/// A duration of 0 holds the gate until [`set_low`](Self::set_low).
pub struct TimedGate {
    pin: u8,
    active_high: bool,
    active: bool,
    start_us: u32,
    duration_us: u32,
}

impl TimedGate {
    /// Create an inactive gate output on a pin
    ///
    /// The caller drives the line to its inactive level when configuring
    /// the pin; the gate assumes it starts inactive.
    pub fn new(pin: u8, active_high: bool, duration_us: u32) -> Self {
        Self {
            pin,
            active_high,
            active: false,
            start_us: 0,
            duration_us,
        }
    }

    /// Fire one timed pulse starting now
    pub fn trigger(&mut self, io: &mut impl DigitalIo, now_us: u32) {
        self.active = true;
        self.start_us = now_us;
        io.digital_write(self.pin, self.active_high);
    }

    /// Poll the pulse clock; call once per scheduler tick
    pub fn update(&mut self, io: &mut impl DigitalIo, now_us: u32) {
        if self.active
            && self.duration_us > 0
            && elapsed_us(now_us, self.start_us) >= self.duration_us
        {
            self.set_low(io);
        }
    }

    /// Hold the gate active without a pulse clock
    pub fn set_high(&mut self, io: &mut impl DigitalIo) {
        self.active = true;
        io.digital_write(self.pin, self.active_high);
    }

    /// Drive the gate inactive immediately
    pub fn set_low(&mut self, io: &mut impl DigitalIo) {
        self.active = false;
        io.digital_write(self.pin, !self.active_high);
    }

    /// Current logical output state
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Configured pulse width
    pub fn duration_us(&self) -> u32 {
        self.duration_us
    }

    /// Change the pulse width for subsequent triggers
    pub fn set_duration_us(&mut self, duration_us: u32) {
        self.duration_us = duration_us;
    }
}

#[cfg(test)]
mod tests {
    use metron_hal::{PinDirection, Pull};

    use super::*;

    struct MockIo {
        levels: [bool; 32],
    }

    impl MockIo {
        fn new() -> Self {
            Self {
                levels: [false; 32],
            }
        }
    }

    impl DigitalIo for MockIo {
        fn configure_pin(&mut self, _pin: u8, _dir: PinDirection, _pull: Pull) {}

        fn digital_read(&self, pin: u8) -> bool {
            self.levels[pin as usize]
        }

        fn digital_write(&mut self, pin: u8, level: bool) {
            self.levels[pin as usize] = level;
        }
    }

    #[test]
    fn test_edges_emit_events() {
        let queue = EventQueue::new();
        let mut gate = EdgeTimer::new(0, true);
        gate.bind_queue(&queue);

        gate.sample(true, 1_000);
        assert!(gate.is_active());
        let rising = queue.pop().unwrap();
        assert_eq!(rising.kind, EventKind::GateRising);
        assert_eq!(rising.timestamp, 1_000);

        gate.sample(false, 9_000);
        assert!(!gate.is_active());
        assert_eq!(queue.pop().unwrap().kind, EventKind::GateFalling);
        assert_eq!(gate.pulse_width_us(), 8_000);
    }

    #[test]
    fn test_steady_level_is_silent() {
        let queue = EventQueue::new();
        let mut gate = EdgeTimer::new(0, true);
        gate.bind_queue(&queue);

        gate.sample(false, 0);
        gate.sample(true, 100);
        gate.sample(true, 200);
        gate.sample(true, 300);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pulse_width_across_clock_wrap() {
        let mut gate = EdgeTimer::new(0, true);
        // Rising just before the 32-bit wrap, falling just after
        gate.sample(true, 0xFFFF_FFF0);
        gate.sample(false, 0x10);
        assert_eq!(gate.pulse_width_us(), 0x20);
    }

    #[test]
    fn test_active_low_gate_input() {
        let queue = EventQueue::new();
        let mut gate = EdgeTimer::new(1, false);
        gate.bind_queue(&queue);

        // Line pulled low = active for inverted jacks
        gate.sample(false, 0);
        assert!(!gate.is_active());
        gate.sample(true, 100);
        assert!(!gate.is_active()); // high = inactive
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_timed_pulse() {
        let mut io = MockIo::new();
        let mut gate = TimedGate::new(8, true, DEFAULT_GATE_DURATION_US);

        gate.trigger(&mut io, 1_000);
        assert!(gate.is_active());
        assert!(io.digital_read(8));

        // Inside the pulse window: still high
        gate.update(&mut io, 5_000);
        assert!(gate.is_active());
        assert!(io.digital_read(8));

        // Past the window: driven low
        gate.update(&mut io, 11_000);
        assert!(!gate.is_active());
        assert!(!io.digital_read(8));
    }

    #[test]
    fn test_timed_pulse_across_clock_wrap() {
        let mut io = MockIo::new();
        let mut gate = TimedGate::new(8, true, 0x40);

        gate.trigger(&mut io, 0xFFFF_FFF0);
        gate.update(&mut io, 0x10);
        assert!(gate.is_active());
        gate.update(&mut io, 0x30);
        assert!(!gate.is_active());
    }

    #[test]
    fn test_zero_duration_holds_until_released() {
        let mut io = MockIo::new();
        let mut gate = TimedGate::new(2, true, 0);

        gate.trigger(&mut io, 0);
        gate.update(&mut io, 1_000_000);
        assert!(gate.is_active());

        gate.set_low(&mut io);
        assert!(!gate.is_active());
        assert!(!io.digital_read(2));
    }

    #[test]
    fn test_active_low_output_polarity() {
        let mut io = MockIo::new();
        // Line idles high for active-low outputs
        io.digital_write(4, true);
        let mut gate = TimedGate::new(4, false, 100);

        gate.trigger(&mut io, 0);
        assert!(!io.digital_read(4)); // active = driven low

        gate.update(&mut io, 100);
        assert!(io.digital_read(4)); // released = back high
    }

    #[test]
    fn test_retrigger_restarts_pulse() {
        let mut io = MockIo::new();
        let mut gate = TimedGate::new(8, true, 10_000);

        gate.trigger(&mut io, 0);
        gate.update(&mut io, 8_000);
        assert!(gate.is_active());

        // Retrigger inside the pulse extends it
        gate.trigger(&mut io, 9_000);
        gate.update(&mut io, 15_000);
        assert!(gate.is_active());
        gate.update(&mut io, 19_000);
        assert!(!gate.is_active());
    }
}
