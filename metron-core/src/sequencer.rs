//! Sequencer engine
//!
//! Pattern storage and transport for the step sequencer, kept free of
//! hardware so the composing firmware owns one `Sequencer` and passes it
//! into its tasks. The engine never touches outputs directly: advancing a
//! step returns a [`StepCommand`] describing what the firmware must apply
//! to its CV and gate outputs, and posts a `SequenceStep` event for any
//! task that wants to observe the transport.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cv::note_volts;
use crate::event::{Event, EventKind};
use crate::queue::EventQueue;
use crate::time::elapsed_us;

/// Maximum steps in a pattern
pub const MAX_STEPS: usize = 16;

/// Slowest supported tempo (BPM × 10)
pub const TEMPO_MIN_BPM_X10: u16 = 600;

/// Fastest supported tempo (BPM × 10)
pub const TEMPO_MAX_BPM_X10: u16 = 2000;

const DEFAULT_TEMPO_BPM_X10: u16 = 1200;

/// Step voltages for one sequence
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pattern {
    volts: [f32; MAX_STEPS],
    length: u8,
}

impl Pattern {
    /// All-zero pattern of the given length (clamped to 1..=16)
    pub fn new(length: u8) -> Self {
        let mut pattern = Self {
            volts: [0.0; MAX_STEPS],
            length: 1,
        };
        pattern.set_length(length);
        pattern
    }

    /// Ascending chromatic pattern, one semitone per step at 1 V/octave
    pub fn chromatic(length: u8) -> Self {
        let mut pattern = Self::new(length);
        for (i, v) in pattern.volts.iter_mut().enumerate() {
            *v = note_volts(i as u8);
        }
        pattern
    }

    /// Active length in steps
    pub fn length(&self) -> u8 {
        self.length
    }

    /// Set the active length, clamped to 1..=16
    pub fn set_length(&mut self, length: u8) {
        self.length = length.clamp(1, MAX_STEPS as u8);
    }

    /// Voltage of a step (indexed modulo the active length)
    pub fn step_volts(&self, step: u8) -> f32 {
        self.volts[(step % self.length) as usize]
    }

    /// Write a step voltage; steps beyond [`MAX_STEPS`] are ignored
    pub fn set_step_volts(&mut self, step: u8, volts: f32) {
        if let Some(slot) = self.volts.get_mut(step as usize) {
            *slot = volts;
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::chromatic(8)
    }
}

/// What the firmware must apply to its outputs for one step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepCommand {
    /// The step just entered
    pub step: u8,
    /// Pitch CV for the step
    pub volts: f32,
    /// Fire the gate output for this step
    pub trigger_gate: bool,
}

/// Step sequencer transport
///
/// Advances on its internal clock while running ([`tick`](Self::tick)), or
/// one step per external gate edge while stopped
/// ([`sync_step`](Self::sync_step)).
pub struct Sequencer<'q> {
    pattern: Pattern,
    tempo_bpm_x10: u16,
    running: bool,
    step: u8,
    last_step_us: u32,
    queue: Option<&'q EventQueue>,
}

impl<'q> Sequencer<'q> {
    /// Create a stopped sequencer at 120 BPM
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            tempo_bpm_x10: DEFAULT_TEMPO_BPM_X10,
            running: false,
            step: 0,
            last_step_us: 0,
            queue: None,
        }
    }

    /// Bind the event queue that receives `SequenceStep` events
    pub fn bind_queue(&mut self, queue: &'q EventQueue) {
        self.queue = Some(queue);
    }

    /// The pattern being played
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Mutable access for live pattern edits
    pub fn pattern_mut(&mut self) -> &mut Pattern {
        &mut self.pattern
    }

    /// Tempo in BPM × 10
    pub fn tempo_bpm_x10(&self) -> u16 {
        self.tempo_bpm_x10
    }

    /// Set the tempo, clamped to the supported range
    pub fn set_tempo_bpm_x10(&mut self, tempo: u16) {
        self.tempo_bpm_x10 = tempo.clamp(TEMPO_MIN_BPM_X10, TEMPO_MAX_BPM_X10);
    }

    /// Adjust the tempo by a signed amount (encoder deltas), clamped
    pub fn nudge_tempo(&mut self, delta_bpm_x10: i16) {
        let tempo = self.tempo_bpm_x10 as i32 + delta_bpm_x10 as i32;
        let tempo = tempo.clamp(TEMPO_MIN_BPM_X10 as i32, TEMPO_MAX_BPM_X10 as i32);
        self.tempo_bpm_x10 = tempo as u16;
    }

    /// Microseconds per step at the current tempo
    pub fn step_interval_us(&self) -> u32 {
        600_000_000 / self.tempo_bpm_x10 as u32
    }

    /// Check if the internal clock is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the internal clock; the first step lands one interval later
    pub fn start(&mut self, now_us: u32) {
        self.running = true;
        self.last_step_us = now_us;
    }

    /// Stop the internal clock; the step position is kept
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Toggle the internal clock (start/stop button)
    pub fn toggle(&mut self, now_us: u32) {
        if self.running {
            self.stop();
        } else {
            self.start(now_us);
        }
    }

    /// Current step position
    pub fn step(&self) -> u8 {
        self.step
    }

    /// Rewind to step 0 without changing the transport state
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// Drive the internal clock; call once per scheduler tick
    ///
    /// Returns the step command when a full step interval has elapsed,
    /// `None` otherwise or while stopped.
    pub fn tick(&mut self, now_us: u32) -> Option<StepCommand> {
        if !self.running {
            return None;
        }
        if elapsed_us(now_us, self.last_step_us) < self.step_interval_us() {
            return None;
        }
        self.last_step_us = now_us;
        Some(self.advance(now_us))
    }

    /// Advance one step from an external gate edge
    ///
    /// Intended for external-sync operation while the internal clock is
    /// stopped; advancing is unconditional so a firmware can also chain it
    /// behind its own clock source.
    pub fn sync_step(&mut self, now_us: u32) -> StepCommand {
        self.last_step_us = now_us;
        self.advance(now_us)
    }

    fn advance(&mut self, now_us: u32) -> StepCommand {
        self.step = (self.step + 1) % self.pattern.length();
        if let Some(queue) = self.queue {
            let _ = queue.push(Event::new(
                EventKind::SequenceStep,
                self.step as u32,
                now_us,
            ));
        }
        StepCommand {
            step: self.step,
            volts: self.pattern.step_volts(self.step),
            trigger_gate: true,
        }
    }
}

/// Derive a tempo from the interval between external gate edges
///
/// Accepts intervals between 0.1 s and 2 s; anything outside is noise or
/// a stopped clock. The result is unclamped, callers pass it through
/// [`Sequencer::set_tempo_bpm_x10`].
pub fn tempo_from_gate_interval(interval_us: u32) -> Option<u16> {
    if (100_000..=2_000_000).contains(&interval_us) {
        Some((600_000_000 / interval_us) as u16)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_length_clamps() {
        assert_eq!(Pattern::new(0).length(), 1);
        assert_eq!(Pattern::new(8).length(), 8);
        assert_eq!(Pattern::new(99).length(), MAX_STEPS as u8);
    }

    #[test]
    fn test_chromatic_pattern() {
        let pattern = Pattern::default();
        assert_eq!(pattern.length(), 8);
        assert_eq!(pattern.step_volts(0), 0.0);
        // One semitone per step, 1 V/octave
        assert!((pattern.step_volts(7) - 7.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_stopped_sequencer_does_not_advance() {
        let mut seq = Sequencer::new(Pattern::default());
        assert_eq!(seq.tick(10_000_000), None);
        assert_eq!(seq.step(), 0);
    }

    #[test]
    fn test_advances_on_beat() {
        let queue = EventQueue::new();
        let mut seq = Sequencer::new(Pattern::default());
        seq.bind_queue(&queue);
        seq.start(0);

        // 120 BPM = one step every 500 ms
        assert_eq!(seq.step_interval_us(), 500_000);
        assert_eq!(seq.tick(499_999), None);

        let cmd = seq.tick(500_000).unwrap();
        assert_eq!(cmd.step, 1);
        assert!(cmd.trigger_gate);

        let event = queue.pop().unwrap();
        assert_eq!(event.kind, EventKind::SequenceStep);
        assert_eq!(event.data, 1);
        assert_eq!(event.timestamp, 500_000);
    }

    #[test]
    fn test_wraps_at_pattern_length() {
        let mut seq = Sequencer::new(Pattern::new(4));
        seq.start(0);

        let interval = seq.step_interval_us();
        let mut steps = std::vec::Vec::new();
        for beat in 1..=8 {
            let cmd = seq.tick(beat * interval).unwrap();
            steps.push(cmd.step);
        }
        assert_eq!(steps, [1, 2, 3, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_advances_across_clock_wrap() {
        let mut seq = Sequencer::new(Pattern::default());
        seq.start(0xFFFF_FFF0);

        let wrapped = 0xFFFF_FFF0_u32.wrapping_add(seq.step_interval_us());
        assert_eq!(seq.tick(wrapped.wrapping_sub(1)), None);
        assert!(seq.tick(wrapped).is_some());
    }

    #[test]
    fn test_sync_step_while_stopped() {
        let queue = EventQueue::new();
        let mut seq = Sequencer::new(Pattern::default());
        seq.bind_queue(&queue);

        let cmd = seq.sync_step(1_000);
        assert_eq!(cmd.step, 1);
        assert!(cmd.trigger_gate);
        assert_eq!(queue.pop().unwrap().kind, EventKind::SequenceStep);
    }

    #[test]
    fn test_tempo_clamps() {
        let mut seq = Sequencer::new(Pattern::default());
        seq.set_tempo_bpm_x10(100);
        assert_eq!(seq.tempo_bpm_x10(), TEMPO_MIN_BPM_X10);
        seq.set_tempo_bpm_x10(5_000);
        assert_eq!(seq.tempo_bpm_x10(), TEMPO_MAX_BPM_X10);
    }

    #[test]
    fn test_nudge_tempo() {
        let mut seq = Sequencer::new(Pattern::default());
        seq.nudge_tempo(50);
        assert_eq!(seq.tempo_bpm_x10(), 1250);
        seq.nudge_tempo(-10_000);
        assert_eq!(seq.tempo_bpm_x10(), TEMPO_MIN_BPM_X10);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut seq = Sequencer::new(Pattern::default());
        seq.sync_step(0);
        seq.sync_step(1);
        assert_eq!(seq.step(), 2);
        seq.reset();
        assert_eq!(seq.step(), 0);
    }

    #[test]
    fn test_tempo_from_gate_interval() {
        // 500 ms between gates = 120.0 BPM
        assert_eq!(tempo_from_gate_interval(500_000), Some(1200));
        // Window boundaries
        assert_eq!(tempo_from_gate_interval(100_000), Some(6000));
        assert_eq!(tempo_from_gate_interval(2_000_000), Some(300));
        // Outside the window: noise or stopped clock
        assert_eq!(tempo_from_gate_interval(50_000), None);
        assert_eq!(tempo_from_gate_interval(3_000_000), None);
    }
}