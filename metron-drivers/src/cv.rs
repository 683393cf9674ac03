//! CV input change detection and CV output
//!
//! A CV input sampled every few milliseconds would flood the event queue
//! if every LSB of converter noise became an event. The change detector
//! is a hysteresis filter: only a sample that moves more than a threshold
//! away from the last reported value is reported. The trade is explicit -
//! drift slower than the threshold is never seen, in exchange for
//! queue-flood protection.

use metron_core::cv::{adc_to_volts, level_to_volts, volts_to_level};
use metron_core::event::{Event, EventKind};
use metron_core::queue::EventQueue;
use metron_hal::AnalogOutput;

/// Default change threshold in ADC counts (of 0-4095)
pub const DEFAULT_CV_THRESHOLD: u16 = 50;

/// CV input hysteresis filter
pub struct AnalogChangeDetector<'q> {
    channel: u8,
    value: u16,
    threshold: u16,
    last_change_us: u32,
    queue: Option<&'q EventQueue>,
}

impl<'q> AnalogChangeDetector<'q> {
    /// Create a detector reporting changes beyond `threshold` counts
    pub fn new(channel: u8, threshold: u16) -> Self {
        Self {
            channel,
            value: 0,
            threshold,
            last_change_us: 0,
            queue: None,
        }
    }

    /// Bind the event queue that receives `CvChange` events
    pub fn bind_queue(&mut self, queue: &'q EventQueue) {
        self.queue = Some(queue);
    }

    /// Feed one raw ADC sample
    pub fn sample(&mut self, raw: u16, now_us: u32) {
        if raw.abs_diff(self.value) <= self.threshold {
            return;
        }
        self.value = raw;
        self.last_change_us = now_us;
        if let Some(queue) = self.queue {
            let _ = queue.push(Event::new(
                EventKind::CvChange,
                self.channel as u32,
                now_us,
            ));
        }
    }

    /// ADC channel carried in events
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Last reported raw value
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Last reported value as a eurorack voltage
    pub fn volts(&self) -> f32 {
        adc_to_volts(self.value)
    }

    /// Timestamp of the last reported change
    pub fn last_change_us(&self) -> u32 {
        self.last_change_us
    }
}

/// CV output channel
///
/// Remembers the last driven level so consumers can read back the output
/// voltage without touching hardware.
pub struct CvOutput {
    channel: u8,
    level: u16,
}

impl CvOutput {
    /// Create an output resting at 0 V (mid-scale)
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            level: volts_to_level(0.0),
        }
    }

    /// Drive a raw 16-bit level
    pub fn set_level(&mut self, out: &mut impl AnalogOutput, level: u16) {
        self.level = level;
        out.set_level(self.channel, level);
    }

    /// Drive a eurorack voltage, clamped to ±5 V
    pub fn set_volts(&mut self, out: &mut impl AnalogOutput, volts: f32) {
        self.set_level(out, volts_to_level(volts));
    }

    /// Output channel
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Last driven raw level
    pub fn level(&self) -> u16 {
        self.level
    }

    /// Last driven level as a eurorack voltage
    pub fn volts(&self) -> f32 {
        level_to_volts(self.level)
    }
}
