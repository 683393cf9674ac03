//! Input scan table
//!
//! One explicit pin→handler mapping, populated at configuration time,
//! owns every input state machine. A polling task calls
//! [`InputScanner::scan`] to feed all of them; a GPIO interrupt handler
//! calls [`InputScanner::on_pin_edge`] with the reported pin to feed
//! exactly the owner. Either way there is no global registry and no
//! identity scan over unrelated instances - the table is the routing.

use heapless::Vec;
use metron_hal::{AnalogInput, DigitalIo, PinDirection, Pull};

use crate::cv::AnalogChangeDetector;
use crate::encoder::QuadratureDecoder;
use crate::gate::EdgeTimer;
use crate::switch::DebouncedSwitch;

/// Maximum bound peripherals
pub const MAX_BINDINGS: usize = 16;

enum Binding<'q> {
    Encoder {
        pin_a: u8,
        pin_b: u8,
        button_pin: Option<u8>,
        decoder: QuadratureDecoder<'q>,
    },
    Switch {
        pin: u8,
        switch: DebouncedSwitch<'q>,
    },
    Gate {
        pin: u8,
        timer: EdgeTimer<'q>,
    },
    Cv {
        channel: u8,
        detector: AnalogChangeDetector<'q>,
    },
}

/// Pin→handler input routing table
///
/// Bind each state machine to its queue first, then hand it to the
/// scanner together with its wiring; the scanner owns it from then on and
/// exposes it back through the indexed accessors.
pub struct InputScanner<'q> {
    bindings: Vec<Binding<'q>, MAX_BINDINGS>,
}

impl<'q> InputScanner<'q> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind an encoder to its channel pins and optional switch pin
    ///
    /// Configures the pins as pulled-up inputs and primes the decoder
    /// from the current channel-A level. Returns `false` when the table
    /// is full.
    pub fn bind_encoder(
        &mut self,
        io: &mut impl DigitalIo,
        pin_a: u8,
        pin_b: u8,
        button_pin: Option<u8>,
        mut decoder: QuadratureDecoder<'q>,
    ) -> bool {
        if self.bindings.is_full() {
            return false;
        }
        io.configure_pin(pin_a, PinDirection::Input, Pull::Up);
        io.configure_pin(pin_b, PinDirection::Input, Pull::Up);
        if let Some(pin) = button_pin {
            io.configure_pin(pin, PinDirection::Input, Pull::Up);
        }
        decoder.prime(io.digital_read(pin_a));
        let _ = self.bindings.push(Binding::Encoder {
            pin_a,
            pin_b,
            button_pin,
            decoder,
        });
        true
    }

    /// Bind a debounced switch to a pulled-up input pin
    pub fn bind_switch(
        &mut self,
        io: &mut impl DigitalIo,
        pin: u8,
        switch: DebouncedSwitch<'q>,
    ) -> bool {
        if self.bindings.is_full() {
            return false;
        }
        io.configure_pin(pin, PinDirection::Input, Pull::Up);
        let _ = self.bindings.push(Binding::Switch { pin, switch });
        true
    }

    /// Bind a gate input to a pulled-down input pin
    pub fn bind_gate(&mut self, io: &mut impl DigitalIo, pin: u8, timer: EdgeTimer<'q>) -> bool {
        if self.bindings.is_full() {
            return false;
        }
        io.configure_pin(pin, PinDirection::Input, Pull::Down);
        let _ = self.bindings.push(Binding::Gate { pin, timer });
        true
    }

    /// Bind a CV change detector to an ADC channel
    pub fn bind_cv(&mut self, channel: u8, detector: AnalogChangeDetector<'q>) -> bool {
        self.bindings
            .push(Binding::Cv { channel, detector })
            .is_ok()
    }

    /// Feed every binding one sample; call from the polling task
    pub fn scan(&mut self, io: &impl DigitalIo, adc: &mut impl AnalogInput, now_us: u32) {
        for binding in self.bindings.iter_mut() {
            match binding {
                Binding::Encoder {
                    pin_a,
                    pin_b,
                    button_pin,
                    decoder,
                } => {
                    decoder.sample(io.digital_read(*pin_a), io.digital_read(*pin_b), now_us);
                    if let Some(pin) = button_pin {
                        decoder.sample_button(io.digital_read(*pin), now_us);
                    }
                }
                Binding::Switch { pin, switch } => {
                    switch.sample(io.digital_read(*pin), now_us);
                }
                Binding::Gate { pin, timer } => {
                    timer.sample(io.digital_read(*pin), now_us);
                }
                Binding::Cv { channel, detector } => {
                    detector.sample(adc.analog_read(*channel), now_us);
                }
            }
        }
    }

    /// Route one interrupt-reported pin edge to its owner
    ///
    /// Returns `false` when no binding owns the pin; the edge is ignored.
    pub fn on_pin_edge(&mut self, io: &impl DigitalIo, pin: u8, now_us: u32) -> bool {
        for binding in self.bindings.iter_mut() {
            match binding {
                Binding::Encoder {
                    pin_a,
                    pin_b,
                    button_pin,
                    decoder,
                } => {
                    if pin == *pin_a || pin == *pin_b {
                        decoder.sample(io.digital_read(*pin_a), io.digital_read(*pin_b), now_us);
                        return true;
                    }
                    if *button_pin == Some(pin) {
                        decoder.sample_button(io.digital_read(pin), now_us);
                        return true;
                    }
                }
                Binding::Switch { pin: owner, switch } => {
                    if pin == *owner {
                        switch.sample(io.digital_read(pin), now_us);
                        return true;
                    }
                }
                Binding::Gate { pin: owner, timer } => {
                    if pin == *owner {
                        timer.sample(io.digital_read(pin), now_us);
                        return true;
                    }
                }
                Binding::Cv { .. } => {}
            }
        }
        false
    }

    /// Number of bound peripherals
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// The n-th bound encoder, in binding order
    pub fn encoder(&self, index: usize) -> Option<&QuadratureDecoder<'q>> {
        self.bindings
            .iter()
            .filter_map(|b| match b {
                Binding::Encoder { decoder, .. } => Some(decoder),
                _ => None,
            })
            .nth(index)
    }

    /// The n-th bound switch, in binding order
    pub fn switch(&self, index: usize) -> Option<&DebouncedSwitch<'q>> {
        self.bindings
            .iter()
            .filter_map(|b| match b {
                Binding::Switch { switch, .. } => Some(switch),
                _ => None,
            })
            .nth(index)
    }

    /// The n-th bound gate input, in binding order
    pub fn gate(&self, index: usize) -> Option<&EdgeTimer<'q>> {
        self.bindings
            .iter()
            .filter_map(|b| match b {
                Binding::Gate { timer, .. } => Some(timer),
                _ => None,
            })
            .nth(index)
    }

    /// The n-th bound CV detector, in binding order
    pub fn cv(&self, index: usize) -> Option<&AnalogChangeDetector<'q>> {
        self.bindings
            .iter()
            .filter_map(|b| match b {
                Binding::Cv { detector, .. } => Some(detector),
                _ => None,
            })
            .nth(index)
    }
}

impl Default for InputScanner<'_> {
    fn default() -> Self {
        Self::new()
    }
}
