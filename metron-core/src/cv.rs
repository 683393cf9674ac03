//! Control-voltage scaling
//!
//! The front end conditions a ±5 V eurorack signal into the converter
//! ranges: CV inputs arrive as 12-bit ADC counts against a 3.3 V
//! reference, CV outputs leave as 16-bit levels (PWM + filter or DAC).
//! These helpers convert between raw counts and volts.

/// Full-scale 12-bit ADC count
pub const ADC_MAX: u16 = 4095;

/// Full-scale 16-bit output level
pub const DAC_MAX: u16 = 65535;

/// ADC reference voltage
pub const ADC_REF_VOLTS: f32 = 3.3;

/// Lowest representable CV
pub const CV_MIN_VOLTS: f32 = -5.0;

/// Highest representable CV
pub const CV_MAX_VOLTS: f32 = 5.0;

/// Convert a raw 12-bit ADC count to a eurorack voltage (−5 V..+5 V)
pub fn adc_to_volts(raw: u16) -> f32 {
    let pin_volts = (raw as f32 / ADC_MAX as f32) * ADC_REF_VOLTS;
    (pin_volts - ADC_REF_VOLTS / 2.0) * ((CV_MAX_VOLTS - CV_MIN_VOLTS) / ADC_REF_VOLTS)
}

/// Convert a eurorack voltage to a 16-bit output level, clamping to range
pub fn volts_to_level(volts: f32) -> u16 {
    let clamped = volts.clamp(CV_MIN_VOLTS, CV_MAX_VOLTS);
    let span = CV_MAX_VOLTS - CV_MIN_VOLTS;
    ((clamped - CV_MIN_VOLTS) / span * DAC_MAX as f32) as u16
}

/// Convert a 16-bit output level back to a eurorack voltage
pub fn level_to_volts(level: u16) -> f32 {
    let span = CV_MAX_VOLTS - CV_MIN_VOLTS;
    (level as f32 / DAC_MAX as f32) * span + CV_MIN_VOLTS
}

/// Pitch CV for a semitone offset, 1 V/octave
pub fn note_volts(semitones: u8) -> f32 {
    semitones as f32 / 12.0
}
