//! Triangle channel ($4008–$400B): linear counter (7-bit), length counter, 32-step triangle wave.
//! Timer runs at CPU cycle rate (one octave below pulse for same period). See
//! [APU Triangle](https://www.nesdev.org/wiki/APU_Triangle).

use serde::{Deserialize, Serialize};

use crate::apu::units::LengthCounter;

/// 32-step waveform: 15 down to 0, then 0 up to 15. No volume control.
pub const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub enabled: bool,
    pub period: u16,
    pub timer: u16,
    pub sequence_position: u8,
    pub linear_counter: u8,
    pub linear_reload_value: u8,
    pub linear_reload: bool,
    /// Linear counter control; the same bit halts the length counter.
    pub control: bool,
    pub length: LengthCounter,
}

impl Triangle {
    /// $4008: control / length halt, linear counter reload value.
    pub fn write_linear(&mut self, data: u8) {
        self.control = data & 0x80 != 0;
        self.length.halt = self.control;
        self.linear_reload_value = data & 0x7F;
    }

    /// $400A: timer low 8 bits.
    pub fn write_timer_low(&mut self, data: u8) {
        self.period = (self.period & 0x0700) | data as u16;
    }

    /// $400B: length counter load, timer high 3 bits; sets linear reload flag and restarts
    /// the sequence.
    pub fn write_timer_high(&mut self, data: u8) {
        self.period = (self.period & 0x00FF) | ((data & 7) as u16) << 8;
        self.length.load(data, self.enabled);
        self.linear_reload = true;
        self.sequence_position = 0;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.length.set_enabled(enabled);
    }

    pub fn clock_length(&mut self) {
        self.length.clock();
    }

    /// Quarter-frame clock.
    pub fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_reload_value;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    /// One CPU cycle.
    pub fn tick(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.period;
        if self.length.is_active() && self.linear_counter > 0 {
            self.sequence_position = (self.sequence_position + 1) & 31;
        }
    }

    /// Silent once the length counter is 0 (or the channel is disabled). A linear counter of 0
    /// only stops the sequencer, which then holds its current step.
    pub fn output(&self) -> u8 {
        if !self.length.is_active() {
            return 0;
        }
        TRIANGLE_SEQUENCE[self.sequence_position as usize]
    }

    pub fn frequency(&self, cpu_clock: f64) -> f64 {
        cpu_clock / (32.0 * (self.period as f64 + 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(period: u16) -> Triangle {
        let mut tri = Triangle::default();
        tri.set_enabled(true);
        tri.write_linear(0x80 | 0x7F);
        tri.write_timer_low(period as u8);
        tri.write_timer_high(0x08 | (period >> 8) as u8);
        tri.clock_linear();
        tri
    }

    #[test]
    fn sequence_is_symmetric_ramp() {
        for p in 0..32 {
            assert_eq!(TRIANGLE_SEQUENCE[p], TRIANGLE_SEQUENCE[31 - p]);
        }
        let down: Vec<u8> = (0..16).rev().collect();
        assert_eq!(TRIANGLE_SEQUENCE[..16], down[..]);
    }

    #[test]
    fn output_walks_the_full_sequence() {
        let mut tri = playing(0);
        let mut seen = vec![tri.output()];
        for _ in 0..31 {
            tri.tick();
            seen.push(tri.output());
        }
        assert_eq!(seen, TRIANGLE_SEQUENCE);
    }

    #[test]
    fn sequence_stops_without_linear_counter() {
        let mut tri = Triangle::default();
        tri.set_enabled(true);
        tri.write_linear(0x00);
        tri.write_timer_high(0x08);
        tri.clock_linear(); // reloads 0, clears reload flag
        for _ in 0..10 {
            tri.tick();
        }
        assert_eq!(tri.sequence_position, 0);
        assert_eq!(tri.output(), 15);
    }

    #[test]
    fn linear_counter_counts_down_after_reload_clears() {
        let mut tri = Triangle::default();
        tri.write_linear(0x03);
        tri.write_timer_high(0x00);
        tri.clock_linear();
        assert_eq!(tri.linear_counter, 3);
        assert!(!tri.linear_reload);
        tri.clock_linear();
        tri.clock_linear();
        assert_eq!(tri.linear_counter, 1);
    }

    #[test]
    fn control_flag_keeps_reloading() {
        let mut tri = Triangle::default();
        tri.write_linear(0x85);
        tri.write_timer_high(0x00);
        for _ in 0..4 {
            tri.clock_linear();
        }
        assert_eq!(tri.linear_counter, 5);
        assert!(tri.linear_reload);
    }

    #[test]
    fn timer_high_write_resets_sequence_position() {
        let mut tri = playing(0);
        for _ in 0..7 {
            tri.tick();
        }
        assert_ne!(tri.sequence_position, 0);
        tri.write_timer_high(0x08);
        assert_eq!(tri.sequence_position, 0);
    }

    #[test]
    fn silent_without_length() {
        assert_eq!(Triangle::default().output(), 0);
        let mut tri = playing(0);
        for _ in 0..5 {
            tri.tick();
        }
        assert_eq!(tri.output(), TRIANGLE_SEQUENCE[5]);
        tri.set_enabled(false);
        assert_eq!(tri.output(), 0);
    }
}
