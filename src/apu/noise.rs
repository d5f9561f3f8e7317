//! Noise channel ($400C–$400F): envelope, 15-bit LFSR, period from $400E, length counter.
//! See [APU Noise](https://www.nesdev.org/wiki/APU_Noise).

use serde::{Deserialize, Serialize};

use crate::apu::units::{Envelope, LengthCounter};

/// Pseudo-random output from a 15-bit LFSR; mode 1 taps bit 6 for a short, metallic loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noise {
    pub enabled: bool,
    /// Timer reload in APU cycles (table entry / 2 - 1).
    pub period: u16,
    pub timer: u16,
    pub shift_register: u16,
    pub mode: bool,
    pub length: LengthCounter,
    pub envelope: Envelope,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 0,
            timer: 0,
            shift_register: 1,
            mode: false,
            length: LengthCounter::default(),
            envelope: Envelope::default(),
        }
    }
}

impl Noise {
    /// $400C: length halt / envelope loop, constant volume, volume/envelope period.
    pub fn write_control(&mut self, data: u8) {
        self.length.halt = data & 0x20 != 0;
        self.envelope.write(data);
    }

    /// $400E: LFSR mode (bit 7), period index (bits 0–3) into the region's CPU-cycle table.
    pub fn write_period(&mut self, data: u8, periods: &[u16; 16]) {
        self.mode = data & 0x80 != 0;
        self.period = periods[(data & 0x0F) as usize] / 2 - 1;
    }

    /// $400F: length counter load; restarts envelope.
    pub fn write_length(&mut self, data: u8) {
        self.length.load(data, self.enabled);
        self.envelope.restart();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.length.set_enabled(enabled);
    }

    pub fn clock_length(&mut self) {
        self.length.clock();
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    /// One APU cycle (every other CPU cycle).
    pub fn tick(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.period;
        let tap = if self.mode { 6 } else { 1 };
        let feedback = (self.shift_register ^ (self.shift_register >> tap)) & 1;
        self.shift_register = (self.shift_register >> 1) | (feedback << 14);
    }

    pub fn output(&self) -> u8 {
        if !self.length.is_active() || self.shift_register & 1 != 0 {
            return 0;
        }
        self.envelope.output()
    }

    /// LFSR clock rate in Hz.
    pub fn frequency(&self, cpu_clock: f64) -> f64 {
        cpu_clock / (2.0 * (self.period as f64 + 1.0))
    }
}
