//! Pulse channels ($4000–$4003 = pulse 1, $4004–$4007 = pulse 2).
//!
//! Duty, envelope, sweep, length counter, 11-bit timer. Timer clocked every 2 CPU cycles.
//! See [APU Pulse](https://www.nesdev.org/wiki/APU_Pulse) and
//! [APU Sweep](https://www.nesdev.org/wiki/APU_Sweep).

use serde::{Deserialize, Serialize};

use crate::apu::units::{Envelope, LengthCounter};

/// Duty waveforms in sequencer order. Duty 0=12.5%, 1=25%, 2=50%, 3=25% negated.
const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// How the sweep unit negates its change amount. The two pulse channels differ here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepNegate {
    /// Pulse 1: `period - delta - 1`.
    #[default]
    OnesComplement,
    /// Pulse 2: `period - delta`.
    TwosComplement,
}

/// Square wave with configurable duty, volume/envelope, frequency sweep, length counter.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pulse {
    pub enabled: bool,
    pub duty: u8,
    pub duty_position: u8,
    pub period: u16,
    pub timer: u16,
    pub sweep_enabled: bool,
    pub sweep_negate: bool,
    pub sweep_period: u8,
    pub sweep_shift: u8,
    pub sweep_divider: u8,
    pub sweep_reload: bool,
    pub negate_mode: SweepNegate,
    pub length: LengthCounter,
    pub envelope: Envelope,
}

impl Pulse {
    pub fn new(negate_mode: SweepNegate) -> Self {
        Self {
            negate_mode,
            ..Self::default()
        }
    }

    /// $4000/$4004: duty, length halt / envelope loop, constant volume, volume/envelope period.
    pub fn write_control(&mut self, data: u8) {
        self.duty = data >> 6;
        self.length.halt = data & 0x20 != 0;
        self.envelope.write(data);
    }

    /// $4001/$4005: sweep enable, period, negate, shift.
    pub fn write_sweep(&mut self, data: u8) {
        self.sweep_enabled = data & 0x80 != 0;
        self.sweep_period = (data >> 4) & 7;
        self.sweep_negate = data & 0x08 != 0;
        self.sweep_shift = data & 7;
        self.sweep_reload = true;
    }

    /// $4002/$4006: timer low 8 bits.
    pub fn write_timer_low(&mut self, data: u8) {
        self.period = (self.period & 0x0700) | data as u16;
    }

    /// $4003/$4007: length counter load, timer high 3 bits; restarts envelope and sequencer.
    pub fn write_timer_high(&mut self, data: u8) {
        self.period = (self.period & 0x00FF) | ((data & 7) as u16) << 8;
        self.length.load(data, self.enabled);
        self.envelope.restart();
        self.duty_position = 0;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.length.set_enabled(enabled);
    }

    /// Period the sweep unit is heading for. Computed continuously, since it also drives muting.
    pub fn target_period(&self) -> u16 {
        let delta = self.period >> self.sweep_shift;
        if !self.sweep_negate {
            return self.period + delta;
        }
        match self.negate_mode {
            SweepNegate::OnesComplement => self.period.saturating_sub(delta + 1),
            SweepNegate::TwosComplement => self.period.saturating_sub(delta),
        }
    }

    /// Muted whenever the period is too small or the sweep target overflows 11 bits, even with
    /// the sweep unit disabled.
    pub fn is_muted(&self) -> bool {
        self.period < 8 || self.target_period() > 0x7FF
    }

    /// Half-frame clock.
    pub fn clock_sweep(&mut self) {
        if self.sweep_divider == 0 && self.sweep_enabled && self.sweep_shift > 0 && !self.is_muted()
        {
            self.period = self.target_period();
        }
        if self.sweep_divider == 0 || self.sweep_reload {
            self.sweep_divider = self.sweep_period;
            self.sweep_reload = false;
        } else {
            self.sweep_divider -= 1;
        }
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
        self.duty_position = (self.duty_position + 1) & 7;
    }

    pub fn output(&self) -> u8 {
        if !self.length.is_active()
            || self.is_muted()
            || DUTY_TABLE[self.duty as usize][self.duty_position as usize] == 0
        {
            return 0;
        }
        self.envelope.output()
    }

    /// Tone frequency in Hz for the given CPU clock.
    pub fn frequency(&self, cpu_clock: f64) -> f64 {
        cpu_clock / (16.0 * (self.period as f64 + 1.0))
    }
}
