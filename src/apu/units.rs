//! Counters shared by several channels: the [length counter](https://www.nesdev.org/wiki/APU_Length_Counter)
//! and the [envelope generator](https://www.nesdev.org/wiki/APU_Envelope).

use serde::{Deserialize, Serialize};

/// Length counter lookup table: 5-bit index from register → count. APU_Length_Counter.
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Silences its channel once the note length runs out. Clocked on half frames.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthCounter {
    pub halt: bool,
    pub counter: u8,
    /// Last value loaded from `LENGTH_TABLE`.
    pub reload_value: u8,
}

impl LengthCounter {
    /// Load from the 5-bit code in bits 3–7 of a length register. Ignored while the channel is
    /// disabled through $4015.
    pub fn load(&mut self, data: u8, enabled: bool) {
        if !enabled {
            return;
        }
        self.reload_value = LENGTH_TABLE[(data >> 3) as usize];
        self.counter = self.reload_value;
    }

    pub fn clock(&mut self) {
        if !self.halt && self.counter > 0 {
            self.counter -= 1;
        }
    }

    /// $4015 channel bit: disabling forces the counter to 0.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.counter = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        self.counter > 0
    }
}

/// Volume envelope: either a constant volume or a 15→0 decay, optionally looping.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub start_flag: bool,
    pub loop_flag: bool,
    pub constant_volume: bool,
    pub divider: u8,
    pub counter: u8,
    /// Constant volume, or the divider period when decaying.
    pub volume: u8,
}

impl Envelope {
    /// `--LC VVVV` of $4000/$4004/$400C.
    pub fn write(&mut self, data: u8) {
        self.loop_flag = data & 0x20 != 0;
        self.constant_volume = data & 0x10 != 0;
        self.volume = data & 0x0F;
    }

    pub fn restart(&mut self) {
        self.start_flag = true;
    }

    /// Quarter-frame clock.
    pub fn clock(&mut self) {
        if self.start_flag {
            self.start_flag = false;
            self.counter = 15;
            self.divider = self.volume;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.volume;
            if self.counter > 0 {
                self.counter -= 1;
            } else if self.loop_flag {
                self.counter = 15;
            }
        }
    }

    pub fn output(&self) -> u8 {
        if self.constant_volume {
            self.volume
        } else {
            self.counter
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_load_uses_table_for_every_code() {
        for code in 0..32u8 {
            let mut length = LengthCounter::default();
            length.load(code << 3, true);
            assert_eq!(length.counter, LENGTH_TABLE[code as usize]);
            assert_eq!(length.reload_value, LENGTH_TABLE[code as usize]);
        }
    }

    #[test]
    fn length_load_ignored_while_disabled() {
        let mut length = LengthCounter::default();
        length.load(0x08, false);
        assert_eq!(length.counter, 0);
    }

    #[test]
    fn halted_length_does_not_count() {
        let mut length = LengthCounter::default();
        length.load(0x18, true); // code 3 → 2
        length.halt = true;
        length.clock();
        assert_eq!(length.counter, 2);
        length.halt = false;
        length.clock();
        length.clock();
        length.clock();
        assert_eq!(length.counter, 0);
    }

    #[test]
    fn envelope_decays_once_per_divider_period() {
        let mut env = Envelope::default();
        env.write(0x01); // decay, period 1 → every 2 clocks
        env.restart();
        env.clock();
        assert_eq!(env.output(), 15);
        env.clock();
        assert_eq!(env.output(), 15);
        env.clock();
        assert_eq!(env.output(), 14);
    }

    #[test]
    fn envelope_loops_back_to_15() {
        let mut env = Envelope::default();
        env.write(0x20); // loop, period 0
        env.restart();
        env.clock();
        for _ in 0..15 {
            env.clock();
        }
        assert_eq!(env.output(), 0);
        env.clock();
        assert_eq!(env.output(), 15);
    }

    #[test]
    fn envelope_without_loop_stays_at_zero() {
        let mut env = Envelope::default();
        env.write(0x00);
        env.restart();
        for _ in 0..40 {
            env.clock();
        }
        assert_eq!(env.output(), 0);
    }

    #[test]
    fn constant_volume_ignores_decay() {
        let mut env = Envelope::default();
        env.write(0x1A);
        env.restart();
        for _ in 0..5 {
            env.clock();
        }
        assert_eq!(env.output(), 0x0A);
    }
}
