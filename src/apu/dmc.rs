//! DMC channel ($4010–$4013): delta modulation, 7-bit output, sample buffer, CPU stall on fetch.
//! Sample address $C000 + (byte*64); length (byte*16)+1. See [APU DMC](https://www.nesdev.org/wiki/APU_DMC).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dmc {
    pub irq_enabled: bool,
    pub irq_pending: bool,
    pub loop_flag: bool,
    /// Timer reload in CPU cycles (rate table entry - 1).
    pub period: u16,
    pub timer: u16,
    pub output_level: u8,
    pub start_address: u16,
    pub sample_length: u16,
    pub current_address: u16,
    pub bytes_remaining: u16,
    /// Single-byte sample buffer; filled by the memory reader, emptied into the shift register.
    pub sample_buffer: Option<u8>,
    pub shift_register: u8,
    pub bits_remaining: u8,
    /// Set when an output cycle started with an empty buffer: the level holds still.
    pub silence: bool,
}

impl Default for Dmc {
    fn default() -> Self {
        Self {
            irq_enabled: false,
            irq_pending: false,
            loop_flag: false,
            period: 0,
            timer: 0,
            output_level: 0,
            start_address: 0xC000,
            sample_length: 1,
            current_address: 0xC000,
            bytes_remaining: 0,
            sample_buffer: None,
            shift_register: 0,
            bits_remaining: 8,
            silence: true,
        }
    }
}

impl Dmc {
    /// $4010: IRQ enable (bit 7), loop (bit 6), rate index (bits 0–3). Clearing IRQ enable
    /// clears a pending DMC IRQ.
    pub fn write_control(&mut self, data: u8, rates: &[u16; 16]) {
        self.irq_enabled = data & 0x80 != 0;
        if !self.irq_enabled {
            self.irq_pending = false;
        }
        self.loop_flag = data & 0x40 != 0;
        self.period = rates[(data & 0x0F) as usize] - 1;
    }

    /// $4011: direct load of the output level.
    pub fn write_output_level(&mut self, data: u8) {
        self.output_level = data & 0x7F;
    }

    /// $4012: sample address = $C000 + (value * 64).
    pub fn write_address(&mut self, data: u8) {
        self.start_address = 0xC000 | (data as u16) << 6;
    }

    /// $4013: sample length = (value * 16) + 1 bytes.
    pub fn write_length(&mut self, data: u8) {
        self.sample_length = (data as u16) << 4 | 1;
    }

    /// $4015 bit 4. Disabling drops the remaining bytes (the byte already in the buffer still
    /// plays out); enabling with nothing left starts the sample over from its configured start.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart();
        }
    }

    fn restart(&mut self) {
        self.current_address = self.start_address;
        self.bytes_remaining = self.sample_length;
    }

    /// Address the memory reader wants next: the buffer is empty and bytes remain.
    pub fn pending_fetch(&self) -> Option<u16> {
        if self.sample_buffer.is_none() && self.bytes_remaining > 0 {
            Some(self.current_address)
        } else {
            None
        }
    }

    /// Completes a DMA read started from `pending_fetch`. Address wraps $FFFF → $8000.
    pub fn feed_byte(&mut self, byte: u8) {
        self.sample_buffer = Some(byte);
        self.current_address = match self.current_address {
            0xFFFF => 0x8000,
            addr => addr + 1,
        };
        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 {
            if self.loop_flag {
                self.restart();
            } else if self.irq_enabled {
                self.irq_pending = true;
            }
        }
    }

    /// One CPU cycle.
    pub fn tick(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.period;
        self.clock_output();
    }

    fn clock_output(&mut self) {
        if !self.silence {
            if self.shift_register & 1 != 0 {
                if self.output_level <= 125 {
                    self.output_level += 2;
                }
            } else if self.output_level >= 2 {
                self.output_level -= 2;
            }
        }
        self.shift_register >>= 1;

        self.bits_remaining -= 1;
        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            match self.sample_buffer.take() {
                Some(byte) => {
                    self.shift_register = byte;
                    self.silence = false;
                }
                None => self.silence = true,
            }
        }
    }

    /// 7-bit level. Held (not zeroed) while silent, as the DAC keeps its last value.
    pub fn output(&self) -> u8 {
        self.output_level
    }

    /// $4015 bit 4.
    pub fn is_active(&self) -> bool {
        self.bytes_remaining > 0
    }

    /// Output bits per second in Hz.
    pub fn sample_rate(&self, cpu_clock: f64) -> f64 {
        cpu_clock / (self.period as f64 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apu::region::Region;

    /// Runs the channel like the APU does: one tick, then any DMA the memory reader wants.
    fn run(dmc: &mut Dmc, cycles: usize, memory: &[u8]) -> usize {
        let mut fetches = 0;
        for _ in 0..cycles {
            dmc.tick();
            if let Some(addr) = dmc.pending_fetch() {
                dmc.feed_byte(memory[(addr as usize) % memory.len()]);
                fetches += 1;
            }
        }
        fetches
    }

    fn fastest(data: u8) -> Dmc {
        let mut dmc = Dmc::default();
        dmc.write_control(data | 0x0F, Region::Ntsc.dmc_rates());
        dmc.write_address(0x00);
        dmc.write_length(0x00); // 1 byte
        dmc
    }

    #[test]
    fn address_and_length_registers() {
        let mut dmc = Dmc::default();
        dmc.write_address(0xFF);
        dmc.write_length(0xFF);
        assert_eq!(dmc.start_address, 0xFFC0);
        assert_eq!(dmc.sample_length, 0x0FF1);
    }

    #[test]
    fn ones_raise_level_by_two_and_clamp() {
        let mut dmc = fastest(0x00);
        dmc.write_output_level(0x7D);
        dmc.set_enabled(true);
        run(&mut dmc, 54 * 24, &[0xFF]);
        assert_eq!(dmc.output(), 127);
    }

    #[test]
    fn zeros_lower_level_by_two_and_clamp() {
        let mut dmc = fastest(0x00);
        dmc.write_output_level(0x03);
        dmc.set_enabled(true);
        run(&mut dmc, 54 * 24, &[0x00]);
        assert_eq!(dmc.output(), 1);
    }

    #[test]
    fn irq_fires_once_when_sample_ends() {
        let mut dmc = fastest(0x80);
        dmc.write_length(0x01); // 17 bytes
        dmc.set_enabled(true);
        let mut raised = 0;
        let mut was_pending = false;
        for _ in 0..54 * 8 * 40 {
            dmc.tick();
            if let Some(addr) = dmc.pending_fetch() {
                dmc.feed_byte(addr as u8);
            }
            if dmc.irq_pending && !was_pending {
                raised += 1;
            }
            was_pending = dmc.irq_pending;
        }
        assert_eq!(raised, 1);
        assert!(!dmc.is_active());
    }

    #[test]
    fn no_irq_without_enable() {
        let mut dmc = fastest(0x00);
        dmc.set_enabled(true);
        assert_eq!(run(&mut dmc, 54 * 8 * 4, &[0x55]), 1);
        assert!(!dmc.irq_pending);
        assert!(!dmc.is_active());
    }

    #[test]
    fn looping_sample_never_runs_out() {
        let mut dmc = fastest(0xC0); // loop + irq enable
        dmc.set_enabled(true);
        for _ in 0..54 * 8 * 50 {
            dmc.tick();
            if let Some(addr) = dmc.pending_fetch() {
                dmc.feed_byte(addr as u8);
            }
            assert!(dmc.is_active());
        }
        assert!(!dmc.irq_pending);
    }

    #[test]
    fn address_wraps_to_8000() {
        let mut dmc = Dmc::default();
        dmc.start_address = 0xFFFF;
        dmc.sample_length = 2;
        dmc.set_enabled(true);
        dmc.feed_byte(0);
        assert_eq!(dmc.current_address, 0x8000);
    }

    #[test]
    fn clearing_irq_enable_acknowledges() {
        let mut dmc = Dmc::default();
        dmc.irq_pending = true;
        dmc.write_control(0x00, Region::Ntsc.dmc_rates());
        assert!(!dmc.irq_pending);
    }

    #[test]
    fn buffered_byte_plays_after_disable() {
        let mut dmc = fastest(0x00);
        dmc.write_length(0x01);
        dmc.set_enabled(true);
        dmc.feed_byte(0xFF);
        dmc.set_enabled(false);
        assert!(dmc.pending_fetch().is_none());
        let level = dmc.output();
        // The silent power-on output cycle runs out first, then 0xFF shifts out.
        run(&mut dmc, 54 * 16, &[0x00]);
        assert_eq!(dmc.output(), level + 16);
    }
}
