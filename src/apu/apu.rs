//! NES APU (Audio Processing Unit) implementation.
//!
//! Implements the [APU](https://www.nesdev.org/wiki/APU) as in the Ricoh 2A03: five channels (pulse×2,
//! triangle, noise, DMC), [frame counter](https://www.nesdev.org/wiki/APU_Frame_Counter) (4-step or
//! 5-step), and [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer) (non-linear). Registers $4000–$4013,
//! $4015, $4017. See [APU registers](https://www.nesdev.org/wiki/APU_registers).
//!
//! ## Timing
//!
//! The host calls [`APU::clock`] exactly once per CPU cycle. Within a cycle the frame counter
//! runs first, then the channel timers, then the DMC memory reader.
//!
//! - Pulse and noise: timer clocked every 2 CPU cycles (APU "half cycle").
//! - Triangle and DMC: timer at CPU rate. Length/envelope/sweep clocked by frame counter (~240 Hz).
//! - DMC: rate from lookup table; when the sample buffer empties the CPU is stalled 4 cycles for
//!   the byte read.

use log::trace;

use crate::{
    apu::{
        dmc::Dmc,
        flags::{IrqSource, Status},
        frame_counter::{FrameCounter, FrameEvent},
        mixer::{self, ChannelLevels},
        noise::Noise,
        pulse::{Pulse, SweepNegate},
        region::Region,
        state::ApuState,
        triangle::Triangle,
    },
    bus::ApuBus,
};

/// CPU cycles lost to a DMC sample fetch.
pub const DMC_DMA_STALL: u8 = 4;

/// Value seen when reading an APU address that has no readable register.
const OPEN_BUS: u8 = 0x40;

/// APU state: pulse×2, triangle, noise, DMC, frame counter, and the external IRQ input.
pub struct APU {
    region: Region,
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame_counter: FrameCounter,
    cycle: u64,
    external_irq: bool,
}

impl Default for APU {
    fn default() -> Self {
        Self::new(Region::Ntsc)
    }
}

impl APU {
    /// Power-on state.
    pub fn new(region: Region) -> Self {
        let mut apu = Self {
            region,
            pulse1: Pulse::new(SweepNegate::OnesComplement),
            pulse2: Pulse::new(SweepNegate::TwosComplement),
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc: Dmc::default(),
            frame_counter: FrameCounter::default(),
            cycle: 0,
            external_irq: false,
        };
        apu.noise.write_period(0, region.noise_periods());
        apu.dmc.write_control(0, region.dmc_rates());
        apu
    }

    /// Reset button: silence everything, rewrite the last $4017 value, keep the DMC level's
    /// low bit. Triangle phase and the noise LFSR survive.
    pub fn reset(&mut self) {
        self.write_status(0x00);
        self.frame_counter.irq_pending = false;
        self.write_frame_counter(self.frame_counter.last_write);
        self.dmc.output_level &= 1;
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// CPU cycles clocked since power-on.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Write to APU registers. $4000–$4013 = channel regs; $4015 = channel enables;
    /// $4017 = frame counter (mode 4/5-step, IRQ inhibit).
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(data),
            0x4001 => self.pulse1.write_sweep(data),
            0x4002 => self.pulse1.write_timer_low(data),
            0x4003 => self.pulse1.write_timer_high(data),
            0x4004 => self.pulse2.write_control(data),
            0x4005 => self.pulse2.write_sweep(data),
            0x4006 => self.pulse2.write_timer_low(data),
            0x4007 => self.pulse2.write_timer_high(data),
            0x4008 => self.triangle.write_linear(data),
            0x400A => self.triangle.write_timer_low(data),
            0x400B => self.triangle.write_timer_high(data),
            0x400C => self.noise.write_control(data),
            0x400E => self.noise.write_period(data, self.region.noise_periods()),
            0x400F => self.noise.write_length(data),
            0x4010 => self.dmc.write_control(data, self.region.dmc_rates()),
            0x4011 => self.dmc.write_output_level(data),
            0x4012 => self.dmc.write_address(data),
            0x4013 => self.dmc.write_length(data),
            0x4015 => self.write_status(data),
            0x4017 => self.write_frame_counter(data),
            _ => trace!("ignored APU write ${:04X} = ${:02X}", addr, data),
        }
    }

    /// Read an APU address. Only $4015 is readable; the read acknowledges both the frame and
    /// DMC interrupts.
    pub fn read(&mut self, addr: u16) -> u8 {
        if addr != 0x4015 {
            return OPEN_BUS;
        }
        let status = self.peek_status();
        self.frame_counter.irq_pending = false;
        self.dmc.irq_pending = false;
        status.bits()
    }

    /// $4015 without the read side effect: bits 0–3 = length counter > 0 for pulse1, pulse2,
    /// triangle, noise; bit 4 = DMC has bytes remaining; bit 6 = frame IRQ; bit 7 = DMC IRQ.
    pub fn peek_status(&self) -> Status {
        let mut status = Status::empty();
        status.set(Status::PULSE1, self.pulse1.length.is_active());
        status.set(Status::PULSE2, self.pulse2.length.is_active());
        status.set(Status::TRIANGLE, self.triangle.length.is_active());
        status.set(Status::NOISE, self.noise.length.is_active());
        status.set(Status::DMC_ACTIVE, self.dmc.is_active());
        status.set(Status::FRAME_INTERRUPT, self.frame_counter.irq_pending);
        status.set(Status::DMC_INTERRUPT, self.dmc.irq_pending);
        status
    }

    /// $4015 write: channel enables. Disabled channels lose their length counters at once.
    fn write_status(&mut self, data: u8) {
        self.pulse1.set_enabled(data & 0x01 != 0);
        self.pulse2.set_enabled(data & 0x02 != 0);
        self.triangle.set_enabled(data & 0x04 != 0);
        self.noise.set_enabled(data & 0x08 != 0);
        self.dmc.set_enabled(data & 0x10 != 0);
        self.dmc.irq_pending = false;
    }

    fn write_frame_counter(&mut self, data: u8) {
        let odd_cycle = self.cycle % 2 == 1;
        if let Some(event) = self.frame_counter.write(data, odd_cycle) {
            self.clock_frame_event(event);
        }
    }

    /// Advance one CPU cycle. Returns the number of cycles the CPU must stall for a DMC fetch.
    pub fn clock<B: ApuBus>(&mut self, bus: &mut B) -> u8 {
        if let Some(event) = self.frame_counter.clock(self.region) {
            self.clock_frame_event(event);
        }

        self.triangle.tick();
        self.dmc.tick();
        if self.cycle % 2 == 1 {
            self.pulse1.tick();
            self.pulse2.tick();
            self.noise.tick();
        }
        self.cycle += 1;

        match self.dmc.pending_fetch() {
            Some(addr) => {
                // TODO: add the extra stall cycles when the fetch lands on an OAM DMA or a
                // CPU write cycle.
                let byte = bus.dmc_read(addr);
                trace!("DMC fetch ${:04X} = ${:02X}", addr, byte);
                self.dmc.feed_byte(byte);
                DMC_DMA_STALL
            }
            None => 0,
        }
    }

    fn clock_frame_event(&mut self, event: FrameEvent) {
        self.clock_quarter_frame();
        if event == FrameEvent::Half {
            self.clock_half_frame();
        }
    }

    /// Quarter-frame: clock envelope (pulse, noise) and triangle linear counter.
    fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.noise.clock_envelope();
        self.triangle.clock_linear();
    }

    /// Half-frame: clock length counters and sweep units.
    fn clock_half_frame(&mut self) {
        self.pulse1.clock_length();
        self.pulse2.clock_length();
        self.triangle.clock_length();
        self.noise.clock_length();
        self.pulse1.clock_sweep();
        self.pulse2.clock_sweep();
    }

    /// Level or release the IRQ line from sources outside the APU.
    pub fn set_external_irq(&mut self, active: bool) {
        self.external_irq = active;
    }

    pub fn pending_interrupts(&self) -> IrqSource {
        let mut sources = IrqSource::empty();
        sources.set(IrqSource::EXTERNAL, self.external_irq);
        sources.set(IrqSource::FRAME_COUNTER, self.frame_counter.irq_pending);
        sources.set(IrqSource::DMC, self.dmc.irq_pending);
        sources
    }

    pub fn levels(&self) -> ChannelLevels {
        ChannelLevels {
            pulse1: self.pulse1.output(),
            pulse2: self.pulse2.output(),
            triangle: self.triangle.output(),
            noise: self.noise.output(),
            dmc: self.dmc.output(),
        }
    }

    /// Current mixer output, 0.0..~1.0.
    pub fn output_sample(&self) -> f32 {
        mixer::mix(&self.levels())
    }

    pub fn snapshot(&self) -> ApuState {
        ApuState {
            region: self.region,
            cycle: self.cycle,
            pulse1: self.pulse1.clone(),
            pulse2: self.pulse2.clone(),
            triangle: self.triangle.clone(),
            noise: self.noise.clone(),
            dmc: self.dmc.clone(),
            frame_counter: self.frame_counter.clone(),
            external_irq: self.external_irq,
            levels: self.levels(),
        }
    }

    pub fn restore(&mut self, state: &ApuState) {
        self.region = state.region;
        self.cycle = state.cycle;
        self.pulse1 = state.pulse1.clone();
        self.pulse2 = state.pulse2.clone();
        self.triangle = state.triangle.clone();
        self.noise = state.noise.clone();
        self.dmc = state.dmc.clone();
        self.frame_counter = state.frame_counter.clone();
        self.external_irq = state.external_irq;
    }
}
