//! Register-log player: replays timed APU register writes against an `APU` with a flat sample
//! memory for the DMC, the way a CPU would drive it, and hands the mixed output to a sink.
//!
//! Log format, one write per line:
//!
//! ```text
//! # cycle  addr   value
//! 0        $4015  $0F
//! 29830    0x4003 0x08
//! ```
//!
//! The cycle is decimal; address and value are hex with an optional `$` or `0x` prefix. `#`
//! starts a comment. Cycles never go backwards.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail, ensure};

use crate::{apu::apu::APU, bus::SampleMemory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub cycle: u64,
    pub addr: u16,
    pub value: u8,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterLog {
    pub writes: Vec<RegisterWrite>,
}

impl RegisterLog {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut log = Self::default();
        for (index, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let write = parse_line(line).with_context(|| format!("line {}", index + 1))?;
            if let Some(prev) = log.writes.last() {
                ensure!(
                    write.cycle >= prev.cycle,
                    "line {}: cycle {} is before cycle {}",
                    index + 1,
                    write.cycle,
                    prev.cycle
                );
            }
            log.writes.push(write);
        }
        Ok(log)
    }

    /// Append a write; used to build logs in code.
    pub fn push(&mut self, cycle: u64, addr: u16, value: u8) {
        self.writes.push(RegisterWrite { cycle, addr, value });
    }

    /// Cycle of the last write, or 0 for an empty log.
    pub fn last_cycle(&self) -> u64 {
        self.writes.last().map_or(0, |w| w.cycle)
    }
}

fn parse_line(line: &str) -> Result<RegisterWrite> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [cycle, addr, value] = fields.as_slice() else {
        bail!("expected `<cycle> <addr> <value>`, got {:?}", line);
    };
    let cycle = cycle
        .parse::<u64>()
        .with_context(|| format!("bad cycle {:?}", cycle))?;
    let addr = parse_hex(addr)?;
    ensure!(
        (0x4000..=0x4017).contains(&addr),
        "${:04X} is not an APU register",
        addr
    );
    let value = parse_hex(value)?;
    ensure!(value <= 0xFF, "value ${:X} does not fit in a byte", value);
    Ok(RegisterWrite {
        cycle,
        addr,
        value: value as u8,
    })
}

/// Hex number with an optional `$` or `0x` prefix.
pub fn parse_hex(text: &str) -> Result<u16> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).with_context(|| format!("bad hex number {:?}", text))
}

pub struct Player {
    apu: APU,
    memory: SampleMemory,
    log: RegisterLog,
    next: usize,
    stall_cycles: u64,
}

impl Player {
    pub fn new(apu: APU, memory: SampleMemory, log: RegisterLog) -> Self {
        Self {
            apu,
            memory,
            log,
            next: 0,
            stall_cycles: 0,
        }
    }

    /// Run `cycles` CPU cycles. Writes due at a cycle land before that cycle is clocked;
    /// `sink` receives the mixer output after every cycle.
    pub fn run(&mut self, cycles: u64, mut sink: impl FnMut(f32)) {
        for _ in 0..cycles {
            let now = self.apu.cycle();
            while let Some(write) = self.log.writes.get(self.next).copied() {
                if write.cycle > now {
                    break;
                }
                self.apu.write(write.addr, write.value);
                self.next += 1;
            }
            self.stall_cycles += self.apu.clock(&mut self.memory) as u64;
            sink(self.apu.output_sample());
        }
    }

    pub fn apu(&self) -> &APU {
        &self.apu
    }

    pub fn memory(&self) -> &SampleMemory {
        &self.memory
    }

    /// CPU cycles the DMC has stolen so far.
    pub fn stall_cycles(&self) -> u64 {
        self.stall_cycles
    }

    /// All writes in the log have been applied.
    pub fn is_finished(&self) -> bool {
        self.next >= self.log.writes.len()
    }
}

/// Where the demo's DMC sample lives.
pub const DEMO_SAMPLE_BASE: u16 = 0xC000;

/// 17-byte DMC sample: eight bytes of rising deltas then nine of falling ones, a short thump.
pub fn demo_memory() -> SampleMemory {
    let mut sample = [0x00u8; 17];
    sample[..8].fill(0xFF);
    let mut memory = SampleMemory::new();
    memory.load(DEMO_SAMPLE_BASE, &sample);
    memory
}

/// Built-in tune for NTSC: a C major arpeggio on pulse 1, a bass line on the triangle, noise
/// hi-hats and a DMC thump on every bar.
pub fn demo_log() -> RegisterLog {
    const STEP: u64 = 29830 * 8 / 4;
    const ARPEGGIO: [u16; 4] = [0x1AB, 0x152, 0x11C, 0x0D5];
    const BASS: [u16; 2] = [0x1AB, 0x23A];

    let mut log = RegisterLog::default();
    log.push(0, 0x4017, 0x40);
    log.push(0, 0x4000, 0x84);
    log.push(0, 0x4001, 0x00);
    log.push(0, 0x4008, 0xFF);
    log.push(0, 0x400C, 0x01);
    log.push(0, 0x400E, 0x03);
    log.push(0, 0x4010, 0x0E);
    log.push(0, 0x4011, 0x40);
    log.push(0, 0x4012, ((DEMO_SAMPLE_BASE - 0xC000) / 64) as u8);
    log.push(0, 0x4013, 0x01);
    log.push(0, 0x4015, 0x0F);

    for step in 0..32u64 {
        let cycle = step * STEP;
        let note = ARPEGGIO[step as usize % ARPEGGIO.len()];
        log.push(cycle, 0x4002, note as u8);
        log.push(cycle, 0x4003, 0x08 | (note >> 8) as u8);
        if step % 4 == 0 {
            let bass = BASS[(step / 4) as usize % BASS.len()];
            log.push(cycle, 0x400A, bass as u8);
            log.push(cycle, 0x400B, 0x08 | (bass >> 8) as u8);
            log.push(cycle, 0x4015, 0x1F);
        }
        if step % 2 == 1 {
            log.push(cycle, 0x400F, 0x08);
        }
    }
    log.push(32 * STEP, 0x4015, 0x00);
    log
}
