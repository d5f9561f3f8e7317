//! Host memory access used by the APU's DMC memory reader.

/// What the APU needs from the CPU memory map: a byte read for DMC sample fetches.
///
/// A fetch stalls the CPU; `APU::clock` returns the stall length so the host can pause its
/// instruction stream accordingly.
pub trait ApuBus {
    fn dmc_read(&mut self, addr: u16) -> u8;
}

impl<F: FnMut(u16) -> u8> ApuBus for F {
    fn dmc_read(&mut self, addr: u16) -> u8 {
        self(addr)
    }
}

/// Flat 64 KiB address space holding DMC sample data, for playing register logs without a
/// cartridge.
pub struct SampleMemory {
    pub mem: Vec<u8>,
    /// Number of DMC fetches served.
    pub reads: u64,
}

impl Default for SampleMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleMemory {
    pub fn new() -> Self {
        Self {
            mem: vec![0; 0x10000],
            reads: 0,
        }
    }

    /// Copy `data` to `base`, wrapping past $FFFF.
    pub fn load(&mut self, base: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let addr = base.wrapping_add(i as u16);
            self.mem[addr as usize] = byte;
        }
    }
}

impl ApuBus for SampleMemory {
    fn dmc_read(&mut self, addr: u16) -> u8 {
        self.reads += 1;
        self.mem[addr as usize]
    }
}
