use bitflags::bitflags;

bitflags! {
    /// $4015 read value.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const PULSE1          = 0b0000_0001;
        const PULSE2          = 0b0000_0010;
        const TRIANGLE        = 0b0000_0100;
        const NOISE           = 0b0000_1000;
        const DMC_ACTIVE      = 0b0001_0000;
        const FRAME_INTERRUPT = 0b0100_0000;
        const DMC_INTERRUPT   = 0b1000_0000;
    }

    /// Sources holding the CPU IRQ line low.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct IrqSource: u8 {
        /// Raised outside the APU (e.g. a mapper), reported by the host.
        const EXTERNAL      = 0b0001;
        const FRAME_COUNTER = 0b0010;
        const DMC           = 0b0100;
    }
}
