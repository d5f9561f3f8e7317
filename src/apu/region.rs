//! Console region timing: CPU clock, frame counter schedule, and the noise/DMC period tables.
//!
//! NTSC and PAL 2A03/2A07 differ only in these constants; every channel reads its table through
//! the region so a single `APU` type serves both. See
//! [Cycle reference chart](https://www.nesdev.org/wiki/Cycle_reference_chart).

use serde::{Deserialize, Serialize};

/// Noise period table (NTSC), in CPU cycles. APU_Noise.
const NOISE_PERIODS_NTSC: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// Noise period table (PAL), in CPU cycles.
const NOISE_PERIODS_PAL: [u16; 16] = [
    4, 8, 14, 30, 60, 88, 118, 148, 188, 236, 354, 472, 708, 944, 1890, 3778,
];

/// DMC rate table (NTSC): CPU cycles per output bit. APU_DMC.
const DMC_RATES_NTSC: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// DMC rate table (PAL).
const DMC_RATES_PAL: [u16; 16] = [
    398, 354, 316, 298, 276, 236, 210, 198, 176, 148, 132, 118, 98, 78, 66, 50,
];

/// Frame counter schedule for one mode: the CPU cycle of each step and the cycle at which the
/// sequence starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSchedule {
    pub steps: &'static [u32],
    pub length: u32,
}

const NTSC_4STEP: FrameSchedule = FrameSchedule {
    steps: &[7457, 14913, 22371, 29829],
    length: 29830,
};

const NTSC_5STEP: FrameSchedule = FrameSchedule {
    steps: &[7457, 14913, 22371, 29829, 37281],
    length: 37282,
};

const PAL_4STEP: FrameSchedule = FrameSchedule {
    steps: &[8313, 16627, 24939, 33253],
    length: 33254,
};

const PAL_5STEP: FrameSchedule = FrameSchedule {
    steps: &[8313, 16627, 24939, 33253, 41565],
    length: 41566,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
}

impl Region {
    /// CPU clock in Hz.
    pub fn cpu_clock(self) -> f64 {
        match self {
            Region::Ntsc => 1_789_773.0,
            Region::Pal => 1_662_607.0,
        }
    }

    pub fn frame_schedule(self, five_step: bool) -> FrameSchedule {
        match (self, five_step) {
            (Region::Ntsc, false) => NTSC_4STEP,
            (Region::Ntsc, true) => NTSC_5STEP,
            (Region::Pal, false) => PAL_4STEP,
            (Region::Pal, true) => PAL_5STEP,
        }
    }

    pub fn noise_periods(self) -> &'static [u16; 16] {
        match self {
            Region::Ntsc => &NOISE_PERIODS_NTSC,
            Region::Pal => &NOISE_PERIODS_PAL,
        }
    }

    pub fn dmc_rates(self) -> &'static [u16; 16] {
        match self {
            Region::Ntsc => &DMC_RATES_NTSC,
            Region::Pal => &DMC_RATES_PAL,
        }
    }

    /// CPU cycles in one 4-step frame sequence, used to pace playback at the video frame rate.
    pub fn cycles_per_frame(self) -> u32 {
        self.frame_schedule(false).length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_end_one_cycle_after_last_step() {
        for region in [Region::Ntsc, Region::Pal] {
            for five_step in [false, true] {
                let schedule = region.frame_schedule(five_step);
                assert_eq!(schedule.steps.len(), if five_step { 5 } else { 4 });
                assert_eq!(schedule.length, schedule.steps[schedule.steps.len() - 1] + 1);
                assert!(schedule.steps.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn period_tables_are_even_cpu_cycle_counts() {
        // Noise is clocked at APU rate, so every entry must divide by two.
        for region in [Region::Ntsc, Region::Pal] {
            assert!(region.noise_periods().iter().all(|p| p % 2 == 0));
        }
    }
}
