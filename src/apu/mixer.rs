//! [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer): non-linear combination of the pulse group
//! and the triangle/noise/DMC group.

use serde::{Deserialize, Serialize};

/// Instantaneous channel levels fed to the mixer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLevels {
    pub pulse1: u8,
    pub pulse2: u8,
    pub triangle: u8,
    pub noise: u8,
    pub dmc: u8,
}

/// Pulse output: 95.88 / (8128 / (pulse1 + pulse2) + 100).
pub fn pulse_out(pulse1: u8, pulse2: u8) -> f32 {
    let n = pulse1 as f32 + pulse2 as f32;
    if n == 0.0 {
        return 0.0;
    }
    95.88 / (8128.0 / n + 100.0)
}

/// TND output: 159.79 / (1 / (triangle/8227 + noise/12241 + dmc/22638) + 100).
pub fn tnd_out(triangle: u8, noise: u8, dmc: u8) -> f32 {
    let n = triangle as f32 / 8227.0 + noise as f32 / 12241.0 + dmc as f32 / 22638.0;
    if n == 0.0 {
        return 0.0;
    }
    159.79 / (1.0 / n + 100.0)
}

/// Mixed sample in 0.0..~1.0.
pub fn mix(levels: &ChannelLevels) -> f32 {
    pulse_out(levels.pulse1, levels.pulse2) + tnd_out(levels.triangle, levels.noise, levels.dmc)
}
