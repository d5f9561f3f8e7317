//! Save-state view of the whole APU.

use serde::{Deserialize, Serialize};

use crate::apu::{
    dmc::Dmc, frame_counter::FrameCounter, mixer::ChannelLevels, noise::Noise, pulse::Pulse,
    region::Region, triangle::Triangle,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApuState {
    pub region: Region,
    pub cycle: u64,
    pub pulse1: Pulse,
    pub pulse2: Pulse,
    pub triangle: Triangle,
    pub noise: Noise,
    pub dmc: Dmc,
    pub frame_counter: FrameCounter,
    pub external_irq: bool,
    /// Mixer inputs when the snapshot was taken. Derived; ignored on restore.
    pub levels: ChannelLevels,
}
