//! Elaris APU: the NES (Ricoh 2A03) sound engine, cycle-stepped, written in Rust.
//!
//! Implements the audio half of the 2A03 as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/APU), plus what a host needs to hear it.
//!
//! ## Modules (NESdev references)
//!
//! - **apu** – [APU](https://www.nesdev.org/wiki/APU): pulse×2, triangle, noise, DMC,
//!   [frame counter](https://www.nesdev.org/wiki/APU_Frame_Counter),
//!   [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer), NTSC/PAL timing, save states
//! - **audio** – downsampling to 44.1 kHz, lock-free sample queue, rodio playback
//! - **bus** – DMC sample fetches from the [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map)
//! - **player** – replays timed register-write logs through the APU

pub mod apu;
pub mod audio;
pub mod bus;
pub mod player;
