//! NES APU (Audio Processing Unit) emulation.
//!
//! - **Pulse** (×2): square waves with duty, envelope, sweep, length counter.
//! - **Triangle**: 32-step wave, linear counter, length counter.
//! - **Noise**: LFSR-based, envelope, length counter.
//! - **DMC**: delta-modulated samples fetched from CPU memory, with IRQ on completion.
//! - **Frame counter**: 4-step or 5-step mode; clocks envelope/linear/length/sweep.
//! - **Mixer**: NES-style non-linear mix of the five channel levels.

pub mod apu;
pub mod dmc;
pub mod flags;
pub mod frame_counter;
pub mod mixer;
pub mod noise;
pub mod pulse;
pub mod region;
pub mod state;
pub mod triangle;
pub mod units;
