//! [Frame counter](https://www.nesdev.org/wiki/APU_Frame_Counter) ($4017): 4-step or 5-step
//! sequencer that clocks envelopes/linear counter (quarter frame) and length/sweep (half frame).

use log::debug;
use serde::{Deserialize, Serialize};

use crate::apu::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// Envelopes and triangle linear counter.
    Quarter,
    /// Quarter-frame work plus length counters and sweep units.
    Half,
}

const EVENTS_4STEP: [Option<FrameEvent>; 4] = [
    Some(FrameEvent::Quarter),
    Some(FrameEvent::Half),
    Some(FrameEvent::Quarter),
    Some(FrameEvent::Half),
];

const EVENTS_5STEP: [Option<FrameEvent>; 5] = [
    Some(FrameEvent::Quarter),
    Some(FrameEvent::Half),
    Some(FrameEvent::Quarter),
    None,
    Some(FrameEvent::Half),
];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounter {
    pub five_step: bool,
    pub irq_inhibit: bool,
    pub irq_pending: bool,
    /// Next step to fire; wraps modulo 4 or 5.
    pub step: u8,
    /// CPU cycles since the sequence started.
    pub cycle: u32,
    /// A $4017 write on an odd CPU cycle starts the new sequence one cycle late.
    pub write_delay: bool,
    /// Last value written to $4017, rewritten on soft reset.
    pub last_write: u8,
}

impl FrameCounter {
    /// $4017: mode (bit 7), IRQ inhibit (bit 6). Restarts the sequence; 5-step mode also clocks
    /// a half frame right away, which the caller performs.
    pub fn write(&mut self, data: u8, odd_cycle: bool) -> Option<FrameEvent> {
        self.five_step = data & 0x80 != 0;
        self.irq_inhibit = data & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_pending = false;
        }
        self.last_write = data;
        self.step = 0;
        self.cycle = 0;
        self.write_delay = odd_cycle;
        debug!(
            "frame counter: {}-step, irq {}",
            if self.five_step { 5 } else { 4 },
            if self.irq_inhibit { "inhibited" } else { "enabled" }
        );
        self.five_step.then_some(FrameEvent::Half)
    }

    /// Advance one CPU cycle, returning the event due on this cycle.
    pub fn clock(&mut self, region: Region) -> Option<FrameEvent> {
        if self.write_delay {
            self.write_delay = false;
            return None;
        }
        self.cycle += 1;

        let schedule = region.frame_schedule(self.five_step);
        let mut event = None;
        if schedule.steps.get(self.step as usize) == Some(&self.cycle) {
            if self.five_step {
                event = EVENTS_5STEP[self.step as usize];
            } else {
                event = EVENTS_4STEP[self.step as usize];
                if self.step == 3 && !self.irq_inhibit {
                    self.irq_pending = true;
                }
            }
            self.step = (self.step + 1) % schedule.steps.len() as u8;
        }
        if self.cycle >= schedule.length {
            self.cycle = 0;
        }
        event
    }
}
