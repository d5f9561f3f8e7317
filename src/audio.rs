//! Audio output: per-cycle mixer samples are averaged down to 44.1 kHz and handed to a rodio
//! playback thread through a bounded single-producer/single-consumer ring buffer.
//!
//! The emulation side never blocks. When the queue is full the newest sample is dropped; when
//! it runs dry the playback side repeats the last sample it saw.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use rodio::{OutputStream, Sink, Source};
use rtrb::{Consumer, Producer, RingBuffer};

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Box-filter decimator from the CPU clock to `SAMPLE_RATE`.
pub struct Downsampler {
    cycles_per_sample: f64,
    phase: f64,
    sum: f64,
    count: u32,
}

impl Downsampler {
    pub fn new(cpu_clock: f64) -> Self {
        Self {
            cycles_per_sample: cpu_clock / SAMPLE_RATE as f64,
            phase: 0.0,
            sum: 0.0,
            count: 0,
        }
    }

    /// Feed one CPU cycle's sample; returns an output sample when one is due.
    pub fn push(&mut self, sample: f32) -> Option<f32> {
        self.sum += sample as f64;
        self.count += 1;
        self.phase += 1.0;
        if self.phase < self.cycles_per_sample {
            return None;
        }
        self.phase -= self.cycles_per_sample;
        let out = (self.sum / self.count as f64) as f32;
        self.sum = 0.0;
        self.count = 0;
        Some(out)
    }
}

/// Create the sample queue holding up to `capacity` samples.
pub fn sample_queue(capacity: usize) -> (SampleProducer, SampleSource) {
    let (producer, consumer) = RingBuffer::new(capacity);
    (
        SampleProducer {
            producer,
            dropped: 0,
        },
        SampleSource {
            consumer,
            last: 0.0,
        },
    )
}

/// Emulation side of the queue.
pub struct SampleProducer {
    producer: Producer<f32>,
    dropped: u64,
}

impl SampleProducer {
    pub fn push(&mut self, sample: f32) {
        if self.producer.push(sample).is_err() {
            if self.dropped == 0 {
                warn!("audio queue full; dropping samples until playback catches up");
            }
            self.dropped += 1;
        }
    }

    /// Samples lost to a full queue so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Playback side of the queue, as an endless mono rodio source.
pub struct SampleSource {
    consumer: Consumer<f32>,
    last: f32,
}

impl Iterator for SampleSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if let Ok(sample) = self.consumer.pop() {
            self.last = sample;
        }
        Some(self.last)
    }
}

impl Source for SampleSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Open audio device playing a `SampleSource`. Playback stops when this is dropped.
pub struct AudioOutput {
    _stream: OutputStream,
    _sink: Sink,
}

impl AudioOutput {
    pub fn open(source: SampleSource) -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("no default audio output device")?;
        let sink = Sink::try_new(&handle).context("failed to create audio sink")?;
        sink.append(source);
        info!("audio output open at {} Hz", SAMPLE_RATE);
        Ok(Self {
            _stream: stream,
            _sink: sink,
        })
    }
}
