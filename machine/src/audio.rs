//! Speaker-line PCM stream.
//!
//! The engine resamples the 1-bit speaker output into 16-bit
//! little-endian stereo PCM and pushes it into a shared byte FIFO; the
//! host's audio thread drains it through an [`AudioReader`]. The FIFO is
//! the only structure crossing a thread boundary in the whole engine.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Mutex};

const PCM_LOW: u16 = 0x0000;
const PCM_HIGH: u16 = 0x4000;

/// Shared ring of raw PCM bytes. The engine thread pushes samples in;
/// the host audio callback pops them out.
type AudioRing = Arc<Mutex<VecDeque<u8>>>;

pub struct AudioBuffer {
    ring: AudioRing,
    sample_rate: u32,
    /// FIFO bound: one second of stereo 16-bit audio. Overflow drops the
    /// oldest bytes so a stalled consumer rejoins near real time.
    capacity: usize,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            ring: Arc::new(Mutex::new(VecDeque::with_capacity(4096))),
            sample_rate,
            capacity: sample_rate as usize * 4,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Append one stereo sample of the current speaker level.
    pub fn push_sample(&self, high: bool) {
        let [lo, hi] = if high { PCM_HIGH } else { PCM_LOW }.to_le_bytes();
        let mut ring = self.ring.lock().unwrap();
        while ring.len() + 4 > self.capacity {
            ring.pop_front();
        }
        ring.extend([lo, hi, lo, hi]);
    }

    /// Number of buffered PCM bytes (diagnostics and tests).
    pub fn buffered_bytes(&self) -> usize {
        self.ring.lock().unwrap().len()
    }

    /// A drain handle for the host audio thread. Handles stay valid
    /// across hard resets; the ring they point at lives as long as the
    /// engine.
    pub fn reader(&self) -> AudioReader {
        AudioReader {
            ring: Arc::clone(&self.ring),
            sample_rate: self.sample_rate,
        }
    }
}

/// Consumer side of the PCM FIFO.
pub struct AudioReader {
    ring: AudioRing,
    sample_rate: u32,
}

impl Read for AudioReader {
    /// Fill `buf` with as many buffered bytes as available and return
    /// that count. An empty FIFO is primed with ~5 ms of silence first,
    /// so an underrun never starves the audio device.
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut ring = self.ring.lock().unwrap();
        if ring.is_empty() {
            let frames = (self.sample_rate / 200) as usize;
            ring.extend(std::iter::repeat(0u8).take(frames * 4));
        }

        let n = buf.len().min(ring.len());
        for slot in &mut buf[..n] {
            *slot = ring.pop_front().unwrap();
        }
        Ok(n)
    }
}
