//! The Primo machine: CPU, bus, and the per-frame scheduler.

use std::time::Instant;

use log::{debug, info};
use primo_core::bus::Bus;
use primo_core::cpu::z80::Z80;

use crate::audio::{AudioBuffer, AudioReader};
use crate::io::Io;
use crate::memory::{Memory, ScreenPage};
use crate::patch;
use crate::rom::{RomError, RomLabel, RomSet, RomVariant};
use crate::tape::TapePlayer;

/// Emulated ticks per second. One tick per host frame; the VBLANK signal
/// runs at the same rate.
pub const TICK_RATE: u32 = 50;

/// VBLANK window length in seconds of emulated time.
const VBLANK_LENGTH: f64 = 0.0016;

/// Selectable CPU clocks (Hz).
pub const CLOCK_NORMAL: u32 = 2_500_000;
pub const CLOCK_SPECTRUM: u32 = 3_500_000;
pub const CLOCK_TURBO: u32 = 3_750_000;

/// Everything the CPU sees over its pins: memory, the port decoder, and
/// the /NMI latch. A sibling field of the CPU, so stepping needs no
/// self-referential tricks — just `cpu.step(&mut bus)`.
pub struct PrimoBus {
    pub memory: Memory,
    pub io: Io,
    pub tape: TapePlayer,
}

impl Bus for PrimoBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory.write(addr, data);
    }

    fn io_read(&mut self, port: u8) -> u8 {
        self.io.read(port)
    }

    fn io_write(&mut self, port: u8, data: u8) {
        self.io.write(port, data);
    }

    fn take_nmi(&mut self) -> bool {
        self.io.check_nmi()
    }
}

/// The assembled machine. The host drives it with explicit method
/// calls: one [`tick`](Self::tick) per frame, [`framebuffer`] for video,
/// an [`audio_reader`] handle for the audio device.
///
/// [`framebuffer`]: Self::framebuffer
/// [`audio_reader`]: Self::audio_reader
pub struct PrimoSystem {
    pub cpu: Z80,
    pub bus: PrimoBus,

    roms: RomSet,
    audio: AudioBuffer,
    sample_rate: u32,
    cycles_since_sample: f64,

    /// Latched once the firmware reaches its INIT label; NMIs are armed
    /// only from then on.
    ram_initialized: bool,

    // Measured-clock bookkeeping
    freq_cycles: u64,
    freq_since: Instant,
}

impl PrimoSystem {
    pub fn new(roms: RomSet, variant: RomVariant, sample_rate: u32) -> Result<Self, RomError> {
        let memory = Memory::new(&roms, variant)?;
        Ok(Self {
            cpu: Z80::new(),
            bus: PrimoBus {
                memory,
                io: Io::new(),
                tape: TapePlayer::new(),
            },
            roms,
            audio: AudioBuffer::new(sample_rate),
            sample_rate,
            cycles_since_sample: 0.0,
            ram_initialized: false,
            freq_cycles: 0,
            freq_since: Instant::now(),
        })
    }

    pub fn variant(&self) -> RomVariant {
        self.bus.memory.variant()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn ram_initialized(&self) -> bool {
        self.ram_initialized
    }

    /// Advance the machine by 1/50 s of emulated time.
    ///
    /// The key set and reset line are sampled once here; every cycle of
    /// the tick observes the same input state. Within the loop the order
    /// is fixed: patch hooks, audio sampling, then the CPU step.
    pub fn tick(&mut self, clock_hz: u32, muted: bool, keys: &[u8], reset_line: bool) {
        self.bus.io.set_pressed_keys(keys);
        self.bus.io.reset_line = reset_line;

        let cycles_per_tick = clock_hz / TICK_RATE;
        let vblank_cycles = (VBLANK_LENGTH * clock_hz as f64) as u32;

        if self.ram_initialized {
            self.bus.io.nmi_next = true;
        }

        let init_addr = self.bus.memory.label_addr(RomLabel::Init);
        let mut i: u32 = 0;
        while i < cycles_per_tick {
            // 50 Hz VBLANK signal, asserted at the top of the tick
            self.bus.io.vblank = i < vblank_cycles;

            if self.cpu.pc == init_addr && !self.ram_initialized {
                debug!("firmware INIT reached, arming NMI from next tick");
                self.ram_initialized = true;
            }

            patch::apply(&mut self.cpu, &self.bus.memory, &mut self.bus.tape);
            self.sample_audio(clock_hz, muted);

            self.cpu.step(&mut self.bus);
            i += self.cpu.last_op_cycles;
        }

        self.freq_cycles += i as u64;
    }

    /// Resample the speaker line against the host sample rate. Runs on
    /// the previous instruction's cycle count, immediately before the
    /// next step executes.
    fn sample_audio(&mut self, clock_hz: u32, muted: bool) {
        if muted {
            return;
        }

        self.cycles_since_sample += self.cpu.last_op_cycles as f64;
        let cycles_per_sample = clock_hz as f64 / self.sample_rate as f64;
        if self.cycles_since_sample > cycles_per_sample {
            self.cycles_since_sample -= cycles_per_sample;
            self.audio.push_sample(self.bus.io.speaker);
        }
    }

    /// Hard reset: fresh CPU and I/O against the surviving memory image;
    /// the tape rewinds but stays loaded.
    pub fn hard_reset(&mut self) {
        info!("hard reset ({} ROM)", self.variant());
        self.cpu = Z80::new();
        self.bus.io = Io::new();
        self.bus.tape.reset();
        self.ram_initialized = false;
    }

    /// Switch firmware: rebuild memory from the ROM set, then hard
    /// reset. On error the running machine is left untouched.
    pub fn set_variant(&mut self, variant: RomVariant) -> Result<(), RomError> {
        self.bus.memory = Memory::new(&self.roms, variant)?;
        info!("ROM switched to variant {variant}");
        self.hard_reset();
        Ok(())
    }

    /// Swap the cassette image.
    pub fn load_tape(&mut self, data: Vec<u8>) {
        info!("tape changed ({} bytes)", data.len());
        self.bus.tape.change_tape(data);
    }

    /// Decode a screen page. Returns (width, height, RGBA bytes).
    pub fn framebuffer(&self, page: ScreenPage) -> (u32, u32, Vec<u8>) {
        let (w, h) = self.bus.memory.screen_resolution(page);
        (w, h, self.bus.memory.decode_screen(page))
    }

    /// Page currently selected by the firmware's video latch.
    pub fn active_page(&self) -> ScreenPage {
        if self.bus.io.primary_video {
            ScreenPage::Primary
        } else {
            ScreenPage::Secondary
        }
    }

    /// Drain handle for the host audio thread.
    pub fn audio_reader(&self) -> AudioReader {
        self.audio.reader()
    }

    /// The PCM buffer itself (host diagnostics: fill level, sample rate).
    pub fn audio(&self) -> &AudioBuffer {
        &self.audio
    }

    /// Cycles executed since the last query, divided by elapsed host
    /// time. Feeds the host's measured-clock readout.
    pub fn measured_cycles_per_sec(&mut self) -> u64 {
        let elapsed = self.freq_since.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            (self.freq_cycles as f64 / elapsed) as u64
        } else {
            0
        };
        self.freq_cycles = 0;
        self.freq_since = Instant::now();
        rate
    }
}
