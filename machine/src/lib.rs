//! Emulation engine for the Primo 8-bit home-computer family.
//!
//! Models the three firmware variants ("A", "B" and the color "C"): a
//! Z80 running the original ROM against a 64 KiB address space, the
//! port-decoded I/O (keyboard strobe, vblank, reset line, speaker,
//! screen paging), a 50 Hz tick scheduler with NMI arbitration, a PTP
//! cassette player wired in through runtime firmware patches, and a
//! PCM resampler for the 1-bit speaker.
//!
//! The engine is a single object graph driven synchronously by the
//! host — one [`PrimoSystem::tick`] per frame. Display, input and the
//! audio device are host concerns; the only structure shared across
//! threads is the audio byte FIFO behind [`AudioReader`].

pub mod audio;
pub mod io;
pub mod memory;
pub mod patch;
pub mod rom;
pub mod system;
pub mod tape;

pub use audio::AudioReader;
pub use io::Io;
pub use memory::{ColoringMode, Memory, ScreenPage};
pub use rom::{RomError, RomLabel, RomSet, RomVariant};
pub use system::{CLOCK_NORMAL, CLOCK_SPECTRUM, CLOCK_TURBO, PrimoSystem, TICK_RATE};
pub use tape::TapePlayer;
