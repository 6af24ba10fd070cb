//! Firmware image loading and the per-variant ROM description.
//!
//! The host supplies the three firmware dumps (`a64.bin`, `b64.bin`,
//! `c64.bin`) either from a directory of extracted files or as byte
//! slices (for testing). Images are validated at machine construction:
//! an empty or oversized blob is unrecoverable.

use std::path::Path;

/// Largest firmware image: the ROM occupies at most the bottom 16 KiB.
pub const MAX_ROM_SIZE: usize = 0x4000;

// ---------------------------------------------------------------------------
// Variants and firmware labels
// ---------------------------------------------------------------------------

/// Firmware variant of the machine. "A" and "B" drive the monochrome
/// display; "C" is the color model with its own ROM layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RomVariant {
    A,
    B,
    C,
}

impl RomVariant {
    /// File name of the firmware dump for this variant.
    pub fn image_name(self) -> &'static str {
        match self {
            Self::A => "a64.bin",
            Self::B => "b64.bin",
            Self::C => "c64.bin",
        }
    }
}

impl std::fmt::Display for RomVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
        }
    }
}

/// Entry points of the firmware subroutines the engine hooks or watches.
/// Not every label exists in every ROM; `address_of` returns `None` for
/// the unmapped pairs and callers must not ask for them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RomLabel {
    /// Tape byte-read subroutine (hooked to stream from the PTP image).
    InByte,
    /// Tape header-read subroutine.
    RdHead,
    /// Tape sync-detection subroutine.
    RdSyn,
    /// Keyboard scan subroutine (its repeat count is patched at load).
    Gombm,
    /// RAM initialization; reaching it marks the machine as booted.
    Init,
    /// Soft-reset entry (A/B only).
    Reset,
    /// Jump inside the C ROM's NMI handler that deadlocks after reset.
    NmiStuck,
}

/// Literal subroutine addresses per firmware image.
pub fn address_of(variant: RomVariant, label: RomLabel) -> Option<u16> {
    use RomLabel::*;
    use RomVariant::*;
    match (label, variant) {
        (InByte, A | B) => Some(0x3CAB),
        (InByte, C) => Some(0x0DCC),
        (RdHead, A | B) => Some(0x3B36),
        (RdHead, C) => Some(0x0C58),
        (RdSyn, A | B) => Some(0x3C75),
        (RdSyn, C) => Some(0x0D96),
        (Gombm, A | B) => Some(0x3921),
        (Gombm, C) => None,
        (Init, A | B) => Some(0x3178),
        (Init, C) => Some(0x00C9),
        (Reset, A | B) => Some(0x316A),
        (Reset, C) => None,
        (NmiStuck, A | B) => None,
        (NmiStuck, C) => Some(0x3E7F),
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating firmware images.
#[derive(Debug)]
pub enum RomError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// The image for the requested variant is empty or was never loaded.
    EmptyImage(&'static str),

    /// The image does not fit under the ROM ceiling.
    Oversized {
        file: &'static str,
        len: usize,
        max: usize,
    },
}

impl std::fmt::Display for RomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::EmptyImage(name) => write!(f, "firmware image {name} is empty"),
            Self::Oversized { file, len, max } => {
                write!(f, "firmware image {file}: {len} bytes exceeds {max}")
            }
        }
    }
}

impl std::error::Error for RomError {}

impl From<std::io::Error> for RomError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

/// The three firmware dumps, loaded from disk or provided
/// programmatically.
pub struct RomSet {
    a64: Vec<u8>,
    b64: Vec<u8>,
    c64: Vec<u8>,
}

impl RomSet {
    /// Read `a64.bin`, `b64.bin` and `c64.bin` from a directory.
    pub fn from_directory(path: &Path) -> Result<Self, RomError> {
        Ok(Self {
            a64: std::fs::read(path.join(RomVariant::A.image_name()))?,
            b64: std::fs::read(path.join(RomVariant::B.image_name()))?,
            c64: std::fs::read(path.join(RomVariant::C.image_name()))?,
        })
    }

    /// Build a set from in-memory images (tests and embedded hosts).
    pub fn from_slices(a64: &[u8], b64: &[u8], c64: &[u8]) -> Self {
        Self {
            a64: a64.to_vec(),
            b64: b64.to_vec(),
            c64: c64.to_vec(),
        }
    }

    /// The raw image for a variant, validated for plausibility.
    pub fn image(&self, variant: RomVariant) -> Result<&[u8], RomError> {
        let data = match variant {
            RomVariant::A => &self.a64,
            RomVariant::B => &self.b64,
            RomVariant::C => &self.c64,
        };
        if data.is_empty() {
            return Err(RomError::EmptyImage(variant.image_name()));
        }
        if data.len() > MAX_ROM_SIZE {
            return Err(RomError::Oversized {
                file: variant.image_name(),
                len: data.len(),
                max: MAX_ROM_SIZE,
            });
        }
        Ok(data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_per_variant() {
        assert_eq!(address_of(RomVariant::A, RomLabel::InByte), Some(0x3CAB));
        assert_eq!(address_of(RomVariant::B, RomLabel::InByte), Some(0x3CAB));
        assert_eq!(address_of(RomVariant::C, RomLabel::InByte), Some(0x0DCC));
        assert_eq!(address_of(RomVariant::C, RomLabel::Init), Some(0x00C9));
    }

    #[test]
    fn unmapped_labels_are_absent() {
        assert_eq!(address_of(RomVariant::C, RomLabel::Gombm), None);
        assert_eq!(address_of(RomVariant::C, RomLabel::Reset), None);
        assert_eq!(address_of(RomVariant::A, RomLabel::NmiStuck), None);
        assert_eq!(address_of(RomVariant::B, RomLabel::NmiStuck), None);
    }

    #[test]
    fn empty_image_is_rejected() {
        let roms = RomSet::from_slices(&[], &[0x00], &[0x00]);
        assert!(matches!(
            roms.image(RomVariant::A),
            Err(RomError::EmptyImage("a64.bin"))
        ));
        assert!(roms.image(RomVariant::B).is_ok());
    }

    #[test]
    fn oversized_image_is_rejected() {
        let big = vec![0u8; MAX_ROM_SIZE + 1];
        let roms = RomSet::from_slices(&big, &[0x00], &[0x00]);
        assert!(matches!(
            roms.image(RomVariant::A),
            Err(RomError::Oversized { .. })
        ));
    }

    #[test]
    fn from_directory_reads_all_three() {
        let dir = std::env::temp_dir().join("primo_rom_set_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a64.bin"), [0xAA]).unwrap();
        std::fs::write(dir.join("b64.bin"), [0xBB]).unwrap();
        std::fs::write(dir.join("c64.bin"), [0xCC]).unwrap();

        let roms = RomSet::from_directory(&dir).unwrap();
        assert_eq!(roms.image(RomVariant::A).unwrap(), &[0xAA]);
        assert_eq!(roms.image(RomVariant::B).unwrap(), &[0xBB]);
        assert_eq!(roms.image(RomVariant::C).unwrap(), &[0xCC]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
