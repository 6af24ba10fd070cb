#![allow(dead_code)]

use primo_machine::{PrimoSystem, RomSet, RomVariant};

pub const ROM_SIZE: usize = 0x4000;
pub const SAMPLE_RATE: u32 = 44_100;

/// Blank 16 KiB firmware image (all NOPs).
pub fn blank_rom() -> Vec<u8> {
    vec![0u8; ROM_SIZE]
}

/// Firmware image with byte sequences placed at given offsets.
pub fn rom_with(patches: &[(usize, &[u8])]) -> Vec<u8> {
    let mut rom = blank_rom();
    for (off, bytes) in patches {
        rom[*off..*off + bytes.len()].copy_from_slice(bytes);
    }
    rom
}

pub fn rom_set() -> RomSet {
    let rom = blank_rom();
    RomSet::from_slices(&rom, &rom, &rom)
}

/// A machine running a blank firmware image.
pub fn system(variant: RomVariant) -> PrimoSystem {
    PrimoSystem::new(rom_set(), variant, SAMPLE_RATE).unwrap()
}

/// A machine whose variant-A image carries the given program bytes.
pub fn system_with_program(patches: &[(usize, &[u8])]) -> PrimoSystem {
    let rom = rom_with(patches);
    let blank = blank_rom();
    let roms = RomSet::from_slices(&rom, &blank, &blank);
    PrimoSystem::new(roms, RomVariant::A, SAMPLE_RATE).unwrap()
}

/// A minimal well-formed PTP image: one data block with three bytes.
pub fn sample_ptp() -> Vec<u8> {
    vec![0x55, 0x03, 0x00, 0xAA, 0xBB, 0xCC]
}
