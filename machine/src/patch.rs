//! Runtime firmware patches.
//!
//! The cassette subroutines in ROM bit-bang a real tape recorder through
//! the I/O ports; the engine instead streams bytes straight from the
//! loaded PTP image. Each patch is a PC-matched hook, evaluated before
//! the CPU decodes that address, that rewrites registers and jumps over
//! the hardware-facing code. Two more hooks work around reset bugs that
//! differ per firmware.
//!
//! Patch sites resolve through the label table, so they follow whichever
//! ROM is active. Every hook is guarded by exact PC equality and is a
//! no-op anywhere else.

use primo_core::cpu::z80::Z80;

use crate::memory::Memory;
use crate::rom::{RomLabel, RomVariant};
use crate::tape::TapePlayer;

/// Bytes to jump over RDSYN's sync-detection loop.
const RDSYN_SKIP: u16 = 8;
/// Offset from INBYTE's entry to its RET.
const INBYTE_SKIP: u16 = 13;
/// The cassette-handling body of RDHEAD starts 9 bytes in and is 110
/// bytes long.
const RDHEAD_HOOK_OFFSET: u16 = 9;
const RDHEAD_SKIP: u16 = 110;

/// Evaluate every patch hook against the current PC. Called by the
/// scheduler immediately before each CPU step.
pub fn apply(cpu: &mut Z80, memory: &Memory, tape: &mut TapePlayer) {
    patch_ptp_load(cpu, memory, tape);
    patch_stuck_nmi_handler(cpu, memory);
    patch_stuck_nmi_flag(cpu, memory);
}

/// Hijack the tape-read subroutines to stream from the PTP image.
fn patch_ptp_load(cpu: &mut Z80, memory: &Memory, tape: &mut TapePlayer) {
    // Skip sync reading in the RDSYN subroutine
    if cpu.pc == memory.label_addr(RomLabel::RdSyn) {
        cpu.pc = cpu.pc.wrapping_add(RDSYN_SKIP);
    }

    // Replace the INBYTE subroutine body: deliver the next tape byte in
    // A, keep the running checksum in D, and land on the RET
    if cpu.pc == memory.label_addr(RomLabel::InByte) {
        let byte = tape.next_byte();
        cpu.d = cpu.d.wrapping_add(byte);
        cpu.a = byte;
        cpu.pc = cpu.pc.wrapping_add(INBYTE_SKIP);
    }

    // Skip cassette handling inside the RDHEAD subroutine
    if cpu.pc == memory.label_addr(RomLabel::RdHead).wrapping_add(RDHEAD_HOOK_OFFSET) {
        cpu.pc = cpu.pc.wrapping_add(RDHEAD_SKIP);
    }
}

/// The "C" firmware jams inside its NMI handler after a hard reset;
/// step over the jump that loops.
fn patch_stuck_nmi_handler(cpu: &mut Z80, memory: &Memory) {
    if memory.variant() != RomVariant::C {
        return;
    }

    if cpu.pc == memory.label_addr(RomLabel::NmiStuck) {
        cpu.pc = cpu.pc.wrapping_add(1);
    }
}

/// Soft reset on the "A"/"B" firmware never executes the RETN that
/// would release the CPU's NMI latch; drop it by hand at the reset
/// entry point.
fn patch_stuck_nmi_flag(cpu: &mut Z80, memory: &Memory) {
    if memory.variant() == RomVariant::C {
        return;
    }

    if cpu.pc == memory.label_addr(RomLabel::Reset) {
        cpu.in_nmi = false;
    }
}
