//! PTP cassette-image streaming.
//!
//! A PTP file is an optional 3-byte header (first byte 0xFF) followed by
//! length-prefixed blocks: a type byte (0x55 data, 0xAA closing) and a
//! 16-bit little-endian length. The player hands out one payload byte at
//! a time, parsing block headers on demand and rewinding when the tape
//! runs out.

use log::warn;

const PTP_HEADER: u8 = 0xFF;
const DATA_BLOCK_HEADER: u8 = 0x55;
const CLOSING_BLOCK_HEADER: u8 = 0xAA;

pub struct TapePlayer {
    tape: Vec<u8>,
    pos: usize,
    block_remaining: u16,
}

impl TapePlayer {
    pub fn new() -> Self {
        Self {
            tape: Vec::new(),
            pos: 0,
            block_remaining: 0,
        }
    }

    /// Swap in a new cassette image and rewind.
    pub fn change_tape(&mut self, tape: Vec<u8>) {
        self.tape = tape;
        self.reset();
    }

    /// Rewind to the start of the tape.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.block_remaining = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.tape.is_empty()
    }

    fn read_block_header(&mut self) -> bool {
        // The PTP file header carries no payload; skip it
        if self.tape[self.pos] == PTP_HEADER {
            if self.pos + 3 >= self.tape.len() {
                return false;
            }
            self.pos += 3;
        }

        // The next byte must open a data or closing block
        let kind = self.tape[self.pos];
        if kind != DATA_BLOCK_HEADER && kind != CLOSING_BLOCK_HEADER {
            return false;
        }

        if self.pos + 3 >= self.tape.len() {
            return false;
        }
        self.block_remaining =
            u16::from_le_bytes([self.tape[self.pos + 1], self.tape[self.pos + 2]]);
        self.pos += 3;
        true
    }

    /// Next payload byte, or 0 with no tape loaded or on a malformed
    /// image (a malformed tape keeps yielding 0 until it is swapped).
    pub fn next_byte(&mut self) -> u8 {
        if self.tape.is_empty() {
            return 0;
        }

        // Past the last byte: restart the tape
        if self.pos == self.tape.len() {
            self.reset();
        }

        if self.block_remaining == 0 && !self.read_block_header() {
            warn!("malformed PTP image at offset {}", self.pos);
            return 0;
        }

        // A zero-length block wraps the counter; the stream self-corrects
        // at the next rewind.
        self.block_remaining = self.block_remaining.wrapping_sub(1);
        self.pos += 1;
        self.tape[self.pos - 1]
    }
}

impl Default for TapePlayer {
    fn default() -> Self {
        Self::new()
    }
}
