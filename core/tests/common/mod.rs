#![allow(dead_code)]

use primo_core::bus::Bus;

/// Minimal bus for CPU tests: flat 64KB RAM, latched I/O ports, and a
/// one-shot NMI line.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub ports: [u8; 256],
    /// Last (port, value) pair written by an OUT instruction.
    pub last_out: Option<(u8, u8)>,
    /// Armed NMI line; consumed by the CPU's between-instruction poll.
    pub nmi_pending: bool,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: [0; 256],
            last_out: None,
            nmi_pending: false,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, port: u8) -> u8 {
        self.ports[port as usize]
    }

    fn io_write(&mut self, port: u8, data: u8) {
        self.ports[port as usize] = data;
        self.last_out = Some((port, data));
    }

    fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }
}

// Flag masks for assertions (X/Y are usually left unasserted).
pub const FLAG_C: u8 = 0x01;
pub const FLAG_N: u8 = 0x02;
pub const FLAG_PV: u8 = 0x04;
pub const FLAG_H: u8 = 0x10;
pub const FLAG_Z: u8 = 0x40;
pub const FLAG_S: u8 = 0x80;

/// The documented flag bits (everything except X/Y).
pub const FLAG_DOCUMENTED: u8 = FLAG_S | FLAG_Z | FLAG_H | FLAG_PV | FLAG_N | FLAG_C;
