use crate::bus::Bus;
use crate::cpu::z80::{Flag, Idx, Z80};

impl Z80 {
    /// CB-prefixed dispatch. For DD CB / FD CB the displacement byte sits
    /// between the prefix and the sub-opcode, the operand is always the
    /// indexed memory cell, and (undocumented) the result is also copied
    /// into the register selected by the low three bits.
    pub(crate) fn execute_cb<B: Bus + ?Sized>(&mut self, idx: Idx, bus: &mut B) {
        if idx == Idx::Hl {
            let op = self.fetch_op(bus);
            self.execute_cb_plain(op, bus);
        } else {
            let addr = self.ea(idx, bus);
            // Sub-opcode is read as data, not an M1 cycle (no R refresh).
            let op = self.fetch8(bus);
            self.execute_cb_indexed(op, addr, bus);
        }
    }

    fn execute_cb_plain<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let r = op & 0x07;
        match op {
            // Rotate/shift r — 8 T; (HL) — 15 T
            op if op < 0x40 => {
                let rot_op = (op >> 3) & 0x07;
                if r == 6 {
                    let addr = self.get_hl();
                    let val = bus.read(addr);
                    let result = self.rotshift(rot_op, val);
                    bus.write(addr, result);
                    self.last_op_cycles += 15;
                } else {
                    let val = self.reg8(Idx::Hl, r);
                    let result = self.rotshift(rot_op, val);
                    self.set_reg8(Idx::Hl, r, result);
                    self.last_op_cycles += 8;
                }
            }
            // BIT n,r — 8 T; BIT n,(HL) — 12 T
            op if op < 0x80 => {
                let n = (op >> 3) & 0x07;
                if r == 6 {
                    let val = bus.read(self.get_hl());
                    // X/Y leak from the hidden WZ register, not the value
                    self.bit_flags(n, val, (self.memptr >> 8) as u8);
                    self.last_op_cycles += 12;
                } else {
                    let val = self.reg8(Idx::Hl, r);
                    self.bit_flags(n, val, val);
                    self.last_op_cycles += 8;
                }
            }
            // RES/SET n,r — 8 T; (HL) — 15 T
            _ => {
                let n = (op >> 3) & 0x07;
                let mask = 1u8 << n;
                if r == 6 {
                    let addr = self.get_hl();
                    let val = bus.read(addr);
                    let result = if op < 0xC0 { val & !mask } else { val | mask };
                    bus.write(addr, result);
                    self.last_op_cycles += 15;
                } else {
                    let val = self.reg8(Idx::Hl, r);
                    let result = if op < 0xC0 { val & !mask } else { val | mask };
                    self.set_reg8(Idx::Hl, r, result);
                    self.last_op_cycles += 8;
                }
            }
        }
    }

    /// DD CB d op / FD CB d op — BIT 20 T, everything else 23 T
    /// (4 T of that already counted for the DD/FD prefix).
    fn execute_cb_indexed<B: Bus + ?Sized>(&mut self, op: u8, addr: u16, bus: &mut B) {
        let r = op & 0x07;
        match op {
            op if op < 0x40 => {
                let rot_op = (op >> 3) & 0x07;
                let val = bus.read(addr);
                let result = self.rotshift(rot_op, val);
                bus.write(addr, result);
                if r != 6 {
                    self.set_reg8(Idx::Hl, r, result);
                }
                self.last_op_cycles += 19;
            }
            op if op < 0x80 => {
                let n = (op >> 3) & 0x07;
                let val = bus.read(addr);
                self.bit_flags(n, val, (addr >> 8) as u8);
                self.last_op_cycles += 16;
            }
            _ => {
                let n = (op >> 3) & 0x07;
                let mask = 1u8 << n;
                let val = bus.read(addr);
                let result = if op < 0xC0 { val & !mask } else { val | mask };
                bus.write(addr, result);
                if r != 6 {
                    self.set_reg8(Idx::Hl, r, result);
                }
                self.last_op_cycles += 19;
            }
        }
    }

    /// Shared rotate/shift core (RLC/RRC/RL/RR/SLA/SRA/SLL/SRL).
    fn rotshift(&mut self, rot_op: u8, val: u8) -> u8 {
        let old_c: u8 = if self.flag(Flag::C) { 1 } else { 0 };
        let (result, carry) = match rot_op {
            0 => ((val << 1) | (val >> 7), val & 0x80 != 0), // RLC
            1 => ((val >> 1) | (val << 7), val & 0x01 != 0), // RRC
            2 => ((val << 1) | old_c, val & 0x80 != 0),      // RL
            3 => ((val >> 1) | (old_c << 7), val & 0x01 != 0), // RR
            4 => (val << 1, val & 0x80 != 0),                // SLA
            5 => ((val >> 1) | (val & 0x80), val & 0x01 != 0), // SRA
            6 => ((val << 1) | 1, val & 0x80 != 0),          // SLL (undocumented)
            7 => (val >> 1, val & 0x01 != 0),                // SRL
            _ => unreachable!(),
        };

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if carry {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    /// BIT n flags: Z/PV from the tested bit, H set, N clear, C kept.
    /// X/Y come from `xy_src` (the value for registers, the high byte of
    /// the effective address for memory operands).
    fn bit_flags(&mut self, n: u8, val: u8, xy_src: u8) {
        let bit_set = val & (1 << n) != 0;
        let mut f = self.f & Flag::C as u8;
        f |= Flag::H as u8;
        if !bit_set {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if n == 7 && bit_set {
            f |= Flag::S as u8;
        }
        f |= xy_src & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }
}
