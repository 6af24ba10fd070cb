use crate::bus::Bus;
use crate::cpu::z80::{Idx, Z80};

impl Z80 {
    /// JP nn — 10 T
    pub(crate) fn op_jp_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch16(bus);
        self.pc = addr;
        self.memptr = addr;
        self.last_op_cycles += 10;
    }

    /// JP cc,nn — 10 T either way (the operand is always consumed)
    pub(crate) fn op_jp_cc_nn<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let addr = self.fetch16(bus);
        self.memptr = addr;
        if self.condition((op >> 3) & 0x07) {
            self.pc = addr;
        }
        self.last_op_cycles += 10;
    }

    /// JP (HL) — 4 T
    pub(crate) fn op_jp_hl(&mut self, idx: Idx) {
        self.pc = self.rp(idx, 2);
        self.last_op_cycles += 4;
    }

    /// JR e — 12 T
    pub(crate) fn op_jr_e<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let d = self.fetch8(bus) as i8;
        self.pc = self.pc.wrapping_add(d as i16 as u16);
        self.memptr = self.pc;
        self.last_op_cycles += 12;
    }

    /// JR cc,e — 12 T taken / 7 T not taken (NZ/Z/NC/C only)
    pub(crate) fn op_jr_cc_e<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let d = self.fetch8(bus) as i8;
        if self.condition((op >> 3) & 0x03) {
            self.pc = self.pc.wrapping_add(d as i16 as u16);
            self.memptr = self.pc;
            self.last_op_cycles += 12;
        } else {
            self.last_op_cycles += 7;
        }
    }

    /// DJNZ e — 13 T taken / 8 T not taken
    pub(crate) fn op_djnz<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let d = self.fetch8(bus) as i8;
        self.b = self.b.wrapping_sub(1);
        if self.b != 0 {
            self.pc = self.pc.wrapping_add(d as i16 as u16);
            self.memptr = self.pc;
            self.last_op_cycles += 13;
        } else {
            self.last_op_cycles += 8;
        }
    }

    /// CALL nn — 17 T
    pub(crate) fn op_call_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch16(bus);
        self.push16(bus, self.pc);
        self.pc = addr;
        self.memptr = addr;
        self.last_op_cycles += 17;
    }

    /// CALL cc,nn — 17 T taken / 10 T not taken
    pub(crate) fn op_call_cc_nn<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let addr = self.fetch16(bus);
        self.memptr = addr;
        if self.condition((op >> 3) & 0x07) {
            self.push16(bus, self.pc);
            self.pc = addr;
            self.last_op_cycles += 17;
        } else {
            self.last_op_cycles += 10;
        }
    }

    /// RET — 10 T
    pub(crate) fn op_ret<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.pc = self.pop16(bus);
        self.memptr = self.pc;
        self.last_op_cycles += 10;
    }

    /// RET cc — 11 T taken / 5 T not taken
    pub(crate) fn op_ret_cc<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        if self.condition((op >> 3) & 0x07) {
            self.pc = self.pop16(bus);
            self.memptr = self.pc;
            self.last_op_cycles += 11;
        } else {
            self.last_op_cycles += 5;
        }
    }

    /// RST p — 11 T; target is encoded in opcode bits 3-5
    pub(crate) fn op_rst<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.push16(bus, self.pc);
        self.pc = (op & 0x38) as u16;
        self.memptr = self.pc;
        self.last_op_cycles += 11;
    }
}
