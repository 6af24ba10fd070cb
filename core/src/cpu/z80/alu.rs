use crate::bus::Bus;
use crate::cpu::z80::{Flag, Idx, Z80};

impl Z80 {
    // --- Flag helpers ---

    pub(crate) fn get_parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
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
        if is_and {
            f |= Flag::H as u8; // AND sets H, OR/XOR clear it
        }
        // N is 0, C is 0
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val: u8 = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let result_u16 = (a as u16) + (val as u16) + (c_val as u16);
        let result = result_u16 as u8;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) + (val & 0xF) + c_val > 0xF {
            f |= Flag::H as u8;
        }
        // Overflow: (op1 ^ res) & (op2 ^ res) & 0x80
        if (a ^ result) & (val ^ result) & 0x80 != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    fn do_sub(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val: u8 = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let result_u16 = (a as u16)
            .wrapping_sub(val as u16)
            .wrapping_sub(c_val as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < (val & 0xF) + c_val {
            f |= Flag::H as u8;
        }
        // Overflow: (op1 ^ op2) & (op1 ^ res) & 0x80
        if (a ^ val) & (a ^ result) & 0x80 != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    pub(crate) fn do_cp(&mut self, val: u8) {
        let a = self.a;
        let result_u16 = (a as u16).wrapping_sub(val as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < (val & 0xF) {
            f |= Flag::H as u8;
        }
        if (a ^ val) & (a ^ result) & 0x80 != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        // X/Y come from the operand for CP, not the result
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn perform_alu(&mut self, alu_op: u8, val: u8) {
        match alu_op {
            0 => self.do_add(val, false), // ADD
            1 => self.do_add(val, true),  // ADC
            2 => self.do_sub(val, false), // SUB
            3 => self.do_sub(val, true),  // SBC
            4 => {
                self.a &= val;
                self.update_flags_logic(self.a, true); // AND
            }
            5 => {
                self.a ^= val;
                self.update_flags_logic(self.a, false); // XOR
            }
            6 => {
                self.a |= val;
                self.update_flags_logic(self.a, false); // OR
            }
            7 => self.do_cp(val), // CP
            _ => unreachable!(),
        }
    }

    // --- 8-bit arithmetic instructions ---

    /// ALU A,r — opcode mask 10 xxx zzz.
    pub(crate) fn op_alu_r<B: Bus + ?Sized>(&mut self, op: u8, idx: Idx, bus: &mut B) {
        let alu_op = (op >> 3) & 0x07;
        let r = op & 0x07;
        if r == 6 {
            let addr = self.ea(idx, bus);
            let val = bus.read(addr);
            self.perform_alu(alu_op, val);
            self.last_op_cycles += if idx == Idx::Hl { 7 } else { 15 };
        } else {
            let val = self.reg8(idx, r);
            self.perform_alu(alu_op, val);
            self.last_op_cycles += 4;
        }
    }

    /// ALU A,n — opcode mask 11 xxx 110.
    pub(crate) fn op_alu_n<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let alu_op = (op >> 3) & 0x07;
        let val = self.fetch8(bus);
        self.perform_alu(alu_op, val);
        self.last_op_cycles += 7;
    }

    /// INC/DEC r — opcode mask 00 rrr 10x.
    pub(crate) fn op_inc_dec_r<B: Bus + ?Sized>(&mut self, op: u8, idx: Idx, bus: &mut B) {
        let r = (op >> 3) & 0x07;
        let is_dec = op & 0x01 != 0;

        if r == 6 {
            // Read-modify-write on (HL)/(IX+d)
            let addr = self.ea(idx, bus);
            let val = bus.read(addr);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            bus.write(addr, result);
            self.last_op_cycles += if idx == Idx::Hl { 11 } else { 19 };
        } else {
            let val = self.reg8(idx, r);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            self.set_reg8(idx, r, result);
            self.last_op_cycles += 4;
        }
    }

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = self.f & Flag::C as u8; // preserve C
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if val & 0xF == 0xF {
            f |= Flag::H as u8;
        }
        if val == 0x7F {
            f |= Flag::PV as u8; // overflow 7F -> 80
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if val & 0xF == 0x0 {
            f |= Flag::H as u8; // borrow from bit 4
        }
        if val == 0x80 {
            f |= Flag::PV as u8; // overflow 80 -> 7F
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    // --- 16-bit arithmetic ---

    /// ADD HL,rr — 11 T. S/Z/PV preserved, H from bit 11, C from bit 15.
    pub(crate) fn op_add_hl_rr(&mut self, op: u8, idx: Idx) {
        let rp = (op >> 4) & 0x03;
        let hl = self.rp(idx, 2);
        let val = self.rp(idx, rp);
        let result = hl.wrapping_add(val);

        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if (hl as u32) + (val as u32) > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = hl.wrapping_add(1);
        self.set_rp(idx, 2, result);
        self.last_op_cycles += 11;
    }

    /// ADC HL,rr (ED 4A/5A/6A/7A) — 15 T, full flags.
    pub(crate) fn op_adc_hl_rr(&mut self, op: u8) {
        let rp = (op >> 4) & 0x03;
        let hl = self.get_hl();
        let val = self.rp(Idx::Hl, rp);
        let c_val: u16 = if self.flag(Flag::C) { 1 } else { 0 };
        let result_u32 = (hl as u32) + (val as u32) + (c_val as u32);
        let result = result_u32 as u16;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x8000 != 0 {
            f |= Flag::S as u8;
        }
        if (hl & 0x0FFF) + (val & 0x0FFF) + c_val > 0x0FFF {
            f |= Flag::H as u8;
        }
        if (hl ^ result) & (val ^ result) & 0x8000 != 0 {
            f |= Flag::PV as u8;
        }
        if result_u32 > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = hl.wrapping_add(1);
        self.set_hl(result);
        self.last_op_cycles += 15;
    }

    /// SBC HL,rr (ED 42/52/62/72) — 15 T, full flags.
    pub(crate) fn op_sbc_hl_rr(&mut self, op: u8) {
        let rp = (op >> 4) & 0x03;
        let hl = self.get_hl();
        let val = self.rp(Idx::Hl, rp);
        let c_val: u16 = if self.flag(Flag::C) { 1 } else { 0 };
        let result_u32 = (hl as u32)
            .wrapping_sub(val as u32)
            .wrapping_sub(c_val as u32);
        let result = result_u32 as u16;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x8000 != 0 {
            f |= Flag::S as u8;
        }
        if (hl & 0x0FFF) < (val & 0x0FFF) + c_val {
            f |= Flag::H as u8;
        }
        if (hl ^ val) & (hl ^ result) & 0x8000 != 0 {
            f |= Flag::PV as u8;
        }
        if result_u32 > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = hl.wrapping_add(1);
        self.set_hl(result);
        self.last_op_cycles += 15;
    }

    /// INC rr / DEC rr — 6 T, no flags.
    pub(crate) fn op_inc_dec_rr(&mut self, op: u8, idx: Idx) {
        let rp = (op >> 4) & 0x03;
        let val = self.rp(idx, rp);
        let result = if op & 0x08 != 0 {
            val.wrapping_sub(1)
        } else {
            val.wrapping_add(1)
        };
        self.set_rp(idx, rp, result);
        self.last_op_cycles += 6;
    }

    // --- Accumulator rotates (4 T, only C/H/N/X/Y affected) ---

    pub(crate) fn op_rlca(&mut self) {
        let carry = self.a >> 7;
        self.a = (self.a << 1) | carry;
        self.rot_a_flags(carry != 0);
    }

    pub(crate) fn op_rrca(&mut self) {
        let carry = self.a & 1;
        self.a = (self.a >> 1) | (carry << 7);
        self.rot_a_flags(carry != 0);
    }

    pub(crate) fn op_rla(&mut self) {
        let carry = self.a >> 7;
        let old_c: u8 = if self.flag(Flag::C) { 1 } else { 0 };
        self.a = (self.a << 1) | old_c;
        self.rot_a_flags(carry != 0);
    }

    pub(crate) fn op_rra(&mut self) {
        let carry = self.a & 1;
        let old_c: u8 = if self.flag(Flag::C) { 1 } else { 0 };
        self.a = (self.a >> 1) | (old_c << 7);
        self.rot_a_flags(carry != 0);
    }

    fn rot_a_flags(&mut self, carry: bool) {
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.last_op_cycles += 4;
    }

    // --- Misc accumulator/flag ops (4 T) ---

    pub(crate) fn op_daa(&mut self) {
        let a = self.a;
        let n = self.flag(Flag::N);
        let mut diff = 0u8;
        if self.flag(Flag::H) || a & 0x0F > 9 {
            diff |= 0x06;
        }
        let carry = self.flag(Flag::C) || a > 0x99;
        if carry {
            diff |= 0x60;
        }
        let result = if n {
            a.wrapping_sub(diff)
        } else {
            a.wrapping_add(diff)
        };

        let mut f = if n { Flag::N as u8 } else { 0 };
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if (a ^ result) & 0x10 != 0 {
            f |= Flag::H as u8;
        }
        if carry {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
        self.last_op_cycles += 4;
    }

    pub(crate) fn op_cpl(&mut self) {
        self.a = !self.a;
        let mut f = self.f
            & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8 | Flag::C as u8);
        f |= Flag::H as u8 | Flag::N as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.last_op_cycles += 4;
    }

    pub(crate) fn op_scf(&mut self) {
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        f |= Flag::C as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.last_op_cycles += 4;
    }

    pub(crate) fn op_ccf(&mut self) {
        let old_c = self.flag(Flag::C);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if old_c {
            f |= Flag::H as u8; // H takes the previous carry
        } else {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.last_op_cycles += 4;
    }

    /// NEG (ED 44) — 8 T. A = 0 - A with SUB flags.
    pub(crate) fn op_neg(&mut self) {
        let a = self.a;
        let result = 0u8.wrapping_sub(a);

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if a & 0xF != 0 {
            f |= Flag::H as u8;
        }
        if a == 0x80 {
            f |= Flag::PV as u8;
        }
        if a != 0 {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
        self.last_op_cycles += 8;
    }
}
