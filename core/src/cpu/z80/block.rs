use crate::bus::Bus;
use crate::cpu::z80::{Flag, Idx, Z80};

impl Z80 {
    /// ED-prefixed dispatch. Handler totals include both opcode fetches.
    pub(crate) fn execute_ed<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let op = self.fetch_op(bus);
        match op {
            0x47 => self.op_ld_i_a(),
            0x4F => self.op_ld_r_a(),
            0x57 => self.op_ld_a_ir(self.i),
            0x5F => self.op_ld_a_ir(self.r),
            0x67 => self.op_rrd(bus),
            0x6F => self.op_rld(bus),

            // --- Block transfer/compare/io ---
            0xA0 | 0xA8 => self.op_ldi_ldd(op, bus),
            0xA1 | 0xA9 => self.op_cpi_cpd(op, bus),
            0xA2 | 0xAA => self.op_ini_ind(op, bus),
            0xA3 | 0xAB => self.op_outi_outd(op, bus),
            0xB0 | 0xB8 => self.op_ldir_lddr(op, bus),
            0xB1 | 0xB9 => self.op_cpir_cpdr(op, bus),
            0xB2 | 0xBA => self.op_inir_indr(op, bus),
            0xB3 | 0xBB => self.op_otir_otdr(op, bus),

            // --- Pattern-based (0x40-0x7F) ---
            op if op & 0xC7 == 0x40 => self.op_in_r_c(op, bus),  // IN r,(C) — 12 T
            op if op & 0xC7 == 0x41 => self.op_out_c_r(op, bus), // OUT (C),r — 12 T
            op if op & 0xCF == 0x42 => self.op_sbc_hl_rr(op),
            op if op & 0xCF == 0x4A => self.op_adc_hl_rr(op),
            op if op & 0xCF == 0x43 => self.op_ld_nn_ind_rr(op, bus),
            op if op & 0xCF == 0x4B => self.op_ld_rr_nn_ind(op, bus),
            op if op & 0xC7 == 0x44 => self.op_neg(),
            op if op & 0xC7 == 0x45 => self.op_retn(op, bus),
            op if op & 0xC7 == 0x46 => self.op_im(op),

            // Undefined ED opcodes act as 8 T NOPs
            _ => self.last_op_cycles += 8,
        }
    }

    // --- Register transfers involving I/R (9 T) ---

    fn op_ld_i_a(&mut self) {
        self.i = self.a;
        self.last_op_cycles += 9;
    }

    fn op_ld_r_a(&mut self) {
        self.r = self.a;
        self.last_op_cycles += 9;
    }

    /// LD A,I / LD A,R — PV reflects IFF2.
    fn op_ld_a_ir(&mut self, val: u8) {
        self.a = val;
        let mut f = self.f & Flag::C as u8;
        if val == 0 {
            f |= Flag::Z as u8;
        }
        if val & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.last_op_cycles += 9;
    }

    // --- Nibble rotates through A and (HL) — 18 T ---

    fn op_rrd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let hl = self.get_hl();
        let val = bus.read(hl);
        bus.write(hl, (self.a << 4) | (val >> 4));
        self.a = (self.a & 0xF0) | (val & 0x0F);
        self.rxd_flags();
        self.memptr = hl.wrapping_add(1);
        self.last_op_cycles += 18;
    }

    fn op_rld<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let hl = self.get_hl();
        let val = bus.read(hl);
        bus.write(hl, (val << 4) | (self.a & 0x0F));
        self.a = (self.a & 0xF0) | (val >> 4);
        self.rxd_flags();
        self.memptr = hl.wrapping_add(1);
        self.last_op_cycles += 18;
    }

    fn rxd_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 {
            f |= Flag::Z as u8;
        }
        if self.a & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(self.a) {
            f |= Flag::PV as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    // --- Block transfer (LDI/LDD/LDIR/LDDR) ---

    /// One LDI/LDD step.
    fn ldx_step<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let hl = self.get_hl();
        let de = self.get_de();
        let val = bus.read(hl);
        bus.write(de, val);

        if op & 0x08 == 0 {
            self.set_hl(hl.wrapping_add(1));
            self.set_de(de.wrapping_add(1));
        } else {
            self.set_hl(hl.wrapping_sub(1));
            self.set_de(de.wrapping_sub(1));
        }
        let bc = self.get_bc().wrapping_sub(1);
        self.set_bc(bc);

        // S/Z/C preserved; H/N clear; PV = BC != 0; X/Y from A + data
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if bc != 0 {
            f |= Flag::PV as u8;
        }
        let n = self.a.wrapping_add(val);
        if n & 0x08 != 0 {
            f |= Flag::X as u8;
        }
        if n & 0x02 != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
    }

    fn op_ldi_ldd<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.ldx_step(op, bus);
        self.last_op_cycles += 16;
    }

    fn op_ldir_lddr<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.ldx_step(op, bus);
        if self.get_bc() != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            self.last_op_cycles += 21;
        } else {
            self.last_op_cycles += 16;
        }
    }

    // --- Block compare (CPI/CPD/CPIR/CPDR) ---

    /// One CPI/CPD step. Returns true when A matched (HL).
    fn cpx_step<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) -> bool {
        let hl = self.get_hl();
        let val = bus.read(hl);
        let result = self.a.wrapping_sub(val);
        let half = (self.a & 0xF) < (val & 0xF);

        if op & 0x08 == 0 {
            self.set_hl(hl.wrapping_add(1));
            self.memptr = self.memptr.wrapping_add(1);
        } else {
            self.set_hl(hl.wrapping_sub(1));
            self.memptr = self.memptr.wrapping_sub(1);
        }
        let bc = self.get_bc().wrapping_sub(1);
        self.set_bc(bc);

        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if half {
            f |= Flag::H as u8;
        }
        if bc != 0 {
            f |= Flag::PV as u8;
        }
        let n = result.wrapping_sub(if half { 1 } else { 0 });
        if n & 0x08 != 0 {
            f |= Flag::X as u8;
        }
        if n & 0x02 != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
        result == 0
    }

    fn op_cpi_cpd<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.cpx_step(op, bus);
        self.last_op_cycles += 16;
    }

    fn op_cpir_cpdr<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let matched = self.cpx_step(op, bus);
        if self.get_bc() != 0 && !matched {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            self.last_op_cycles += 21;
        } else {
            self.last_op_cycles += 16;
        }
    }

    // --- Block I/O (INI/IND/OUTI/OUTD and repeats) ---

    fn inx_step<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.memptr = if op & 0x08 == 0 {
            self.get_bc().wrapping_add(1)
        } else {
            self.get_bc().wrapping_sub(1)
        };
        let val = bus.io_read(self.c);
        let hl = self.get_hl();
        bus.write(hl, val);
        self.set_hl(if op & 0x08 == 0 {
            hl.wrapping_add(1)
        } else {
            hl.wrapping_sub(1)
        });
        self.b = self.b.wrapping_sub(1);

        let c_adj = if op & 0x08 == 0 {
            self.c.wrapping_add(1)
        } else {
            self.c.wrapping_sub(1)
        };
        let k = val as u16 + c_adj as u16;
        self.block_io_flags(val, k);
    }

    fn outx_step<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let hl = self.get_hl();
        let val = bus.read(hl);
        self.b = self.b.wrapping_sub(1);
        bus.io_write(self.c, val);
        self.set_hl(if op & 0x08 == 0 {
            hl.wrapping_add(1)
        } else {
            hl.wrapping_sub(1)
        });
        self.memptr = if op & 0x08 == 0 {
            self.get_bc().wrapping_add(1)
        } else {
            self.get_bc().wrapping_sub(1)
        };

        let k = val as u16 + self.l as u16;
        self.block_io_flags(val, k);
    }

    fn block_io_flags(&mut self, val: u8, k: u16) {
        let mut f = 0;
        if self.b == 0 {
            f |= Flag::Z as u8;
        }
        if self.b & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if val & 0x80 != 0 {
            f |= Flag::N as u8;
        }
        if k > 0xFF {
            f |= Flag::H as u8 | Flag::C as u8;
        }
        if Self::get_parity((k as u8 & 0x07) ^ self.b) {
            f |= Flag::PV as u8;
        }
        f |= self.b & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn op_ini_ind<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.inx_step(op, bus);
        self.last_op_cycles += 16;
    }

    fn op_outi_outd<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.outx_step(op, bus);
        self.last_op_cycles += 16;
    }

    fn op_inir_indr<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.inx_step(op, bus);
        self.block_io_repeat();
    }

    fn op_otir_otdr<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.outx_step(op, bus);
        self.block_io_repeat();
    }

    fn block_io_repeat(&mut self) {
        if self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.last_op_cycles += 21;
        } else {
            self.last_op_cycles += 16;
        }
    }

    // --- Port transfers through C — 12 T ---

    /// IN r,(C). r = 6 sets flags without storing (undocumented IN (C)).
    fn op_in_r_c<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let r = (op >> 3) & 0x07;
        let val = bus.io_read(self.c);
        if r != 6 {
            self.set_reg8(Idx::Hl, r, val);
        }

        let mut f = self.f & Flag::C as u8;
        if val == 0 {
            f |= Flag::Z as u8;
        }
        if val & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(val) {
            f |= Flag::PV as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = self.get_bc().wrapping_add(1);
        self.last_op_cycles += 12;
    }

    /// OUT (C),r. r = 6 outputs 0 (undocumented OUT (C),0 on NMOS).
    fn op_out_c_r<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let r = (op >> 3) & 0x07;
        let val = if r == 6 { 0 } else { self.reg8(Idx::Hl, r) };
        bus.io_write(self.c, val);
        self.memptr = self.get_bc().wrapping_add(1);
        self.last_op_cycles += 12;
    }

    // --- 16-bit absolute loads — 20 T ---

    fn op_ld_nn_ind_rr<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let rp = (op >> 4) & 0x03;
        let addr = self.fetch16(bus);
        let val = self.rp(Idx::Hl, rp);
        self.write16(bus, addr, val);
        self.memptr = addr.wrapping_add(1);
        self.last_op_cycles += 20;
    }

    fn op_ld_rr_nn_ind<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let rp = (op >> 4) & 0x03;
        let addr = self.fetch16(bus);
        let val = self.read16(bus, addr);
        self.set_rp(Idx::Hl, rp, val);
        self.memptr = addr.wrapping_add(1);
        self.last_op_cycles += 20;
    }

    // --- Interrupt returns and mode — RETN/RETI 14 T, IM 8 T ---

    /// The whole ED 45/55/65/75/5D/6D/7D family behaves as RETN and
    /// releases the NMI latch; ED 4D is RETI and leaves it alone.
    fn op_retn<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.pc = self.pop16(bus);
        self.memptr = self.pc;
        self.iff1 = self.iff2;
        if op != 0x4D {
            self.in_nmi = false;
        }
        self.last_op_cycles += 14;
    }

    fn op_im(&mut self, op: u8) {
        self.im = match (op >> 3) & 0x03 {
            0 | 1 => 0,
            2 => 1,
            _ => 2,
        };
        self.last_op_cycles += 8;
    }
}
