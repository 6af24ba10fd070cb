use crate::bus::Bus;
use crate::cpu::z80::{Idx, Z80};

impl Z80 {
    /// LD r,r' — 4 T register-to-register, 7 T with a (HL) operand,
    /// 19 T indexed. When one operand is memory, the register operand
    /// is never redirected to an index half; with no memory operand,
    /// H/L follow the DD/FD prefix (undocumented IXH/IXL moves).
    pub(crate) fn op_ld_r_r<B: Bus + ?Sized>(&mut self, op: u8, idx: Idx, bus: &mut B) {
        let dst = (op >> 3) & 0x07;
        let src = op & 0x07;

        if src == 6 {
            let addr = self.ea(idx, bus);
            let val = bus.read(addr);
            self.set_reg8(Idx::Hl, dst, val);
            self.last_op_cycles += if idx == Idx::Hl { 7 } else { 15 };
        } else if dst == 6 {
            let addr = self.ea(idx, bus);
            let val = self.reg8(Idx::Hl, src);
            bus.write(addr, val);
            self.last_op_cycles += if idx == Idx::Hl { 7 } else { 15 };
        } else {
            let val = self.reg8(idx, src);
            self.set_reg8(idx, dst, val);
            self.last_op_cycles += 4;
        }
    }

    /// LD r,n — 7 T; LD (HL),n — 10 T; LD (IX+d),n — 19 T.
    /// For the indexed form the displacement precedes the immediate.
    pub(crate) fn op_ld_r_n<B: Bus + ?Sized>(&mut self, op: u8, idx: Idx, bus: &mut B) {
        let r = (op >> 3) & 0x07;
        if r == 6 {
            let addr = self.ea(idx, bus);
            let val = self.fetch8(bus);
            bus.write(addr, val);
            self.last_op_cycles += if idx == Idx::Hl { 10 } else { 15 };
        } else {
            let val = self.fetch8(bus);
            self.set_reg8(idx, r, val);
            self.last_op_cycles += 7;
        }
    }

    /// LD rr,nn — 10 T
    pub(crate) fn op_ld_rr_nn<B: Bus + ?Sized>(&mut self, op: u8, idx: Idx, bus: &mut B) {
        let rp = (op >> 4) & 0x03;
        let val = self.fetch16(bus);
        self.set_rp(idx, rp, val);
        self.last_op_cycles += 10;
    }

    /// LD (BC),A / LD (DE),A — 7 T
    pub(crate) fn op_ld_rr_ind_a<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let addr = if op == 0x02 { self.get_bc() } else { self.get_de() };
        bus.write(addr, self.a);
        self.memptr = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
        self.last_op_cycles += 7;
    }

    /// LD A,(BC) / LD A,(DE) — 7 T
    pub(crate) fn op_ld_a_rr_ind<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        let addr = if op == 0x0A { self.get_bc() } else { self.get_de() };
        self.a = bus.read(addr);
        self.memptr = addr.wrapping_add(1);
        self.last_op_cycles += 7;
    }

    /// LD (nn),A — 13 T
    pub(crate) fn op_ld_nn_ind_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch16(bus);
        bus.write(addr, self.a);
        self.memptr = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
        self.last_op_cycles += 13;
    }

    /// LD A,(nn) — 13 T
    pub(crate) fn op_ld_a_nn_ind<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch16(bus);
        self.a = bus.read(addr);
        self.memptr = addr.wrapping_add(1);
        self.last_op_cycles += 13;
    }

    /// LD (nn),HL — 16 T
    pub(crate) fn op_ld_nn_ind_hl<B: Bus + ?Sized>(&mut self, idx: Idx, bus: &mut B) {
        let addr = self.fetch16(bus);
        let val = self.rp(idx, 2);
        self.write16(bus, addr, val);
        self.memptr = addr.wrapping_add(1);
        self.last_op_cycles += 16;
    }

    /// LD HL,(nn) — 16 T
    pub(crate) fn op_ld_hl_nn_ind<B: Bus + ?Sized>(&mut self, idx: Idx, bus: &mut B) {
        let addr = self.fetch16(bus);
        let val = self.read16(bus, addr);
        self.set_rp(idx, 2, val);
        self.memptr = addr.wrapping_add(1);
        self.last_op_cycles += 16;
    }

    /// LD SP,HL — 6 T
    pub(crate) fn op_ld_sp_hl(&mut self, idx: Idx) {
        self.sp = self.rp(idx, 2);
        self.last_op_cycles += 6;
    }

    // --- Exchanges — 4 T ---

    pub(crate) fn op_ex_af_af(&mut self) {
        core::mem::swap(&mut self.a, &mut self.a_prime);
        core::mem::swap(&mut self.f, &mut self.f_prime);
        self.last_op_cycles += 4;
    }

    pub(crate) fn op_exx(&mut self) {
        core::mem::swap(&mut self.b, &mut self.b_prime);
        core::mem::swap(&mut self.c, &mut self.c_prime);
        core::mem::swap(&mut self.d, &mut self.d_prime);
        core::mem::swap(&mut self.e, &mut self.e_prime);
        core::mem::swap(&mut self.h, &mut self.h_prime);
        core::mem::swap(&mut self.l, &mut self.l_prime);
        self.last_op_cycles += 4;
    }

    pub(crate) fn op_ex_de_hl(&mut self) {
        core::mem::swap(&mut self.d, &mut self.h);
        core::mem::swap(&mut self.e, &mut self.l);
        self.last_op_cycles += 4;
    }

    // --- Immediate-port I/O — 11 T ---

    /// IN A,(n). A rides the high address lines; the Primo decodes only
    /// the low byte.
    pub(crate) fn op_in_a_n<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let port = self.fetch8(bus);
        self.memptr = (((self.a as u16) << 8) | port as u16).wrapping_add(1);
        self.a = bus.io_read(port);
        self.last_op_cycles += 11;
    }

    /// OUT (n),A
    pub(crate) fn op_out_n_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let port = self.fetch8(bus);
        bus.io_write(port, self.a);
        self.memptr =
            ((self.a as u16) << 8) | (port.wrapping_add(1) as u16);
        self.last_op_cycles += 11;
    }
}
