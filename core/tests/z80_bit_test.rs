use primo_core::cpu::z80::Z80;
mod common;
use common::{FLAG_C, FLAG_H, FLAG_Z, TestBus};

#[test]
fn test_rlc_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0x81;
    cpu.f = 0;
    bus.load(0, &[0xCB, 0x00]); // RLC B

    cpu.step(&mut bus);
    assert_eq!(cpu.b, 0x03);
    assert!(cpu.f & FLAG_C != 0);
    assert_eq!(cpu.last_op_cycles, 8);
}

#[test]
fn test_rl_through_carry() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.c = 0x00;
    cpu.f = FLAG_C;
    bus.load(0, &[0xCB, 0x11]); // RL C

    cpu.step(&mut bus);
    assert_eq!(cpu.c, 0x01, "old carry shifts in");
    assert!(cpu.f & FLAG_C == 0);
}

#[test]
fn test_sra_keeps_sign() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.d = 0x82;
    bus.load(0, &[0xCB, 0x2A]); // SRA D

    cpu.step(&mut bus);
    assert_eq!(cpu.d, 0xC1);
}

#[test]
fn test_srl_shifts_zero_in() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.e = 0x01;
    bus.load(0, &[0xCB, 0x3B]); // SRL E

    cpu.step(&mut bus);
    assert_eq!(cpu.e, 0x00);
    assert!(cpu.f & FLAG_Z != 0);
    assert!(cpu.f & FLAG_C != 0);
}

#[test]
fn test_rotate_hl_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x80;
    bus.load(0, &[0xCB, 0x06]); // RLC (HL)

    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x4000], 0x01);
    assert_eq!(cpu.last_op_cycles, 15);
}

#[test]
fn test_bit_set_and_clear() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x10;
    bus.load(0, &[0xCB, 0x67, 0xCB, 0x6F]); // BIT 4,A; BIT 5,A

    cpu.step(&mut bus);
    assert!(cpu.f & FLAG_Z == 0, "bit 4 is set");
    assert!(cpu.f & FLAG_H != 0);
    assert_eq!(cpu.last_op_cycles, 8);

    cpu.step(&mut bus);
    assert!(cpu.f & FLAG_Z != 0, "bit 5 is clear");
}

#[test]
fn test_bit_hl_indirect_cycles() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x01;
    bus.load(0, &[0xCB, 0x46]); // BIT 0,(HL)

    cpu.step(&mut bus);
    assert!(cpu.f & FLAG_Z == 0);
    assert_eq!(cpu.last_op_cycles, 12);
}

#[test]
fn test_bit_preserves_carry() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0xFF;
    cpu.f = FLAG_C;
    bus.load(0, &[0xCB, 0x7F]); // BIT 7,A

    cpu.step(&mut bus);
    assert!(cpu.f & FLAG_C != 0);
}

#[test]
fn test_res_and_set() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0xFF;
    bus.load(0, &[0xCB, 0x80, 0xCB, 0xC0]); // RES 0,B; SET 0,B

    cpu.step(&mut bus);
    assert_eq!(cpu.b, 0xFE);

    cpu.step(&mut bus);
    assert_eq!(cpu.b, 0xFF);
}

#[test]
fn test_set_hl_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x00;
    bus.load(0, &[0xCB, 0xDE]); // SET 3,(HL)

    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x4000], 0x08);
    assert_eq!(cpu.last_op_cycles, 15);
}

#[test]
fn test_res_does_not_touch_flags() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0xFF;
    cpu.f = 0xFF;
    bus.load(0, &[0xCB, 0x88]); // RES 1,B

    cpu.step(&mut bus);
    assert_eq!(cpu.f, 0xFF);
}
