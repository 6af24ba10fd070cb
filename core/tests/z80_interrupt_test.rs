use primo_core::cpu::z80::Z80;
mod common;
use common::TestBus;

#[test]
fn test_nmi_basic() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.load(0x0100, &[0x00]); // NOP
    bus.load(0x0066, &[0x00]); // NOP at the NMI vector

    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0101);

    bus.nmi_pending = true;
    cpu.step(&mut bus); // NMI response
    assert_eq!(cpu.last_op_cycles, 11, "NMI response is 11 T-states");
    assert_eq!(cpu.pc, 0x0066);
    assert_eq!(cpu.sp, 0x0FFE);
    assert_eq!(bus.memory[0x0FFF], 0x01, "return address high");
    assert_eq!(bus.memory[0x0FFE], 0x01, "return address low");
    assert!(!cpu.iff1, "IFF1 cleared");
    assert!(cpu.iff2, "IFF2 preserved for RETN");
    assert!(cpu.in_nmi, "latch set while servicing");
}

#[test]
fn test_nmi_blocked_while_in_nmi() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    bus.load(0x0100, &[0x00, 0x00]);
    bus.load(0x0066, &[0x00, 0x00]);

    bus.nmi_pending = true;
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0066);

    // A second assertion is held off until RETN clears the latch
    bus.nmi_pending = true;
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0067, "nested NMI not accepted");
    assert!(bus.nmi_pending, "the line stays armed, not consumed");
}

#[test]
fn test_retn_clears_latch_and_restores_iff1() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.load(0x0100, &[0x00, 0x00]);
    bus.load(0x0066, &[0xED, 0x45]); // RETN

    bus.nmi_pending = true;
    cpu.step(&mut bus); // NMI
    assert!(cpu.in_nmi);
    assert!(!cpu.iff1);

    cpu.step(&mut bus); // RETN
    assert!(!cpu.in_nmi, "RETN releases the latch");
    assert!(cpu.iff1, "IFF1 restored from IFF2");
    assert_eq!(cpu.pc, 0x0101);
    assert_eq!(cpu.last_op_cycles, 14);
}

#[test]
fn test_reti_leaves_latch_alone() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    bus.load(0x0100, &[0x00]);
    bus.load(0x0066, &[0xED, 0x4D]); // RETI

    bus.nmi_pending = true;
    cpu.step(&mut bus);
    cpu.step(&mut bus); // RETI
    assert!(cpu.in_nmi, "only RETN drops the NMI latch");
}

#[test]
fn test_nmi_after_retn_is_accepted() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    bus.load(0x0100, &[0x00, 0x00, 0x00]);
    bus.load(0x0066, &[0xED, 0x45]); // RETN

    bus.nmi_pending = true;
    cpu.step(&mut bus); // into the handler
    cpu.step(&mut bus); // RETN back to 0x0101

    bus.nmi_pending = true;
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0066, "fresh NMI accepted after RETN");
}

#[test]
fn test_ei_shadow_defers_nmi() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    bus.load(0x0100, &[0xFB, 0x00, 0x00]); // EI; NOP; NOP
    bus.load(0x0066, &[0x00]);

    cpu.step(&mut bus); // EI
    assert!(cpu.iff1);

    bus.nmi_pending = true;
    cpu.step(&mut bus); // shadow instruction runs first
    assert_eq!(cpu.pc, 0x0102, "NMI deferred by the EI shadow");

    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0066, "NMI taken after the shadow expires");
}

#[test]
fn test_halt_wakes_on_nmi() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    bus.load(0x0100, &[0x76]); // HALT
    bus.load(0x0066, &[0x00]);

    cpu.step(&mut bus);
    assert!(cpu.halted);
    assert_eq!(cpu.pc, 0x0101, "PC rests past the HALT");

    // Halted CPU burns 4 T per step
    cpu.step(&mut bus);
    assert!(cpu.halted);
    assert_eq!(cpu.last_op_cycles, 4);

    bus.nmi_pending = true;
    cpu.step(&mut bus);
    assert!(!cpu.halted, "NMI wakes the CPU");
    assert_eq!(cpu.pc, 0x0066);
    assert_eq!(bus.memory[0x0FFE], 0x01, "return address points past HALT");
}

#[test]
fn test_manual_latch_clear_unblocks_nmi() {
    // The machine's reset patch drops in_nmi by hand when the firmware
    // never executes RETN; a later NMI must then be accepted.
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    bus.load(0x0100, &[0x00, 0x00]);
    bus.load(0x0066, &[0x00]);

    bus.nmi_pending = true;
    cpu.step(&mut bus);
    assert!(cpu.in_nmi);

    cpu.in_nmi = false; // what the patch layer does
    bus.nmi_pending = true;
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0066);
}
