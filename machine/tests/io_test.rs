use primo_machine::Io;

#[test]
fn power_on_defaults() {
    let io = Io::new();
    assert!(io.nmi_enabled);
    assert!(io.primary_video);
    assert!(!io.nmi_next);
    assert!(!io.speaker);
    assert!(!io.vblank);
    assert!(!io.reset_line);
}

#[test]
fn unused_range_reads_zero() {
    let mut io = Io::new();
    io.vblank = true;
    io.reset_line = true;
    io.set_pressed_keys(&[0x00, 0x3F]);

    for port in 0x80..=0xFFu8 {
        assert_eq!(io.read(port), 0, "port {port:#04X}");
    }
}

#[test]
fn joystick_range_reads_disconnected() {
    let io = Io::new();
    for port in 0x40..=0x7Fu8 {
        assert_eq!(io.read(port), 0x05, "port {port:#04X}");
    }
}

#[test]
fn keyboard_strobe_matches_port_address() {
    let mut io = Io::new();
    io.set_pressed_keys(&[0x1D]);

    assert_eq!(io.read(0x1D) & 0x01, 0x01);
    assert_eq!(io.read(0x1E) & 0x01, 0x00);
}

#[test]
fn key_snapshot_replaces_previous() {
    let mut io = Io::new();
    io.set_pressed_keys(&[0x02, 0x03]);
    io.set_pressed_keys(&[0x04]);

    assert!(!io.key_pressed(0x02));
    assert!(!io.key_pressed(0x03));
    assert!(io.key_pressed(0x04));
}

#[test]
fn vblank_and_reset_bits() {
    let mut io = Io::new();
    assert_eq!(io.read(0x00), 0);

    io.vblank = true;
    assert_eq!(io.read(0x00), 0x20);

    io.reset_line = true;
    assert_eq!(io.read(0x00), 0x22);

    io.vblank = false;
    assert_eq!(io.read(0x00), 0x02);
}

#[test]
fn out1_decodes_latch_bits() {
    let mut io = Io::new();
    io.write(0x00, 0x98);
    assert!(io.nmi_enabled);
    assert!(io.speaker);
    assert!(io.primary_video);

    io.write(0x00, 0x00);
    assert!(!io.nmi_enabled);
    assert!(!io.speaker);
    assert!(!io.primary_video);
}

#[test]
fn out_above_bank1_is_discarded() {
    let mut io = Io::new();
    io.write(0x00, 0x00);
    io.write(0x40, 0x98);
    io.write(0x80, 0x98);
    assert!(!io.nmi_enabled);
    assert!(!io.speaker);
    assert!(!io.primary_video);
}

#[test]
fn check_nmi_is_one_shot() {
    let mut io = Io::new();
    io.nmi_next = true;

    assert!(io.check_nmi());
    assert!(!io.check_nmi(), "the latch clears after one acceptance");
    assert!(!io.nmi_next);
}

#[test]
fn check_nmi_gated_by_enable() {
    let mut io = Io::new();
    io.nmi_enabled = false;
    io.nmi_next = true;

    assert!(!io.check_nmi());
    assert!(io.nmi_next, "a gated NMI stays pending");

    io.nmi_enabled = true;
    assert!(io.check_nmi());
}
