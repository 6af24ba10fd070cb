//! I/O port decoding.
//!
//! The 8-bit port space folds into four 64-port banks: 0x00-0x3F is the
//! primary IN-1/OUT-1 bank (keyboard strobe, vblank and reset inputs;
//! NMI-enable, speaker and screen-page outputs), 0x40-0x7F answers for
//! the disconnected joysticks, and the upper half is unused.

const IN_VBLANK_BIT: u8 = 0x20;
const IN_RESET_BIT: u8 = 0x02;
const IN_KEYBOARD_BIT: u8 = 0x01;

const OUT_NMI_BIT: u8 = 0x80;
const OUT_SPEAKER_BIT: u8 = 0x10;
const OUT_SCREEN_PAGE_BIT: u8 = 0x08;

const IN_JOY1_BIT: u8 = 0x01;
const IN_JOY2_BIT: u8 = 0x04;

pub struct Io {
    /// NMI gate, driven by the firmware through OUT-1 bit 7.
    pub nmi_enabled: bool,
    /// Pending-NMI latch, armed by the scheduler once per tick.
    pub nmi_next: bool,
    /// Active display page (OUT-1 bit 3).
    pub primary_video: bool,
    /// Speaker line (OUT-1 bit 4).
    pub speaker: bool,
    /// Vertical-blank window, asserted at the top of each tick.
    pub vblank: bool,
    /// Hardware reset button line.
    pub reset_line: bool,
    /// Pressed key codes (0x00-0x3F), one bit per code.
    keys: u64,
}

impl Io {
    pub fn new() -> Self {
        Self {
            nmi_enabled: true,
            nmi_next: false,
            primary_video: true,
            speaker: false,
            vblank: false,
            reset_line: false,
            keys: 0,
        }
    }

    /// Publish the host's key snapshot for the coming tick.
    pub fn set_pressed_keys(&mut self, codes: &[u8]) {
        self.keys = 0;
        for &code in codes {
            self.keys |= 1 << (code & 0x3F);
        }
    }

    pub fn key_pressed(&self, code: u8) -> bool {
        self.keys >> (code & 0x3F) & 1 == 1
    }

    pub fn read(&self, port: u8) -> u8 {
        // 0x80-0xFF: unused
        if port > 0x7F {
            return 0;
        }

        // 0x40-0x7F: IN-2 — both joysticks report connected, no direction
        if port > 0x3F {
            return IN_JOY1_BIT | IN_JOY2_BIT;
        }

        // 0x00-0x3F: IN-1 — the low six port bits double as the key
        // strobe address
        let mut val = 0;
        if self.vblank {
            val |= IN_VBLANK_BIT;
        }
        if self.reset_line {
            val |= IN_RESET_BIT;
        }
        if self.key_pressed(port) {
            val |= IN_KEYBOARD_BIT;
        }
        val
    }

    pub fn write(&mut self, port: u8, b: u8) {
        // Only OUT-1 latches anything; OUT-2 and above are discarded
        if port > 0x3F {
            return;
        }

        self.nmi_enabled = b & OUT_NMI_BIT != 0;
        self.speaker = b & OUT_SPEAKER_BIT != 0;
        self.primary_video = b & OUT_SCREEN_PAGE_BIT != 0;
    }

    /// One-shot NMI arbitration: fires at most once per arming of
    /// `nmi_next`, and only while the firmware holds the gate open.
    pub fn check_nmi(&mut self) -> bool {
        if !self.nmi_enabled || !self.nmi_next {
            return false;
        }
        self.nmi_next = false;
        true
    }
}

impl Default for Io {
    fn default() -> Self {
        Self::new()
    }
}
