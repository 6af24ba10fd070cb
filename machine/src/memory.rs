//! The 64 KiB address space: write-protected firmware prefix, work RAM,
//! and the memory-mapped screen pages with their RGBA decoders.

use crate::rom::{self, RomError, RomLabel, RomSet, RomVariant};

pub const MEMORY_SIZE: usize = 0x10000;

/// Monochrome display colors (light pixels on a dark field).
const MONO_ON: [u8; 4] = [0xEC, 0xEC, 0xEC, 0xFF];
const MONO_OFF: [u8; 4] = [0x18, 0x18, 0x18, 0xFF];

/// Number of repeated keyboard scans GOMBM requires before a keypress
/// registers. The stock value is tuned for hardware debounce; host
/// keyboards are clean, so the count is lowered at load to keep typing
/// responsive.
const KEYBOARD_REPEAT: u8 = 48;

/// The two memory-mapped display pages. Primary sits at the top of the
/// address space, Secondary directly below it; exact ranges depend on
/// the firmware variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScreenPage {
    Primary,
    Secondary,
}

/// Chunk geometry selector of a color screen page, encoded in the low
/// bits of the page's first byte. Unknown encodings fall back to 4x4.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColoringMode {
    M4x4,
    M6x6,
    M6x9,
}

impl ColoringMode {
    pub fn from_byte(b: u8) -> Self {
        match b & 0x07 {
            2 => Self::M6x6,
            6 => Self::M6x9,
            _ => Self::M4x4,
        }
    }

    /// Chunk (width, height) in pixels.
    fn chunk_size(self) -> (usize, usize) {
        match self {
            Self::M4x4 => (4, 4),
            Self::M6x6 => (6, 6),
            Self::M6x9 => (6, 9),
        }
    }
}

/// Flat 64 KiB memory with the firmware image locked at the bottom.
pub struct Memory {
    data: [u8; MEMORY_SIZE],
    /// First writable address; stores below it are silently dropped.
    protected: u16,
    variant: RomVariant,
}

impl Memory {
    pub fn new(roms: &RomSet, variant: RomVariant) -> Result<Self, RomError> {
        let image = roms.image(variant)?;
        let mut data = [0u8; MEMORY_SIZE];
        data[..image.len()].copy_from_slice(image);

        let mut mem = Self {
            data,
            protected: image.len() as u16,
            variant,
        };

        // Lower the GOMBM repeat count (fourth byte of the subroutine).
        // The C firmware scans differently and is left untouched.
        if variant != RomVariant::C {
            let addr = mem.label_addr(RomLabel::Gombm) + 3;
            mem.data[addr as usize] = KEYBOARD_REPEAT;
        }

        Ok(mem)
    }

    pub fn variant(&self) -> RomVariant {
        self.variant
    }

    /// First writable address (== firmware image length).
    pub fn protected(&self) -> u16 {
        self.protected
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    pub fn write(&mut self, addr: u16, b: u8) {
        if addr < self.protected {
            return;
        }
        self.data[addr as usize] = b;
    }

    /// Address of a firmware label in the active ROM.
    ///
    /// # Panics
    ///
    /// Panics if the (label, variant) pair is unmapped; querying those
    /// is a programmer error.
    pub fn label_addr(&self, label: RomLabel) -> u16 {
        rom::address_of(self.variant, label)
            .unwrap_or_else(|| panic!("label {label:?} is not mapped in ROM {}", self.variant))
    }

    /// Inclusive address range of a screen page.
    fn page_range(&self, page: ScreenPage) -> (u16, u16) {
        match (self.variant, page) {
            (RomVariant::A | RomVariant::B, ScreenPage::Primary) => (0xE800, 0xFFFF),
            (RomVariant::A | RomVariant::B, ScreenPage::Secondary) => (0xC800, 0xDFFF),
            (RomVariant::C, ScreenPage::Primary) => (0xE000, 0xFFFF),
            (RomVariant::C, ScreenPage::Secondary) => (0xC000, 0xDFFF),
        }
    }

    /// Active coloring mode of a page (color variant only).
    pub fn coloring_mode(&self, page: ScreenPage) -> ColoringMode {
        let (start, _) = self.page_range(page);
        ColoringMode::from_byte(self.read(start))
    }

    /// Display resolution in pixels. The monochrome firmware always runs
    /// 256x192; the color firmware trades rows for the chunk table.
    pub fn screen_resolution(&self, page: ScreenPage) -> (u32, u32) {
        if self.variant == RomVariant::C {
            if self.coloring_mode(page) == ColoringMode::M4x4 {
                (256, 200)
            } else {
                (256, 216)
            }
        } else {
            (256, 192)
        }
    }

    /// Decode a screen page into an RGBA pixel buffer (w * h * 4 bytes).
    ///
    /// Framebuffer bits occupy the top `w*h/8` bytes of the page range;
    /// each byte supplies 8 pixels, most significant bit first, left to
    /// right then top to bottom.
    pub fn decode_screen(&self, page: ScreenPage) -> Vec<u8> {
        match self.variant {
            RomVariant::C => self.decode_color(page),
            _ => self.decode_mono(page),
        }
    }

    fn decode_mono(&self, page: ScreenPage) -> Vec<u8> {
        let (start, end) = self.page_range(page);
        let (w, h) = self.screen_resolution(page);
        let fb_len = (w * h / 8) as usize;
        let fb_start = end as usize - fb_len + 1;
        debug_assert!(fb_start >= start as usize);

        let mut pix = Vec::with_capacity(fb_len * 8 * 4);
        for addr in fb_start..=end as usize {
            let b = self.data[addr];
            for n in (0..8).rev() {
                if (b >> n) & 1 == 1 {
                    pix.extend_from_slice(&MONO_ON);
                } else {
                    pix.extend_from_slice(&MONO_OFF);
                }
            }
        }
        pix
    }

    /// Palette index selected by the page's second byte. Three palettes
    /// live above the background block; bit 0 wins over bit 1 over
    /// bit 2, defaulting to the first.
    fn active_palette(&self, page_start: u16) -> u16 {
        let b = self.read(page_start + 1);
        if b & 0x01 != 0 {
            1
        } else if b & 0x02 != 0 {
            2
        } else if b & 0x04 != 0 {
            3
        } else {
            1
        }
    }

    fn decode_color(&self, page: ScreenPage) -> Vec<u8> {
        let (start, end) = self.page_range(page);
        let (w, h) = self.screen_resolution(page);
        let (chunk_w, chunk_h) = self.coloring_mode(page).chunk_size();
        let palette = self.active_palette(start);

        let fb_len = (w * h / 8) as usize;
        let fb_start = end as usize - fb_len + 1;

        let mut pix = Vec::with_capacity(fb_len * 8 * 4);
        let mut px = 0usize;
        for addr in fb_start..=end as usize {
            let b = self.data[addr];
            for n in (0..8).rev() {
                let on = (b >> n) & 1 == 1;
                pix.extend_from_slice(&self.chunk_color(
                    start, palette, chunk_w, chunk_h,
                    px % w as usize, px / w as usize, on,
                ));
                px += 1;
            }
        }
        pix
    }

    /// Resolve one pixel through the chunk color table.
    ///
    /// Chunks tile the screen; a nibble per chunk indexes into the
    /// selected 32-byte palette block (backgrounds in the lower half,
    /// foregrounds in the upper). With 6-wide chunks the first on-screen
    /// chunk is only 4 pixels wide and later chunks read their nibble
    /// one byte further in.
    fn chunk_color(
        &self,
        page_start: u16,
        palette: u16,
        chunk_w: usize,
        chunk_h: usize,
        col: usize,
        row: usize,
        on: bool,
    ) -> [u8; 4] {
        let chunk_row = row / chunk_h;
        let (chunk_col, offset) = if chunk_w == 4 {
            (col / 4, 0u16)
        } else if col < 4 {
            (0, 0)
        } else {
            ((col - 4) / 6, 1)
        };

        let index_addr = page_start
            + 4 * 32
            + (chunk_row as u16) * 32
            + (chunk_col as u16) / 2
            + offset;
        let packed = self.read(index_addr);
        let color_index = if chunk_col % 2 == 0 {
            (packed >> 4) as u16
        } else {
            (packed & 0x0F) as u16
        };

        let fg_offset = if on { 16 } else { 0 };
        let color = self.read(page_start + palette * 32 + color_index + fg_offset);
        Self::expand_rgb332(color)
    }

    /// 3:3:2 RGB expanded to 8-bit channels. The integer scale factors
    /// slightly under-saturate full-intensity channels; existing screen
    /// captures depend on the exact values.
    fn expand_rgb332(b: u8) -> [u8; 4] {
        [
            ((b >> 5) & 0x07) * (0xFF / 7),
            ((b >> 2) & 0x07) * (0xFF / 7),
            (b & 0x03) * (0xFF / 3),
            0xFF,
        ]
    }
}
