pub mod z80;
pub use z80::Z80;
