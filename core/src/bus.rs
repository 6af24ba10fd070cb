/// Capability interface the CPU executes against.
///
/// The machine implements this on its bus type; the CPU never owns the
/// memory or devices it talks to, so there are no reference cycles — the
/// CPU and the bus are sibling fields of the machine, stepped with a
/// plain `&mut`.
pub trait Bus {
    /// Fetch a byte from the memory address space.
    fn read(&mut self, addr: u16) -> u8;

    /// Store a byte into the memory address space.
    fn write(&mut self, addr: u16, data: u8);

    /// Read from the I/O port address space (separate from memory on
    /// the Z80). Only the low 8 address bits are decoded by the Primo
    /// hardware, so the port is passed as a single byte.
    ///
    /// Default: open bus.
    fn io_read(&mut self, _port: u8) -> u8 {
        0xFF
    }

    /// Write to the I/O port address space. Default: no device responds.
    fn io_write(&mut self, _port: u8, _data: u8) {}

    /// One-shot /NMI poll, consulted by the CPU between instructions.
    /// Returning `true` commits the interrupt: the bus side must clear
    /// its pending latch before returning.
    ///
    /// Default: line never asserted.
    fn take_nmi(&mut self) -> bool {
        false
    }
}
