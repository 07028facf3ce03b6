//! Platform seams.
//!
//! The access layer needs exactly two things from the host: raw 32-bit
//! register access at a byte offset inside the configuration BAR, and a
//! microsecond delay for busy polling. Locking is provided internally with
//! `spin::Mutex`; allocation goes through `alloc`.

/// Raw access to the DMA engine's configuration BAR.
pub trait RegisterAccess {
    /// Read a 32-bit register at byte `offset`.
    fn read32(&self, offset: u32) -> u32;

    /// Write a 32-bit register at byte `offset`.
    fn write32(&mut self, offset: u32, value: u32);

    /// Write consecutive 32-bit registers starting at byte `offset`.
    fn write_block(&mut self, offset: u32, values: &[u32]) {
        for (i, value) in values.iter().enumerate() {
            self.write32(offset + (i as u32) * 4, *value);
        }
    }

    /// Read consecutive 32-bit registers starting at byte `offset`.
    fn read_block(&self, offset: u32, out: &mut [u32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.read32(offset + (i as u32) * 4);
        }
    }
}

/// Microsecond busy-wait used between polls.
pub trait Delay {
    /// Wait at least `us` microseconds.
    fn delay_us(&self, us: u32);
}

impl<F: Fn(u32)> Delay for F {
    fn delay_us(&self, us: u32) {
        self(us)
    }
}

/// Memory-mapped configuration BAR.
pub struct MmioRegisters {
    /// Base of the mapped BAR.
    base: *mut u8,
    /// Mapped length in bytes.
    len: usize,
}

impl MmioRegisters {
    /// Wrap a mapped BAR.
    ///
    /// # Safety
    ///
    /// - `base` must point to a mapping of at least `len` bytes of device memory.
    /// - The mapping must stay valid for the lifetime of this value.
    pub unsafe fn new(base: *mut u8, len: usize) -> Self {
        Self { base, len }
    }

    /// Mapped length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn in_bounds(&self, offset: u32) -> bool {
        offset % 4 == 0 && (offset as usize) + 4 <= self.len
    }
}

impl RegisterAccess for MmioRegisters {
    fn read32(&self, offset: u32) -> u32 {
        if !self.in_bounds(offset) {
            log::error!("read32: offset {:#x} outside BAR ({:#x} bytes)", offset, self.len);
            return u32::MAX;
        }
        // SAFETY: offset checked against the mapping established in `new`
        unsafe { core::ptr::read_volatile(self.base.add(offset as usize) as *const u32) }
    }

    fn write32(&mut self, offset: u32, value: u32) {
        if !self.in_bounds(offset) {
            log::error!("write32: offset {:#x} outside BAR ({:#x} bytes)", offset, self.len);
            return;
        }
        // SAFETY: offset checked against the mapping established in `new`
        unsafe { core::ptr::write_volatile(self.base.add(offset as usize) as *mut u32, value) }
    }
}

// SAFETY: MMIO access is serialized by the engine's register-window lock
unsafe impl Send for MmioRegisters {}
unsafe impl Sync for MmioRegisters {}
