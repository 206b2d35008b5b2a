use crate::SZ_16M;

/// Smallest multiple of `alignment` that is `>= value`.
///
/// Widened to `u64` since rounding up past `u32::MAX` is a valid result.
/// Panics if `alignment` is zero.
pub const fn ceil_align(value: u32, alignment: u32) -> u64 {
    (value as u64).div_ceil(alignment as u64) * alignment as u64
}

/// [`ceil_align`] for callers that need a `u32`; `None` when the aligned
/// value does not fit.
pub const fn checked_ceil_align(value: u32, alignment: u32) -> Option<u32> {
    let aligned = ceil_align(value, alignment);
    if aligned > u32::MAX as u64 {
        None
    } else {
        Some(aligned as u32)
    }
}

/// Largest multiple of `alignment` that is `<= value`.
///
/// Panics if `alignment` is zero.
pub const fn floor_align(value: u32, alignment: u32) -> u32 {
    (value / alignment) * alignment
}

/// True when `[addr, addr + size)` does not fit below the 16 MiB window.
///
/// Reaching the top of the window exactly already counts as out of range.
pub const fn is_out_of_range(addr: u32, size: u32) -> bool {
    addr as u64 + size as u64 >= SZ_16M as u64
}

/// Offsets a logical address by the flash base.
pub const fn p2v(addr: u32, base: u32) -> u32 {
    addr.wrapping_sub(base)
}

/// Base address of the flash image, threaded through explicitly instead of
/// living in global state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashBase(u32);

impl FlashBase {
    pub const fn new(base: u32) -> Self {
        Self(base)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn p2v(self, addr: u32) -> u32 {
        p2v(addr, self.0)
    }
}

impl From<u32> for FlashBase {
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}
