use core::fmt;

use crate::align::FlashBase;
use crate::units::{PhysAddr, VirtAddr};

/// Four lowercase hex digits, zero padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hex16(pub u16);

/// Eight lowercase hex digits, zero padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hex32(pub u32);

impl fmt::Display for Hex16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl fmt::Display for Hex32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", Hex32(self.raw()))
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", Hex32(self.raw()))
    }
}

impl fmt::Display for FlashBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base 0x{}", Hex32(self.raw()))
    }
}
