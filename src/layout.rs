//! Address translation for the CRC-interleaved flash layout.
//!
//! Flash is written in blocks of 32 payload bytes followed by a 2 byte
//! CRC16. A "virtual" address counts payload bytes only, a "physical"
//! address counts every byte on the chip:
//!
//! ```text
//! virtual   | 0 .. 31 | 32 .. 63 | 64 ..
//! physical  | 0 .. 31 | 32 33 | 34 .. 65 | 66 67 | 68 ..
//!                       ^crc            ^crc
//! ```
//!
//! None of these functions validate their input; check the region with
//! [`crate::is_out_of_range`] first. Arithmetic wraps at `u32`.

use crate::{CRC_PACKET, PHY_BLOCK};

pub const fn virtual_to_physical(addr: u32) -> u32 {
    (addr % CRC_PACKET).wrapping_add((addr / CRC_PACKET).wrapping_mul(PHY_BLOCK))
}

/// Inverse of [`virtual_to_physical`].
///
/// Only meaningful for addresses that land on payload bytes; an address
/// inside a block's CRC maps past the end of that block's payload.
pub const fn physical_to_virtual(addr: u32) -> u32 {
    (addr % PHY_BLOCK).wrapping_add((addr / PHY_BLOCK).wrapping_mul(CRC_PACKET))
}

/// Physical size of `size` payload bytes. A trailing partial block still
/// carries a full CRC.
pub const fn crc_size(size: u32) -> u32 {
    size.div_ceil(CRC_PACKET).wrapping_mul(PHY_BLOCK)
}

/// [`crc_size`] without wrapping; `None` when the physical size does not
/// fit in a `u32`.
pub const fn checked_crc_size(size: u32) -> Option<u32> {
    size.div_ceil(CRC_PACKET).checked_mul(PHY_BLOCK)
}

/// Physical address of the first block boundary at or after virtual `addr`.
pub const fn crc_addr(addr: u32) -> u32 {
    crc_size(addr)
}
