#![cfg_attr(not(test), no_std)]
pub mod align;
pub mod crc16;
pub mod fmt;
pub mod layout;
pub mod parse;
pub mod units;

/// Size of the flash address window.
pub const SZ_16M: u32 = 0x100_0000;
/// CRC bytes appended to every payload block.
pub const CRC_SIZE: u32 = 2;
/// Payload bytes per CRC-protected block.
pub const CRC_PACKET: u32 = 32;
/// Physical footprint of one payload block plus its CRC.
pub const PHY_BLOCK: u32 = CRC_PACKET + CRC_SIZE;

pub use align::{FlashBase, ceil_align, checked_ceil_align, floor_align, is_out_of_range, p2v};
pub use crc16::{BekenCrc16, CrcRangeError, crc16, try_crc16};
pub use layout::{
    checked_crc_size, crc_addr, crc_size, physical_to_virtual, virtual_to_physical,
};
pub use units::{PhysAddr, VirtAddr};
