use crate::layout::{physical_to_virtual, virtual_to_physical};

/// Address in the CRC-free payload image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VirtAddr(u32);

/// Address on flash, counting the interleaved CRC bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysAddr(u32);

impl VirtAddr {
    pub const fn new(v: u32) -> Self {
        Self(v)
    }
    pub const fn raw(self) -> u32 {
        self.0
    }
    pub const fn to_physical(self) -> PhysAddr {
        PhysAddr(virtual_to_physical(self.0))
    }
}

impl PhysAddr {
    pub const fn new(v: u32) -> Self {
        Self(v)
    }
    pub const fn raw(self) -> u32 {
        self.0
    }
    pub const fn to_virtual(self) -> VirtAddr {
        VirtAddr(physical_to_virtual(self.0))
    }
}

impl From<u32> for VirtAddr {
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}
impl From<VirtAddr> for u32 {
    fn from(v: VirtAddr) -> u32 {
        v.raw()
    }
}

impl From<u32> for PhysAddr {
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}
impl From<PhysAddr> for u32 {
    fn from(v: PhysAddr) -> u32 {
        v.raw()
    }
}

impl From<VirtAddr> for PhysAddr {
    fn from(v: VirtAddr) -> Self {
        v.to_physical()
    }
}
impl From<PhysAddr> for VirtAddr {
    fn from(p: PhysAddr) -> Self {
        p.to_virtual()
    }
}
