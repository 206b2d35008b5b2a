use core::fmt;

/// Bit-serial CRC16 over the Beken polynomial, as stored after every
/// 32 byte flash block.
pub struct BekenCrc16 {
    crc: u32,
}

impl BekenCrc16 {
    const POLY: u32 = 0x8005;
    const INIT: u32 = 0xFFFF_FFFF;

    pub fn new() -> Self {
        Self { crc: Self::INIT }
    }

    pub fn reset(&mut self) {
        self.crc = Self::INIT;
    }

    pub fn append(&mut self, data: &[u8]) {
        // The accumulator is never masked. Shifts and the 16 bit XOR only
        // move bits upward, so bits 0..=15 never depend on what falls off
        // the top of the u32.
        for &byte in data {
            self.crc ^= (byte as u32) << 8;

            for _ in 0..8 {
                self.crc = if (self.crc & 0x8000) != 0 {
                    (self.crc << 1) ^ Self::POLY
                } else {
                    self.crc << 1
                };
            }
        }
    }

    pub fn checksum(&self) -> u16 {
        (self.crc & 0xFFFF) as u16
    }

    pub fn crc16(data: &[u8]) -> u16 {
        let mut c = Self::new();
        c.append(data);
        c.checksum()
    }
}

impl Default for BekenCrc16 {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrcRangeError {
    NegativeOffset(isize),
    OutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },
}

impl fmt::Display for CrcRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrcRangeError::NegativeOffset(o) => write!(f, "negative offset {}", o),
            CrcRangeError::OutOfBounds {
                offset,
                length,
                len,
            } => write!(
                f,
                "range {}+{} exceeds buffer of {} bytes",
                offset, length, len
            ),
        }
    }
}

impl core::error::Error for CrcRangeError {}

/// CRC16 of `data[offset..offset + length]`.
pub fn try_crc16(data: &[u8], offset: isize, length: usize) -> Result<u16, CrcRangeError> {
    let start = usize::try_from(offset).map_err(|_| CrcRangeError::NegativeOffset(offset))?;
    let range = start
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .map(|end| start..end)
        .ok_or(CrcRangeError::OutOfBounds {
            offset: start,
            length,
            len: data.len(),
        })?;
    Ok(BekenCrc16::crc16(&data[range]))
}

/// Like [`try_crc16`], but collapses every failure (including a missing
/// buffer) to 0.
///
/// 0 is also a legitimate checksum; use [`try_crc16`] when the caller needs
/// to tell them apart. Any range that does not fit the buffer returns 0,
/// which is stricter than the old packager's guard but never reads past
/// the end.
pub fn crc16(data: Option<&[u8]>, offset: isize, length: usize) -> u16 {
    data.and_then(|d| try_crc16(d, offset, length).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_zero_byte() {
        // 0xFFFF -> 7FFB FFF6 7FE9 FFD2 7FA1 FF42 7E81 FD02
        assert_eq!(crc16(Some(&[0x00]), 0, 1), 0xFD02);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(BekenCrc16::crc16(b"123456789"), 0xAEE7);
        assert_eq!(BekenCrc16::crc16(&[]), 0xFFFF);
        assert_eq!(BekenCrc16::crc16(&[0x01]), 0x7D07);
        assert_eq!(BekenCrc16::crc16(&hex::decode("a55a").unwrap()), 0x5FDB);
        assert_eq!(BekenCrc16::crc16(&[0xFF; 32]), 0x000C);

        let ramp: Vec<u8> = (0..32).collect();
        assert_eq!(BekenCrc16::crc16(&ramp), 0x259D);
    }

    #[test]
    fn sub_range() {
        let data = b"123456789";
        assert_eq!(crc16(Some(data), 2, 4), 0xC109);
        assert_eq!(crc16(Some(data), 2, 4), BekenCrc16::crc16(b"3456"));
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut c = BekenCrc16::new();
        for chunk in data.chunks(7) {
            c.append(chunk);
        }
        assert_eq!(c.checksum(), BekenCrc16::crc16(&data));

        c.reset();
        assert_eq!(c.checksum(), 0xFFFF);
        c.append(&[0x00]);
        assert_eq!(c.checksum(), 0xFD02);
    }

    #[test]
    fn long_input_keeps_low_bits_exact() {
        // Masking every round must agree with the unmasked accumulator.
        fn masked(data: &[u8]) -> u16 {
            let mut crc: u16 = 0xFFFF;
            for &b in data {
                crc ^= (b as u16) << 8;
                for _ in 0..8 {
                    crc = if crc & 0x8000 != 0 {
                        (crc << 1) ^ 0x8005
                    } else {
                        crc << 1
                    };
                }
            }
            crc
        }

        let data = [0xFFu8; 4096];
        assert_eq!(BekenCrc16::crc16(&data), masked(&data));
        let ramp: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert_eq!(BekenCrc16::crc16(&ramp), masked(&ramp));
    }

    #[test]
    fn deterministic_and_sensitive() {
        let mut data: Vec<u8> = (0..64).collect();
        let a = crc16(Some(&data), 0, data.len());
        assert_eq!(a, crc16(Some(&data), 0, data.len()));

        for i in 0..data.len() {
            data[i] ^= 0x01;
            assert_ne!(crc16(Some(&data), 0, data.len()), a, "flip at {i}");
            data[i] ^= 0x01;
        }
    }

    #[test]
    fn degenerate_inputs() {
        let data = [1u8, 2, 3, 4, 5];
        assert_eq!(crc16(None, 0, 0), 0);
        assert_eq!(crc16(Some(&data), -1, 5), 0);
        assert_eq!(crc16(Some(&data), 5, 1), 0);
        assert_eq!(crc16(Some(&data), 3, 3), 0);
        assert_eq!(crc16(Some(&data), 0, usize::MAX), 0);
        assert_eq!(crc16(Some(&data), 5, 0), 0xFFFF);
    }

    #[test]
    fn range_errors() {
        let data = [0u8; 4];
        assert_eq!(
            try_crc16(&data, -2, 1),
            Err(CrcRangeError::NegativeOffset(-2))
        );
        assert_eq!(
            try_crc16(&data, 2, 3),
            Err(CrcRangeError::OutOfBounds {
                offset: 2,
                length: 3,
                len: 4
            })
        );
        assert_eq!(try_crc16(&data, 0, 4), Ok(BekenCrc16::crc16(&data)));
    }
}
