//! Critical-bit arithmetic on byte strings.
//!
//! Keys are compared as if zero-padded to a common length, so keys that
//! differ only in trailing `0x00` bytes cannot be told apart.

/// The first bit at which two keys differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CritBit {
    /// Byte offset of the first differing byte.
    pub offset: u32,
    /// Mask with only the most significant differing bit of that byte set.
    pub bit: u8,
    /// Child slot the *stored* key takes under a node branching here:
    /// `1` when the stored key has the bit set, `0` otherwise.
    pub direction: usize,
}

impl CritBit {
    /// Absolute bit index, see [`bit_position`].
    #[inline]
    pub fn position(&self) -> u64 {
        bit_position(self.offset, self.bit)
    }
}

/// Byte at `offset`, or `0` past the end of the key.
#[inline]
pub(crate) fn byte_at(key: &[u8], offset: usize) -> u8 {
    key.get(offset).copied().unwrap_or(0)
}

/// Child slot `key` falls into at a node testing `bit` of byte `offset`.
#[inline]
pub(crate) fn direction(key: &[u8], offset: u32, bit: u8) -> usize {
    usize::from(byte_at(key, offset as usize) & bit != 0)
}

/// Clears every bit of `x` except the highest set one.
#[inline]
pub(crate) fn highest_bit(mut x: u8) -> u8 {
    x |= x >> 1;
    x |= x >> 2;
    x |= x >> 4;
    x & !(x >> 1)
}

/// Bit index from the start of the key, where bit `0` is the MSB of byte 0.
///
/// Nodes closer to the root always have a smaller position than their
/// descendants.
#[inline]
pub(crate) fn bit_position(offset: u32, bit: u8) -> u64 {
    debug_assert!(bit.is_power_of_two());
    u64::from(offset) * 8 + u64::from(bit.leading_zeros())
}

/// Locates the most significant bit at which `stored` and `key` differ.
///
/// Returns `None` when the keys are identical (after zero padding).
pub fn find_critical_bit(stored: &[u8], key: &[u8]) -> Option<CritBit> {
    let common = stored.iter().zip(key).position(|(a, b)| a != b);
    let offset = match common {
        Some(offset) => offset,
        None => {
            let shorter = stored.len().min(key.len());
            let longer = stored.len().max(key.len());
            (shorter..longer).find(|&i| byte_at(stored, i) != byte_at(key, i))?
        }
    };

    let ch = byte_at(stored, offset);
    let bit = highest_bit(ch ^ byte_at(key, offset));
    debug_assert!(u32::try_from(offset).is_ok());
    Some(CritBit {
        offset: offset as u32,
        bit,
        direction: usize::from(ch & bit != 0),
    })
}
