use std::fmt;

/// Fixed-width acknowledgment bitset, one bit per ordered-window slot.
///
/// The ordered module keeps two of these: `local` marks slots this side has
/// fully received and buffered, `remote` mirrors what the peer reports in its
/// ack payloads.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Mask(u16);

impl Mask {
    /// Number of slots the mask covers.
    pub const LEN: u8 = u16::BITS as u8;

    /// Builds a mask from its wire value.
    pub fn from_value(value: u16) -> Self {
        Mask(value)
    }

    /// Returns the wire value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Returns the bit for `slot`. Slots past the width read as false.
    pub fn get(self, slot: u8) -> bool {
        slot < Self::LEN && self.0 & (1 << slot) != 0
    }

    /// Sets or clears the bit for `slot`.
    pub fn set(&mut self, slot: u8, value: bool) {
        if slot < Self::LEN {
            if value {
                self.0 |= 1 << slot;
            } else {
                self.0 &= !(1 << slot);
            }
        }
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mask({:016b})", self.0)
    }
}
