//! Wraparound-aware comparisons.
//!
//! Slot ids cycle through `0..N` forever and 16-bit sequence counters wrap,
//! so ordinary `<`/`>` cannot discriminate old from new near the wrap point.

/// Compares 16-bit sequence numbers with wrapping arithmetic.
pub fn sequence_greater_than(s1: u16, s2: u16) -> bool {
    ((s1 > s2) && (s1 - s2 <= 32768)) || ((s1 < s2) && (s2 - s1 > 32768))
}

/// Compares 16-bit sequence numbers with wrapping arithmetic.
pub fn sequence_less_than(s1: u16, s2: u16) -> bool {
    sequence_greater_than(s2, s1)
}

/// Returns whether `slot` lies within the circular span of `len` slots
/// beginning at `start`, in a window of `size` slots.
pub fn slot_within(start: u8, len: u8, slot: u8, size: u8) -> bool {
    debug_assert!(slot < size && start < size);
    let offset = if slot >= start { slot - start } else { slot + size - start };
    offset < len
}

/// Advances a slot id circularly within a window of `size` slots.
pub fn next_slot(slot: u8, size: u8) -> u8 {
    if slot + 1 < size {
        slot + 1
    } else {
        0
    }
}
