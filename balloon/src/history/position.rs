use byteorder::{BigEndian, ByteOrder};

use crate::position::Position;

/// History tree node address.
///
/// `index` is the left-most leaf covered by the node and `height` the
/// subtree height, so the node covers leaves `index..=index + 2^height - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryPosition {
    /// Left-most covered leaf
    pub index: u64,
    /// Height above the leaves
    pub height: u16,
}

impl HistoryPosition {
    /// Create a position.
    pub fn new(index: u64, height: u16) -> Self {
        Self { index, height }
    }

    /// Right-most covered leaf, saturating at `u64::MAX`.
    pub fn last_index(&self) -> u64 {
        if self.height >= 64 {
            return u64::MAX;
        }
        self.index.saturating_add((1u64 << self.height) - 1)
    }
}

impl Position for HistoryPosition {
    fn height(&self) -> u16 {
        self.height
    }

    fn bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; 10];
        BigEndian::write_u64(&mut bytes[..8], self.index);
        BigEndian::write_u16(&mut bytes[8..], self.height);
        bytes
    }

    fn string_id(&self) -> String {
        format!("{:x}|{}", self.index, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_layout() {
        let pos = HistoryPosition::new(0x0102, 3);
        assert_eq!(pos.bytes(), vec![0, 0, 0, 0, 0, 0, 0x01, 0x02, 0, 3]);
    }

    #[test]
    fn test_string_id() {
        assert_eq!(HistoryPosition::new(0, 1).string_id(), "0|1");
        assert_eq!(HistoryPosition::new(255, 0).string_id(), "ff|0");
    }

    #[test]
    fn test_last_index() {
        assert_eq!(HistoryPosition::new(4, 2).last_index(), 7);
        assert_eq!(HistoryPosition::new(3, 0).last_index(), 3);
        assert_eq!(HistoryPosition::new(0, 64).last_index(), u64::MAX);
    }
}
