use crate::position::Position;

/// Hyper trie node address.
///
/// `index` holds the key prefix shared by every leaf under the node, padded
/// with zero bits to the full key width; `height` counts the bits left to
/// reach the leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HyperPosition {
    /// Key prefix, full key width
    pub index: Vec<u8>,
    /// Height above the leaves
    pub height: u16,
}

impl HyperPosition {
    /// Create a position.
    pub fn new(index: Vec<u8>, height: u16) -> Self {
        Self { index, height }
    }
}

impl Position for HyperPosition {
    fn height(&self) -> u16 {
        self.height
    }

    fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.index.len() + 2);
        bytes.extend_from_slice(&self.index);
        bytes.extend_from_slice(&self.height.to_be_bytes());
        bytes
    }

    fn string_id(&self) -> String {
        format!("{}|{}", hex::encode(&self.index), self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_and_id() {
        let pos = HyperPosition::new(vec![0x80], 7);
        assert_eq!(pos.bytes(), vec![0x80, 0x00, 0x07]);
        assert_eq!(pos.string_id(), "80|7");
        assert_eq!(HyperPosition::new(vec![0x01], 0).string_id(), "01|0");
    }
}
