use super::HyperPosition;

/// Navigates a hyper trie of `num_bits` depth.
///
/// Key bits are numbered from the most significant bit of the first byte.
/// Going right from a node at height `h` sets bit `num_bits - h`.
#[derive(Debug, Clone, Copy)]
pub struct HyperNavigator {
    num_bits: u16,
}

fn set_bit(bits: &mut [u8], i: usize) {
    bits[i / 8] |= 1 << (7 - i % 8);
}

impl HyperNavigator {
    /// Navigator over a trie keyed by `num_bits`-bit digests.
    pub fn new(num_bits: u16) -> Self {
        Self { num_bits }
    }

    /// Key width in bytes.
    pub fn index_len(&self) -> usize {
        (self.num_bits as usize).div_ceil(8)
    }

    /// Root position.
    pub fn root(&self) -> HyperPosition {
        HyperPosition::new(vec![0u8; self.index_len()], self.num_bits)
    }

    /// Whether `pos` is a leaf.
    pub fn is_leaf(&self, pos: &HyperPosition) -> bool {
        pos.height == 0
    }

    /// Whether `pos` is the root.
    pub fn is_root(&self, pos: &HyperPosition) -> bool {
        pos.height == self.num_bits
    }

    /// Left child, absent for leaves.
    pub fn go_to_left(&self, pos: &HyperPosition) -> Option<HyperPosition> {
        if pos.height == 0 {
            return None;
        }
        Some(HyperPosition::new(pos.index.clone(), pos.height - 1))
    }

    /// Right child, absent for leaves.
    pub fn go_to_right(&self, pos: &HyperPosition) -> Option<HyperPosition> {
        if pos.height == 0 || pos.height > self.num_bits {
            return None;
        }
        let mut index = pos.index.clone();
        set_bit(&mut index, (self.num_bits - pos.height) as usize);
        Some(HyperPosition::new(index, pos.height - 1))
    }

    /// Left-most leaf under `pos`.
    pub fn descend_to_first(&self, pos: &HyperPosition) -> HyperPosition {
        HyperPosition::new(pos.index.clone(), 0)
    }

    /// Right-most leaf under `pos`.
    pub fn descend_to_last(&self, pos: &HyperPosition) -> HyperPosition {
        let mut index = pos.index.clone();
        let from = self.num_bits.saturating_sub(pos.height) as usize;
        for bit in from..self.num_bits as usize {
            set_bit(&mut index, bit);
        }
        HyperPosition::new(index, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_children() {
        let nav = HyperNavigator::new(8);
        let root = nav.root();
        assert_eq!(root, HyperPosition::new(vec![0], 8));
        assert!(nav.is_root(&root));
        assert_eq!(nav.go_to_left(&root), Some(HyperPosition::new(vec![0], 7)));
        assert_eq!(nav.go_to_right(&root), Some(HyperPosition::new(vec![0x80], 7)));
        assert_eq!(
            nav.go_to_right(&HyperPosition::new(vec![0x80], 7)),
            Some(HyperPosition::new(vec![0xc0], 6))
        );
        assert_eq!(
            nav.go_to_right(&HyperPosition::new(vec![0x00], 1)),
            Some(HyperPosition::new(vec![0x01], 0))
        );
        assert_eq!(nav.go_to_right(&HyperPosition::new(vec![0x01], 0)), None);
    }

    #[test]
    fn test_descend() {
        let nav = HyperNavigator::new(8);
        let pos = HyperPosition::new(vec![0x10], 4);
        assert_eq!(nav.descend_to_first(&pos), HyperPosition::new(vec![0x10], 0));
        assert_eq!(nav.descend_to_last(&pos), HyperPosition::new(vec![0x1f], 0));
        assert_eq!(nav.descend_to_last(&nav.root()), HyperPosition::new(vec![0xff], 0));
    }

    #[test]
    fn test_multi_byte_keys() {
        let nav = HyperNavigator::new(16);
        let pos = HyperPosition::new(vec![0x00, 0x00], 8);
        assert_eq!(nav.go_to_right(&pos), Some(HyperPosition::new(vec![0x00, 0x80], 7)));
        assert_eq!(nav.descend_to_last(&pos), HyperPosition::new(vec![0x00, 0xff], 0));
    }
}
