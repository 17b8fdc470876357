use super::HyperPosition;

/// Decides how the hyper trie is traversed for one target key.
///
/// Above `cache_level` every node has its own persisted digest; at or below
/// it subtrees are recomputed from their leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleTargetedCacheResolver {
    num_bits: u16,
    cache_level: u16,
    key: Vec<u8>,
}

impl SingleTargetedCacheResolver {
    /// Resolver for `key` in a trie of `num_bits` depth.
    pub fn new(num_bits: u16, cache_level: u16, key: Vec<u8>) -> Self {
        Self {
            num_bits,
            cache_level,
            key,
        }
    }

    /// Whether nodes at this height have individually persisted digests.
    pub fn should_cache(&self, pos: &HyperPosition) -> bool {
        pos.height > self.cache_level
    }

    /// Whether `pos` lies on the path from the root to the target key.
    ///
    /// Only the bit that tells a node apart from its sibling is compared, so
    /// the answer is meaningful for children of on-path nodes.
    pub fn is_on_path(&self, pos: &HyperPosition) -> bool {
        if pos.height >= self.num_bits {
            return true;
        }
        let bit = (self.num_bits - pos.height - 1) as usize;
        bit_at(&self.key, bit) == bit_at(&pos.index, bit)
    }

    /// Whether the digest of `pos` is read from the cache: persisted and off
    /// the target path.
    pub fn should_be_in_cache(&self, pos: &HyperPosition) -> bool {
        self.should_cache(pos) && !self.is_on_path(pos)
    }
}

fn bit_at(bytes: &[u8], i: usize) -> bool {
    bytes
        .get(i / 8)
        .is_some_and(|byte| byte & (1 << (7 - i % 8)) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(index: u8, height: u16) -> HyperPosition {
        HyperPosition::new(vec![index], height)
    }

    #[test]
    fn test_should_be_in_cache() {
        let resolver = SingleTargetedCacheResolver::new(8, 3, vec![0]);
        // height <= cache level
        assert!(!resolver.should_be_in_cache(&pos(8, 3)));
        // above cache level, off path
        assert!(resolver.should_be_in_cache(&pos(16, 4)));
        // on path
        assert!(!resolver.should_be_in_cache(&pos(0, 4)));
        assert!(!resolver.should_be_in_cache(&pos(0, 2)));
    }

    #[test]
    fn test_should_cache() {
        let resolver = SingleTargetedCacheResolver::new(8, 3, vec![0]);
        assert!(resolver.should_cache(&pos(0, 4)));
        assert!(!resolver.should_cache(&pos(0, 3)));
    }

    #[test]
    fn test_is_on_path() {
        let resolver = SingleTargetedCacheResolver::new(8, 3, vec![0]);
        assert!(!resolver.is_on_path(&pos(4, 2)));
        assert!(resolver.is_on_path(&pos(0, 1)));
        assert!(resolver.is_on_path(&pos(0, 8)));

        let resolver = SingleTargetedCacheResolver::new(8, 3, vec![0xff]);
        assert!(resolver.is_on_path(&pos(0x80, 7)));
        assert!(!resolver.is_on_path(&pos(0x00, 7)));
        assert!(resolver.is_on_path(&pos(0xff, 0)));
        assert!(!resolver.is_on_path(&pos(0xfe, 0)));
    }
}
