use super::HistoryPosition;

/// Navigates the history tree as it stands at a given version.
#[derive(Debug, Clone, Copy)]
pub struct HistoryNavigator {
    version: u64,
    depth: u16,
}

impl HistoryNavigator {
    /// Navigator over the tree holding leaves `0..=version`.
    pub fn new(version: u64) -> Self {
        let depth = (u64::BITS - version.leading_zeros()) as u16;
        Self { version, depth }
    }

    /// Height of the root.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Root position.
    pub fn root(&self) -> HistoryPosition {
        HistoryPosition::new(0, self.depth)
    }

    /// Whether `pos` is a leaf.
    pub fn is_leaf(&self, pos: &HistoryPosition) -> bool {
        pos.height == 0
    }

    /// Whether `pos` is the root.
    pub fn is_root(&self, pos: &HistoryPosition) -> bool {
        pos.height == self.depth && pos.index == 0
    }

    /// Left child, absent for leaves.
    pub fn go_to_left(&self, pos: &HistoryPosition) -> Option<HistoryPosition> {
        if pos.height == 0 {
            return None;
        }
        Some(HistoryPosition::new(pos.index, pos.height - 1))
    }

    /// Right child, absent when it lies beyond the current version.
    pub fn go_to_right(&self, pos: &HistoryPosition) -> Option<HistoryPosition> {
        if pos.height == 0 {
            return None;
        }
        let index = pos.index.checked_add(1u64 << (pos.height - 1))?;
        if index > self.version {
            return None;
        }
        Some(HistoryPosition::new(index, pos.height - 1))
    }
}
