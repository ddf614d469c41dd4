use core::fmt;
use core::num::NonZeroU32;

/// Arena key for elements and junctions.
///
/// Stored as `index + 1` so that `Option<Id>` costs nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Id for a 0-based arena slot. Saturates at `u32::MAX - 1`.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

pub type ElementId = Id;
pub type NodeId = Id;

/// Hands out ids in insertion order.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> Id {
        let id = Id::from_index(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_survive_the_offset() {
        for i in [0_u32, 7, 1_000, u32::MAX - 1] {
            assert_eq!(Id::from_index(i).index(), i);
        }
        assert_eq!(Id::from_index(u32::MAX).index(), u32::MAX - 1);
    }

    #[test]
    fn optional_id_has_no_overhead() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }

    #[test]
    fn allocator_is_sequential() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id().index(), 0);
        assert_eq!(ids.next_id().index(), 1);
        assert_eq!(ids.issued(), 2);
        assert_eq!(format!("{:?}", Id::from_index(4)), "#4");
    }
}
