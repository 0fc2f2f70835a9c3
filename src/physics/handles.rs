use std::hash::Hash;

// Newtype pattern for enhanced type safety. The generation lets stale handles be detected after
// their slot is reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl EntityHandle {
    #[inline(always)]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot of the entity inside its arena.
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline(always)]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl ConstraintHandle {
    #[inline(always)]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot of the constraint inside the solver.
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline(always)]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// Simple implementations for Display for user-friendliness
impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "EntityHandle<{}:{}>", self.index, self.generation)
    }
}

impl std::fmt::Display for ConstraintHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ConstraintHandle<{}:{}>", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_generation() {
        assert_eq!(EntityHandle::new(3, 1).to_string(), "EntityHandle<3:1>");
        assert_eq!(ConstraintHandle::new(0, 7).to_string(), "ConstraintHandle<0:7>");
    }

    #[test]
    fn generations_distinguish_reused_slots() {
        assert_ne!(EntityHandle::new(2, 0), EntityHandle::new(2, 1));
    }
}
