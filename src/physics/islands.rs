use crate::physics::constraints::solver_updateable::SolverUpdateable;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use std::collections::HashSet;

/// Disjoint set forest over entity slots.
#[derive(Debug, Clone)]
struct DisjointSet {
    parents: Vec<usize>,
    ranks: Vec<u8>,
}

impl DisjointSet {
    fn new(count: usize) -> Self {
        Self {
            parents: (0..count).collect(),
            ranks: vec![0; count],
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parents[index] != index {
            // Path halving.
            let grandparent = self.parents[self.parents[index]];
            self.parents[index] = grandparent;
            index = grandparent;
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        match self.ranks[root_a].cmp(&self.ranks[root_b]) {
            std::cmp::Ordering::Less => self.parents[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parents[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parents[root_b] = root_a;
                self.ranks[root_a] = self.ranks[root_a].saturating_add(1);
            }
        }
    }
}

/// A group of constraints that share no dynamic entity with any other group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Island {
    /// Every entity the island's constraints touch, dynamic or not, without duplicates.
    pub entities: Vec<EntityHandle>,
    /// Positions of the island's constraints in the sequence passed to [`Islands::build`].
    pub constraints: Vec<usize>,
}

/// Partition of constraints into independently solvable islands.
///
/// Only dynamic entities connect constraints: kinematic entities and the static world never
/// receive impulses, so two constraints leaning on the same kinematic entity can be solved apart.
#[derive(Debug, Clone, Default)]
pub struct Islands {
    islands: Vec<Island>,
}

impl Islands {
    /// Groups constraints by the dynamic entities they share. Constraints without a live dynamic
    /// entity belong to no island. Islands are ordered by their first constraint.
    pub fn build<'c>(
        entities: &Entities,
        constraints: impl IntoIterator<Item = &'c dyn SolverUpdateable>,
    ) -> Self {
        let slot_count = entities
            .iter()
            .map(|(handle, _)| handle.index() + 1)
            .max()
            .unwrap_or(0);
        let mut sets = DisjointSet::new(slot_count);
        let is_dynamic = |handle: &EntityHandle| {
            entities
                .get(*handle)
                .is_some_and(|entity| entity.is_dynamic())
        };

        let mut involved = Vec::new();
        let mut connected = Vec::new();
        for constraint in constraints {
            let mut handles = Vec::new();
            constraint.involved_entities(&mut handles);
            handles.retain(|handle| entities.contains(*handle));
            let anchor = handles.iter().find(|handle| is_dynamic(handle)).copied();
            if let Some(anchor) = anchor {
                for handle in handles.iter().filter(|handle| is_dynamic(handle)) {
                    sets.union(anchor.index(), handle.index());
                }
            }
            connected.push(anchor);
            involved.push(handles);
        }

        let mut island_of_root: Vec<Option<usize>> = vec![None; slot_count];
        let mut islands: Vec<Island> = Vec::new();
        let mut members: Vec<HashSet<EntityHandle>> = Vec::new();
        for (position, (anchor, handles)) in connected.into_iter().zip(involved).enumerate() {
            let Some(anchor) = anchor else {
                continue;
            };
            let root = sets.find(anchor.index());
            let island_index = *island_of_root[root].get_or_insert_with(|| {
                islands.push(Island::default());
                members.push(HashSet::new());
                islands.len() - 1
            });
            let island = &mut islands[island_index];
            island.constraints.push(position);
            for handle in handles {
                if members[island_index].insert(handle) {
                    island.entities.push(handle);
                }
            }
        }
        Self { islands }
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Island> {
        self.islands.iter()
    }
}

impl IntoIterator for Islands {
    type Item = Island;
    type IntoIter = std::vec::IntoIter<Island>;

    fn into_iter(self) -> Self::IntoIter {
        self.islands.into_iter()
    }
}
