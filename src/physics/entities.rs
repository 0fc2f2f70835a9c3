use crate::physics::entity::Entity;
use crate::physics::handles::EntityHandle;

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Arena owning every entity. Handles stay stable while their entity lives; once an entity is
/// removed its handle resolves to `None` even after the slot is reused.
#[derive(Debug, Clone, Default)]
pub struct Entities {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    count: usize,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            count: 0,
        }
    }

    /// Adds an entity, returning its handle.
    pub fn add(&mut self, mut entity: Entity) -> EntityHandle {
        entity.update_inertia_tensor();
        self.count += 1;
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            return EntityHandle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entity: Some(entity),
        });
        EntityHandle::new(index, 0)
    }

    /// Removes an entity. Constraints referencing it are deactivated by the solver on its next
    /// update, or immediately through `Solver::remove_constraints_of`.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<Entity> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index);
        self.count -= 1;
        Some(entity)
    }

    #[inline(always)]
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    #[inline(always)]
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    #[inline(always)]
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live entities.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterates over live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity
                .as_ref()
                .map(|entity| (EntityHandle::new(index as u32, slot.generation), entity))
        })
    }

    /// Iterates mutably over live entities in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut Entity)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.entity
                .as_mut()
                .map(|entity| (EntityHandle::new(index as u32, generation), entity))
        })
    }

    /// Copies the given entities into a new arena sharing this arena's handle space.
    /// Handles outside `handles` resolve to `None` in the copy, which only spans slots up to the
    /// highest gathered index.
    pub fn gather(&self, handles: &[EntityHandle]) -> Entities {
        let slot_count = handles
            .iter()
            .filter(|&&handle| self.contains(handle))
            .map(|handle| handle.index() + 1)
            .max()
            .unwrap_or(0);
        let mut island = Entities {
            slots: vec![
                Slot {
                    generation: 0,
                    entity: None,
                };
                slot_count
            ],
            free_slots: Vec::new(),
            count: 0,
        };
        for &handle in handles {
            let Some(entity) = self.get(handle) else {
                continue;
            };
            let slot = &mut island.slots[handle.index()];
            if slot.entity.is_none() {
                slot.generation = handle.generation;
                slot.entity = Some(entity.clone());
                island.count += 1;
            }
        }
        island
    }

    /// Copies the velocities of the given dynamic entities back from a gathered arena.
    pub fn scatter_velocities(&mut self, island: &Entities, handles: &[EntityHandle]) {
        for &handle in handles {
            let Some(source) = island.get(handle) else {
                continue;
            };
            if let Some(target) = self.get_mut(handle) {
                if target.is_dynamic() {
                    target.velocity = source.velocity;
                }
            }
        }
    }
}
