use crate::error::ConfigResult;
use crate::physics::constraints::contact::contact_manifold_constraint::ContactManifoldConstraint;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::materials::MaterialManager;

/// Recycles manifolds so pairs that come and go every frame do not allocate.
#[derive(Debug, Default)]
pub struct ContactManifoldConstraintPool {
    free: Vec<Box<ContactManifoldConstraint>>,
}

impl ContactManifoldConstraintPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool holding `count` ready manifolds.
    pub fn with_capacity(count: usize) -> Self {
        Self {
            free: (0..count)
                .map(|_| Box::new(ContactManifoldConstraint::new()))
                .collect(),
        }
    }

    /// Number of manifolds waiting to be reused.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Takes a manifold from the pool, or creates one, and sets it up for the given pair.
    /// On failure the manifold stays in the pool.
    pub fn acquire(
        &mut self,
        entities: &Entities,
        materials: &MaterialManager,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
    ) -> ConfigResult<Box<ContactManifoldConstraint>> {
        let mut manifold = self
            .free
            .pop()
            .unwrap_or_else(|| Box::new(ContactManifoldConstraint::new()));
        match manifold.setup(entities, materials, entity_a, entity_b) {
            Ok(()) => Ok(manifold),
            Err(error) => {
                self.free.push(manifold);
                Err(error)
            }
        }
    }

    /// Cleans a manifold up and returns it to the pool.
    pub fn release(&mut self, mut manifold: Box<ContactManifoldConstraint>) {
        manifold.clean_up();
        self.free.push(manifold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::physics::constraints::solver_updateable::SolverUpdateable;
    use crate::physics::entity::Entity;
    use crate::utilities::math_helper::ONE;
    use crate::utilities::matrix3x3::Matrix3x3;
    use crate::utilities::vector3::Vector3;

    #[test]
    fn acquire_reuses_released_manifolds() {
        let mut entities = Entities::new();
        let body = entities.add(Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY).unwrap());
        let materials = MaterialManager::new();
        let mut pool = ContactManifoldConstraintPool::with_capacity(1);

        let manifold = pool.acquire(&entities, &materials, None, Some(body)).unwrap();
        assert!(pool.is_empty());
        assert!(manifold.is_active());
        assert_eq!(manifold.entity_b(), Some(body));

        pool.release(manifold);
        assert_eq!(pool.len(), 1);
        let again = pool.acquire(&entities, &materials, Some(body), None).unwrap();
        assert_eq!(again.entity_a(), Some(body));
        assert_eq!(again.contact_count(), 0);
    }

    #[test]
    fn failed_acquire_keeps_manifold_pooled() {
        let mut entities = Entities::new();
        let ground = entities.add(Entity::new_kinematic(Vector3::ZERO));
        let mut pool = ContactManifoldConstraintPool::new();
        assert_eq!(
            pool.acquire(&entities, &MaterialManager::new(), None, Some(ground)).unwrap_err(),
            ConfigError::NoDynamicEntity
        );
        assert_eq!(pool.len(), 1);
    }
}
