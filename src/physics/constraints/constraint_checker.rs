use crate::error::{ConfigError, ConfigResult};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::utilities::math_helper::{Real, ZERO};
use crate::utilities::vector3::Vector3;

/// Provides helper functions for validating constraint parameter values.
pub struct ConstraintChecker;

impl ConstraintChecker {
    /// Checks if a value is greater than zero.
    #[inline(always)]
    pub fn is_positive_number(value: Real) -> bool {
        value > ZERO
    }

    /// Checks if a value is greater than or equal to zero.
    #[inline(always)]
    pub fn is_nonnegative_number(value: Real) -> bool {
        value >= ZERO
    }

    pub fn require_positive(type_name: &'static str, property: &'static str, value: Real) -> ConfigResult {
        if !Self::is_positive_number(value) {
            return Err(ConfigError::NonPositive {
                type_name,
                property,
                value,
            });
        }
        Ok(())
    }

    pub fn require_nonnegative(
        type_name: &'static str,
        property: &'static str,
        value: Real,
    ) -> ConfigResult {
        if !Self::is_nonnegative_number(value) {
            return Err(ConfigError::Negative {
                type_name,
                property,
                value,
            });
        }
        Ok(())
    }

    /// Normalizes a direction, rejecting vectors too short to define one.
    pub fn require_direction(
        type_name: &'static str,
        property: &'static str,
        value: Vector3,
    ) -> ConfigResult<Vector3> {
        value
            .try_normalize()
            .ok_or(ConfigError::ZeroLength { type_name, property })
    }

    /// Validates the entities connected by a constraint. `None` is the static world.
    /// Every given handle must be live, the two ends must differ and at least one end must be
    /// dynamic.
    pub fn check_connection(
        entities: &Entities,
        a: Option<EntityHandle>,
        b: Option<EntityHandle>,
    ) -> ConfigResult {
        let mut any_dynamic = false;
        for handle in [a, b].into_iter().flatten() {
            let entity = entities.get(handle).ok_or(ConfigError::InvalidEntity(handle))?;
            any_dynamic |= entity.is_dynamic();
        }
        if let (Some(a), Some(b)) = (a, b) {
            if a == b {
                return Err(ConfigError::SameEntity(a));
            }
        }
        if !any_dynamic {
            return Err(ConfigError::NoDynamicEntity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::entity::Entity;
    use crate::utilities::math_helper::ONE;
    use crate::utilities::matrix3x3::Matrix3x3;

    #[test]
    fn connection_checks() {
        let mut entities = Entities::new();
        let dynamic = entities.add(Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY).unwrap());
        let kinematic = entities.add(Entity::new_kinematic(Vector3::UNIT_X));
        assert!(ConstraintChecker::check_connection(&entities, Some(dynamic), None).is_ok());
        assert!(ConstraintChecker::check_connection(&entities, Some(kinematic), Some(dynamic)).is_ok());
        assert_eq!(
            ConstraintChecker::check_connection(&entities, Some(dynamic), Some(dynamic)),
            Err(ConfigError::SameEntity(dynamic))
        );
        assert_eq!(
            ConstraintChecker::check_connection(&entities, Some(kinematic), None),
            Err(ConfigError::NoDynamicEntity)
        );
        entities.remove(dynamic);
        assert_eq!(
            ConstraintChecker::check_connection(&entities, Some(dynamic), None),
            Err(ConfigError::InvalidEntity(dynamic))
        );
    }

    #[test]
    fn direction_must_have_length() {
        assert!(ConstraintChecker::require_direction("T", "axis", Vector3::ZERO).is_err());
        assert_eq!(
            ConstraintChecker::require_direction("T", "axis", Vector3::from_ints(0, 2, 0)),
            Ok(Vector3::UNIT_Y)
        );
    }
}
