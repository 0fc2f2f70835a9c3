//! Surface materials and how pairs of them interact.
//!
//! Every entity refers to a material registered in a [`MaterialManager`]. When two entities
//! touch, the manager produces the pair's [`InteractionProperties`], either from an explicit
//! pair override or by blending the two materials.

use crate::error::{ConfigError, ConfigResult};
use crate::utilities::math_helper::{self, Real, HALF, ZERO};
use std::collections::BTreeMap;

/// Identifier of a material registered in a [`MaterialManager`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// The material every manager starts with and every entity uses by default.
    pub const DEFAULT: Self = Self(0);
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "MaterialId<{}>", self.0)
    }
}

/// Friction and bounciness of a surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Material {
    /// Friction coefficient used while the surfaces are not sliding relative to each other.
    pub static_friction: Real,
    /// Friction coefficient used while the surfaces slide.
    pub kinetic_friction: Real,
    /// Fraction of the approach speed returned as separation speed.
    pub bounciness: Real,
}

impl Material {
    pub const DEFAULT_STATIC_FRICTION: Real = math_helper::ratio(6, 10);
    pub const DEFAULT_KINETIC_FRICTION: Real = math_helper::ratio(3, 10);
    pub const DEFAULT_BOUNCINESS: Real = ZERO;

    /// Creates a material, rejecting negative coefficients.
    pub fn new(static_friction: Real, kinetic_friction: Real, bounciness: Real) -> ConfigResult<Self> {
        let material = Self {
            static_friction,
            kinetic_friction,
            bounciness,
        };
        material.validate()?;
        Ok(material)
    }

    pub fn validate(&self) -> ConfigResult {
        for (property, value) in [
            ("static_friction", self.static_friction),
            ("kinetic_friction", self.kinetic_friction),
            ("bounciness", self.bounciness),
        ] {
            if value < ZERO {
                return Err(ConfigError::Negative {
                    type_name: "Material",
                    property,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            static_friction: Self::DEFAULT_STATIC_FRICTION,
            kinetic_friction: Self::DEFAULT_KINETIC_FRICTION,
            bounciness: Self::DEFAULT_BOUNCINESS,
        }
    }
}

/// Coefficients governing the interaction between two particular surfaces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct InteractionProperties {
    pub static_friction: Real,
    pub kinetic_friction: Real,
    pub bounciness: Real,
}

impl InteractionProperties {
    pub fn new(static_friction: Real, kinetic_friction: Real, bounciness: Real) -> Self {
        Self {
            static_friction,
            kinetic_friction,
            bounciness,
        }
    }
}

/// Rule combining two materials' coefficients into interaction properties.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MaterialBlender {
    /// Product of the coefficients.
    #[default]
    Multiply,
    /// Arithmetic mean of the coefficients.
    Average,
    /// Smaller of the coefficients.
    Min,
    /// Larger of the coefficients.
    Max,
}

impl MaterialBlender {
    #[inline(always)]
    fn combine(self, a: Real, b: Real) -> Real {
        match self {
            MaterialBlender::Multiply => math_helper::safe_mul(a, b),
            MaterialBlender::Average => (a + b) * HALF,
            MaterialBlender::Min => math_helper::min(a, b),
            MaterialBlender::Max => math_helper::max(a, b),
        }
    }

    /// Blends two materials into interaction properties.
    pub fn blend(self, a: &Material, b: &Material) -> InteractionProperties {
        InteractionProperties {
            static_friction: self.combine(a.static_friction, b.static_friction),
            kinetic_friction: self.combine(a.kinetic_friction, b.kinetic_friction),
            bounciness: self.combine(a.bounciness, b.bounciness),
        }
    }
}

/// Registry of materials and per-pair overrides.
#[derive(Debug, Clone)]
pub struct MaterialManager {
    materials: Vec<Material>,
    overrides: BTreeMap<(MaterialId, MaterialId), InteractionProperties>,
    /// Rule used for pairs without an override.
    pub blender: MaterialBlender,
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialManager {
    /// Creates a manager holding only the default material.
    pub fn new() -> Self {
        Self {
            materials: vec![Material::default()],
            overrides: BTreeMap::new(),
            blender: MaterialBlender::default(),
        }
    }

    #[inline(always)]
    fn key(a: MaterialId, b: MaterialId) -> (MaterialId, MaterialId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Registers a material and returns its identifier.
    pub fn add(&mut self, material: Material) -> ConfigResult<MaterialId> {
        material.validate()?;
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        Ok(id)
    }

    /// Gets a material. Unknown identifiers resolve to `None`.
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    /// Replaces a registered material. Manifolds touching it pick up the change on their next
    /// material refresh.
    pub fn set(&mut self, id: MaterialId, material: Material) -> ConfigResult {
        material.validate()?;
        match self.materials.get_mut(id.0 as usize) {
            Some(slot) => {
                *slot = material;
                Ok(())
            }
            None => Err(ConfigError::UnknownMaterial(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Forces the interaction between two materials, regardless of order.
    pub fn set_override(
        &mut self,
        a: MaterialId,
        b: MaterialId,
        properties: InteractionProperties,
    ) -> ConfigResult {
        Material {
            static_friction: properties.static_friction,
            kinetic_friction: properties.kinetic_friction,
            bounciness: properties.bounciness,
        }
        .validate()?;
        self.overrides.insert(Self::key(a, b), properties);
        Ok(())
    }

    pub fn remove_override(&mut self, a: MaterialId, b: MaterialId) -> Option<InteractionProperties> {
        self.overrides.remove(&Self::key(a, b))
    }

    /// Computes the interaction properties for a pair of materials.
    /// Unknown identifiers fall back to the default material.
    pub fn interaction_properties(&self, a: MaterialId, b: MaterialId) -> InteractionProperties {
        if let Some(properties) = self.overrides.get(&Self::key(a, b)) {
            return *properties;
        }
        let fallback = Material::default();
        let material_a = self.get(a).copied().unwrap_or(fallback);
        let material_b = self.get(b).copied().unwrap_or(fallback);
        self.blender.blend(&material_a, &material_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::math_helper::ratio;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_blend_multiplies() {
        let manager = MaterialManager::new();
        let properties = manager.interaction_properties(MaterialId::DEFAULT, MaterialId::DEFAULT);
        assert_abs_diff_eq!(properties.static_friction.to_num::<f64>(), 0.36, epsilon = 1e-6);
        assert_abs_diff_eq!(properties.kinetic_friction.to_num::<f64>(), 0.09, epsilon = 1e-6);
        assert_eq!(properties.bounciness, ZERO);
    }

    #[test]
    fn alternative_blenders() {
        let a = Material::new(ratio(2, 10), ratio(1, 10), ZERO).unwrap();
        let b = Material::new(ratio(8, 10), ratio(3, 10), HALF).unwrap();
        assert_eq!(MaterialBlender::Min.blend(&a, &b).static_friction, ratio(2, 10));
        assert_eq!(MaterialBlender::Max.blend(&a, &b).bounciness, HALF);
        assert_abs_diff_eq!(
            MaterialBlender::Average.blend(&a, &b).static_friction.to_num::<f64>(),
            0.5,
            epsilon = 1e-6
        );
    }

    #[test]
    fn override_is_order_independent() {
        let mut manager = MaterialManager::new();
        let ice = manager.add(Material::new(ratio(1, 20), ratio(1, 50), ZERO).unwrap()).unwrap();
        let forced = InteractionProperties::new(ZERO, ZERO, HALF);
        manager.set_override(MaterialId::DEFAULT, ice, forced).unwrap();
        assert_eq!(manager.interaction_properties(ice, MaterialId::DEFAULT), forced);
        assert_eq!(manager.remove_override(ice, MaterialId::DEFAULT), Some(forced));
        assert_ne!(manager.interaction_properties(ice, MaterialId::DEFAULT), forced);
    }

    #[test]
    fn negative_coefficients_rejected() {
        assert!(matches!(
            Material::new(-HALF, ZERO, ZERO),
            Err(ConfigError::Negative { property: "static_friction", .. })
        ));
    }
}
