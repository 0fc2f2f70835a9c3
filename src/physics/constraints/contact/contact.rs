use crate::physics::body_properties::RigidPose;
use crate::utilities::math_helper::{Real, HALF, ZERO};
use crate::utilities::vector3::Vector3;
use std::fmt;

/// Contact reported by collision detection for one frame.
///
/// The normal points from entity A towards entity B. Positive depth means the shapes overlap;
/// negative depth is a speculative separation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactData {
    pub position: Vector3,
    pub normal: Vector3,
    pub penetration_depth: Real,
    /// Feature id used to match the contact across frames.
    pub id: u32,
}

impl ContactData {
    pub fn new(position: Vector3, normal: Vector3, penetration_depth: Real, id: u32) -> Self {
        Self {
            position,
            normal,
            penetration_depth,
            id,
        }
    }
}

/// Contact stored by a manifold.
///
/// Keeps the contact location attached to both entities so it can be refreshed from their poses
/// between collision detection passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contact {
    pub position: Vector3,
    pub normal: Vector3,
    pub penetration_depth: Real,
    pub id: u32,
    initial_depth: Real,
    local_offset_a: Vector3,
    local_offset_b: Vector3,
}

impl Contact {
    pub(crate) fn new(data: &ContactData, pose_a: &RigidPose, pose_b: &RigidPose) -> Self {
        let mut contact = Self::default();
        contact.set(data, pose_a, pose_b);
        contact
    }

    /// Overwrites the geometry with fresh collision data and re-anchors it to both entities.
    pub(crate) fn set(&mut self, data: &ContactData, pose_a: &RigidPose, pose_b: &RigidPose) {
        self.position = data.position;
        self.normal = data.normal;
        self.penetration_depth = data.penetration_depth;
        self.id = data.id;
        self.initial_depth = data.penetration_depth;
        self.local_offset_a = pose_a.transform_by_inverse(data.position);
        self.local_offset_b = pose_b.transform_by_inverse(data.position);
    }

    /// Recomputes the world position and depth from the current poses.
    ///
    /// Returns false once the anchors have drifted apart tangentially by more than the
    /// invalidation length, at which point the contact no longer describes the pair.
    pub(crate) fn refresh(
        &mut self,
        pose_a: &RigidPose,
        pose_b: &RigidPose,
        invalidation_length_squared: Real,
    ) -> bool {
        let world_a = pose_a.transform(self.local_offset_a);
        let world_b = pose_b.transform(self.local_offset_b);
        let drift = world_b - world_a;
        let normal_drift = drift.dot(self.normal);
        let tangent_drift = drift - self.normal * normal_drift;
        if tangent_drift.length_squared() > invalidation_length_squared {
            return false;
        }
        self.penetration_depth = self.initial_depth - normal_drift;
        self.position = (world_a + world_b) * HALF;
        true
    }

    #[inline(always)]
    pub fn is_penetrating(&self) -> bool {
        self.penetration_depth > ZERO
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Contact #{} at {} normal {} depth {}",
            self.id, self.position, self.normal, self.penetration_depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::math_helper::{from_int, ratio};

    #[test]
    fn refresh_tracks_separation() {
        let pose_a = RigidPose::from_position(Vector3::ZERO);
        let mut pose_b = RigidPose::from_position(Vector3::from_ints(0, 1, 0));
        let data = ContactData::new(Vector3::new(ZERO, ratio(1, 2), ZERO), Vector3::UNIT_Y, ratio(1, 10), 7);
        let mut contact = Contact::new(&data, &pose_a, &pose_b);
        assert!(contact.refresh(&pose_a, &pose_b, from_int(1)));
        assert_eq!(contact.penetration_depth, ratio(1, 10));

        pose_b.position.y += ratio(1, 4);
        assert!(contact.refresh(&pose_a, &pose_b, from_int(1)));
        assert_eq!(contact.penetration_depth, ratio(1, 10) - ratio(1, 4));
        assert!(!contact.is_penetrating());
    }

    #[test]
    fn tangential_drift_invalidates() {
        let pose_a = RigidPose::from_position(Vector3::ZERO);
        let mut pose_b = RigidPose::from_position(Vector3::from_ints(0, 1, 0));
        let data = ContactData::new(Vector3::ZERO, Vector3::UNIT_Y, ZERO, 0);
        let mut contact = Contact::new(&data, &pose_a, &pose_b);
        pose_b.position.x += ratio(1, 2);
        assert!(!contact.refresh(&pose_a, &pose_b, ratio(1, 100)));
    }
}
