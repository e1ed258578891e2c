use nalgebra::{UnitQuaternion, Vector3};

/// Position and orientation a connection views the scene from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observer {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Observer {
    pub fn new(position: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// An observer at `position` with no rotation
    pub fn at(position: Vector3<f32>) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }

    /// `axis` rotated into world space
    pub fn forward(&self, axis: &Vector3<f32>) -> Vector3<f32> {
        self.orientation * axis
    }
}
