// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera and cut-plane state shared between the codec, the session and the
//! engine adapter.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Normals shorter than this cannot define a plane.
const MIN_NORMAL_LENGTH: f64 = 1e-12;

/// Orbit camera: eye position, look-at target, and whether the engine should
/// animate the transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub animate: bool,
}

impl CameraState {
    pub fn new(position: [f64; 3], target: [f64; 3], animate: bool) -> Self {
        Self {
            position: Point3::from(position),
            target: Point3::from(target),
            animate,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite()) && self.target.iter().all(|c| c.is_finite())
    }

    /// Unit view direction, `None` when position and target coincide.
    pub fn direction(&self) -> Option<Vector3<f64>> {
        (self.target - self.position).try_normalize(MIN_NORMAL_LENGTH)
    }

    pub fn distance(&self) -> f64 {
        nalgebra::distance(&self.position, &self.target)
    }

    /// Component-wise comparison within `epsilon`; `animate` must match.
    pub fn approx_eq(&self, other: &CameraState, epsilon: f64) -> bool {
        self.animate == other.animate
            && (self.position - other.position).amax() <= epsilon
            && (self.target - other.target).amax() <= epsilon
    }
}

/// Principal axis for axis-aligned sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" | "X" => Some(Axis::X),
            "y" | "Y" => Some(Axis::Y),
            "z" | "Z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn unit(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

/// Clipping plane given by a normal and a point on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutPlane {
    pub normal: Vector3<f64>,
    pub point: Point3<f64>,
}

impl CutPlane {
    pub fn new(normal: [f64; 3], point: [f64; 3]) -> Self {
        Self {
            normal: Vector3::from(normal),
            point: Point3::from(point),
        }
    }

    /// Plane perpendicular to `axis` through the point `offset` along it.
    pub fn from_axis(axis: Axis, offset: f64) -> Self {
        let normal = axis.unit();
        Self {
            normal,
            point: Point3::from(normal * offset),
        }
    }

    /// Finite components and a usable (non-zero) normal.
    pub fn is_valid(&self) -> bool {
        self.normal.iter().all(|c| c.is_finite())
            && self.point.iter().all(|c| c.is_finite())
            && self.normal.norm() > MIN_NORMAL_LENGTH
    }

    /// Signed distance of `p` from the plane, positive on the normal's side.
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        match self.normal.try_normalize(MIN_NORMAL_LENGTH) {
            Some(n) => n.dot(&(p - self.point)),
            None => 0.0,
        }
    }

    pub fn approx_eq(&self, other: &CutPlane, epsilon: f64) -> bool {
        (self.normal - other.normal).amax() <= epsilon && (self.point - other.point).amax() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn camera_direction_and_distance() {
        let cam = CameraState::new([0.0, 0.0, 10.0], [0.0, 0.0, 0.0], true);
        let dir = cam.direction().unwrap();
        assert_relative_eq!(dir.z, -1.0);
        assert_relative_eq!(cam.distance(), 10.0);

        let degenerate = CameraState::new([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], false);
        assert!(degenerate.direction().is_none());
    }

    #[test]
    fn camera_finiteness() {
        assert!(CameraState::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], false).is_finite());
        assert!(!CameraState::new([f64::NAN, 2.0, 3.0], [4.0, 5.0, 6.0], false).is_finite());
        assert!(!CameraState::new([1.0, 2.0, 3.0], [4.0, f64::INFINITY, 6.0], false).is_finite());
    }

    #[test]
    fn axis_plane_passes_through_offset() {
        let plane = CutPlane::from_axis(Axis::Y, 2.5);
        assert_eq!(plane.normal, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(plane.point, Point3::new(0.0, 2.5, 0.0));
        assert_relative_eq!(plane.signed_distance(&Point3::new(7.0, 3.5, -2.0)), 1.0);
    }

    #[test]
    fn zero_normal_is_invalid() {
        assert!(!CutPlane::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).is_valid());
        assert!(CutPlane::new([0.0, 0.0, 2.0], [1.0, 1.0, 1.0]).is_valid());
        assert!(!CutPlane::new([0.0, 0.0, 1.0], [f64::NAN, 1.0, 1.0]).is_valid());
    }

    #[test]
    fn approx_equality() {
        let a = CutPlane::new([1.0, 0.0, 0.0], [0.1, 0.2, 0.3]);
        let b = CutPlane::new([1.0, 0.0, 0.0], [0.1 + 1e-12, 0.2, 0.3]);
        assert!(a.approx_eq(&b, 1e-9));
        assert!(!a.approx_eq(&CutPlane::from_axis(Axis::Z, 0.0), 1e-9));
    }
}
