//! 3D transformation utilities

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An affine 3D transformation applied to mesh vertices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a uniform scaling transformation about the origin
    pub fn uniform_scaling(scale: f32) -> Self {
        Self {
            matrix: Matrix4::new_scaling(scale),
        }
    }

    /// Build a transform from the 12-value row-vector layout used by 3MF:
    /// `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32`, where the last
    /// row holds the translation.
    pub fn from_row_major_affine(values: &[f32]) -> Result<Self> {
        if values.len() != 12 {
            return Err(Error::InvalidData(format!(
                "affine transform needs 12 values, got {}",
                values.len()
            )));
        }
        let m = |r: usize, c: usize| values[r * 3 + c];
        // 3MF multiplies row vectors on the left, so the stored matrix is transposed.
        let matrix = Matrix4::new(
            m(0, 0), m(1, 0), m(2, 0), m(3, 0),
            m(0, 1), m(1, 1), m(2, 1), m(3, 1),
            m(0, 2), m(1, 2), m(2, 2), m(3, 2),
            0.0, 0.0, 0.0, 1.0,
        );
        Ok(Self { matrix })
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Compose this transformation with another
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        let identity = Matrix4::identity();
        (self.matrix - identity).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}
