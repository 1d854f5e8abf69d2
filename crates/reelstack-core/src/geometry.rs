//! 2D geometry for orientation normalization.
//!
//! Every clip is rendered through an affine transform that forces the
//! portrait target geometry, regardless of how the segment was captured.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

/// 2D point/vector type used throughout.
pub type Vec2 = DVec2;

/// Pixel dimensions of a video stream or render canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Degenerate size that cannot be transformed.
    #[inline]
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width and height swapped, as after a quarter-turn rotation.
    #[inline]
    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    #[inline]
    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }
}

/// A 2D affine transform.
///
/// Serialized as the six matrix coefficients `[a, b, c, d, tx, ty]` where a
/// point maps as `(a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct Transform2D {
    inner: DAffine2,
}

impl Transform2D {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        inner: DAffine2::IDENTITY,
    };

    /// Counter-clockwise rotation by `angle` radians about the origin.
    #[inline]
    pub fn rotate(angle: f64) -> Self {
        Self {
            inner: DAffine2::from_angle(angle),
        }
    }

    /// Translation by `(x, y)`.
    #[inline]
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            inner: DAffine2::from_translation(DVec2::new(x, y)),
        }
    }

    /// Non-uniform scale about the origin.
    #[inline]
    pub fn scale(x: f64, y: f64) -> Self {
        Self {
            inner: DAffine2::from_scale(DVec2::new(x, y)),
        }
    }

    /// Sequence this transform with `next`: the result applies `self`
    /// first, then `next`.
    #[inline]
    pub fn then(self, next: Self) -> Self {
        Self {
            inner: next.inner * self.inner,
        }
    }

    /// Map a point through the transform.
    #[inline]
    pub fn transform_point(self, point: Vec2) -> Vec2 {
        self.inner.transform_point2(point)
    }

    /// Matrix coefficients `[a, b, c, d, tx, ty]`.
    pub fn coefficients(self) -> [f64; 6] {
        let m = self.inner;
        [
            m.matrix2.x_axis.x,
            m.matrix2.x_axis.y,
            m.matrix2.y_axis.x,
            m.matrix2.y_axis.y,
            m.translation.x,
            m.translation.y,
        ]
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 6]> for Transform2D {
    fn from(c: [f64; 6]) -> Self {
        Self {
            inner: DAffine2::from_cols_array(&c),
        }
    }
}

impl From<Transform2D> for [f64; 6] {
    fn from(t: Transform2D) -> Self {
        t.coefficients()
    }
}

/// Compute the transform that forces a source stream into the portrait
/// target canvas.
///
/// Three steps, applied to source points in order:
///  1. rotate a quarter turn so landscape capture reads as portrait,
///  2. translate by the source height so the rotated content sits back in
///     the positive quadrant,
///  3. scale non-uniformly so the rotated bounding box exactly fills the
///     target canvas (scale-to-fill, no letterboxing).
///
/// Pure and deterministic. Degenerate source or target dimensions are an
/// input error and are never computed.
pub fn portrait_transform(natural: Dimensions, target: Dimensions) -> Result<Transform2D> {
    if natural.is_degenerate() {
        return Err(ReelError::InvalidDimensions {
            width: natural.width,
            height: natural.height,
        });
    }
    if target.is_degenerate() {
        return Err(ReelError::InvalidDimensions {
            width: target.width,
            height: target.height,
        });
    }

    let rotate = Transform2D::rotate(std::f64::consts::FRAC_PI_2);
    let translate = Transform2D::translate(natural.height as f64, 0.0);
    let scale = Transform2D::scale(
        target.width as f64 / natural.height as f64,
        target.height as f64 / natural.width as f64,
    );

    Ok(rotate.then(translate).then(scale))
}
