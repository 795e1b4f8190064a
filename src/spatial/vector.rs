use std::ops::{Add, Div, Mul, Neg, Sub};

/// Generic 3-component vector. Used both for world/screen space (`f32`) and
/// for fixed-point splatter state (`Fixed`, see [`super::fixed`]).
#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct V3c<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> V3c<T>
where
    T: Copy,
{
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    pub fn unit(scale: T) -> Self {
        Self {
            x: scale,
            y: scale,
            z: scale,
        }
    }
}

impl<T: Add<Output = T> + Copy> Add for V3c<T> {
    type Output = V3c<T>;
    fn add(self, other: V3c<T>) -> V3c<T> {
        V3c::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<T: Sub<Output = T> + Copy> Sub for V3c<T> {
    type Output = V3c<T>;
    fn sub(self, other: V3c<T>) -> V3c<T> {
        V3c::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<T: Neg<Output = T> + Copy> Neg for V3c<T> {
    type Output = V3c<T>;
    fn neg(self) -> V3c<T> {
        V3c::new(-self.x, -self.y, -self.z)
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for V3c<T> {
    type Output = V3c<T>;
    fn mul(self, scalar: T) -> V3c<T> {
        V3c::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl<T: Div<Output = T> + Copy> Div<T> for V3c<T> {
    type Output = V3c<T>;
    fn div(self, scalar: T) -> V3c<T> {
        V3c::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl V3c<f32> {
    pub fn dot(&self, other: &V3c<f32>) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn abs(&self) -> V3c<f32> {
        V3c::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Component-wise linear interpolation, used by the cage subdivider's
    /// trilinear weights.
    pub fn lerp(&self, other: &V3c<f32>, t: f32) -> V3c<f32> {
        V3c::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl From<V3c<f32>> for V3c<f64> {
    fn from(v: V3c<f32>) -> Self {
        V3c::new(v.x as f64, v.y as f64, v.z as f64)
    }
}

/// Screen-space 2D vector: used for [`crate::cage::ProjectedVertex::projection`]
/// (the post-perspective-divide X/Y) and for the renderbuffer's aperture.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct V2 {
    pub x: f32,
    pub y: f32,
}

impl V2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

impl Add for V2 {
    type Output = V2;
    fn add(self, other: V2) -> V2 {
        V2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for V2 {
    type Output = V2;
    fn sub(self, other: V2) -> V2 {
        V2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for V2 {
    type Output = V2;
    fn mul(self, scalar: f32) -> V2 {
        V2::new(self.x * scalar, self.y * scalar)
    }
}

impl V2 {
    pub fn lerp(&self, other: &V2, t: f32) -> V2 {
        V2::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}
