//! [`Object3D`]: the model's TRS transform plus its (possibly deformed)
//! 8-corner cage, and the projected cage produced each frame.

use crate::cage::ProjectedVertex;
use crate::spatial::V3c;

/// Canonical corner order: octant index, bit0=X, bit1=Y, bit2=Z.
pub const UNIT_CAGE: [V3c<f32>; 8] = [
    V3c { x: -1.0, y: -1.0, z: -1.0 }, // 0b000
    V3c { x: 1.0, y: -1.0, z: -1.0 },  // 0b001 (+X)
    V3c { x: -1.0, y: 1.0, z: -1.0 },  // 0b010 (+Y)
    V3c { x: 1.0, y: 1.0, z: -1.0 },   // 0b011 (+X+Y)
    V3c { x: -1.0, y: -1.0, z: 1.0 },  // 0b100 (+Z)
    V3c { x: 1.0, y: -1.0, z: 1.0 },   // 0b101 (+X+Z)
    V3c { x: -1.0, y: 1.0, z: 1.0 },   // 0b110 (+Y+Z)
    V3c { x: 1.0, y: 1.0, z: 1.0 },    // 0b111
];

/// Mutable-by-property object graph: any TRS setter flips `matrix_dirty`;
/// [`Object3D::matrix`] recomputes lazily on next read. No inheritance, no
/// observer pattern -- a plain record with an invalidation flag.
#[derive(Debug, Clone)]
pub struct Object3D {
    pub cage: [V3c<f32>; 8],
    pub projected_cage: [ProjectedVertex; 8],
    pub projected_min: V3c<f32>,
    pub projected_max: V3c<f32>,

    position: V3c<f32>,
    rotation: V3c<f32>,
    scale: V3c<f32>,
    matrix: [[f32; 4]; 4],
    inverse: [[f32; 4]; 4],
    matrix_dirty: bool,
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            cage: UNIT_CAGE,
            projected_cage: [ProjectedVertex::default(); 8],
            projected_min: V3c::unit(0.0),
            projected_max: V3c::unit(0.0),
            position: V3c::unit(0.0),
            rotation: V3c::unit(0.0),
            scale: V3c::unit(1.0),
            matrix: identity4(),
            inverse: identity4(),
            matrix_dirty: true,
        }
    }
}

fn identity4() -> [[f32; 4]; 4] {
    let mut m = [[0.0f32; 4]; 4];
    for i in 0..4 {
        m[i][i] = 1.0;
    }
    m
}

fn mul4(a: &[[f32; 4]; 4], b: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0f32; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            out[i][j] = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn translation4(t: V3c<f32>) -> [[f32; 4]; 4] {
    let mut m = identity4();
    m[0][3] = t.x;
    m[1][3] = t.y;
    m[2][3] = t.z;
    m
}

fn scale4(s: V3c<f32>) -> [[f32; 4]; 4] {
    let mut m = identity4();
    m[0][0] = s.x;
    m[1][1] = s.y;
    m[2][2] = s.z;
    m
}

/// Euler rotation, yaw (Y) then pitch (X) then roll (Z), applied in that
/// order -- matches the camera's `T(pos)*R(yaw)*R(pitch)` composition order
/// in spec §4.5 step 1.
fn rotation4(r: V3c<f32>) -> [[f32; 4]; 4] {
    let (sy, cy) = r.y.sin_cos();
    let (sx, cx) = r.x.sin_cos();
    let (sz, cz) = r.z.sin_cos();
    let yaw = [
        [cy, 0.0, sy, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [-sy, 0.0, cy, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let pitch = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, cx, -sx, 0.0],
        [0.0, sx, cx, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let roll = [
        [cz, -sz, 0.0, 0.0],
        [sz, cz, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    mul4(&mul4(&yaw, &pitch), &roll)
}

fn invert_affine(m: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    // Affine inverse for a T*R*S composition: invert the 3x3 linear part
    // and negate+reapply the translation. Falls back to identity if the
    // linear part is singular (NaN-poisoned scale), per the NaN guard idiom
    // -- callers compare `!(x < bound)` downstream so a poisoned inverse
    // never panics, it just never culls correctly, which is acceptable
    // since a singular TRS is already a usage error.
    let a = [
        [m[0][0], m[0][1], m[0][2]],
        [m[1][0], m[1][1], m[1][2]],
        [m[2][0], m[2][1], m[2][2]],
    ];
    let det = a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0]);
    if !(det.abs() > 1e-12) {
        return identity4();
    }
    let inv_det = 1.0 / det;
    let mut inv = identity4();
    inv[0][0] = (a[1][1] * a[2][2] - a[1][2] * a[2][1]) * inv_det;
    inv[0][1] = (a[0][2] * a[2][1] - a[0][1] * a[2][2]) * inv_det;
    inv[0][2] = (a[0][1] * a[1][2] - a[0][2] * a[1][1]) * inv_det;
    inv[1][0] = (a[1][2] * a[2][0] - a[1][0] * a[2][2]) * inv_det;
    inv[1][1] = (a[0][0] * a[2][2] - a[0][2] * a[2][0]) * inv_det;
    inv[1][2] = (a[0][2] * a[1][0] - a[0][0] * a[1][2]) * inv_det;
    inv[2][0] = (a[1][0] * a[2][1] - a[1][1] * a[2][0]) * inv_det;
    inv[2][1] = (a[0][1] * a[2][0] - a[0][0] * a[2][1]) * inv_det;
    inv[2][2] = (a[0][0] * a[1][1] - a[0][1] * a[1][0]) * inv_det;
    let t = V3c::new(m[0][3], m[1][3], m[2][3]);
    inv[0][3] = -(inv[0][0] * t.x + inv[0][1] * t.y + inv[0][2] * t.z);
    inv[1][3] = -(inv[1][0] * t.x + inv[1][1] * t.y + inv[1][2] * t.z);
    inv[2][3] = -(inv[2][0] * t.x + inv[2][1] * t.y + inv[2][2] * t.z);
    inv
}

/// Applies a 4x4 affine matrix (bottom row implicitly `0,0,0,1`) to a point.
/// Shared by [`Object3D::transform_point`] and the per-frame pipeline, which
/// needs to apply a model matrix and a camera's inverse (view) matrix as two
/// separate steps rather than through an `Object3D` instance.
pub(crate) fn apply4(m: &[[f32; 4]; 4], p: V3c<f32>) -> V3c<f32> {
    V3c::new(
        m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
        m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
        m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
    )
}

/// Applies only the linear (rotation) part of the yaw/pitch/roll Euler
/// rotation to a vector, dropping translation -- used by `move_camera`'s
/// "in player-local frame" contract (spec §6).
pub(crate) fn rotate_vector(rotation: V3c<f32>, v: V3c<f32>) -> V3c<f32> {
    let r = rotation4(rotation);
    V3c::new(
        r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
        r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
        r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
    )
}

impl Object3D {
    pub fn position(&self) -> V3c<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: V3c<f32>) {
        self.position = position;
        self.matrix_dirty = true;
    }

    pub fn rotation(&self) -> V3c<f32> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: V3c<f32>) {
        self.rotation = rotation;
        self.matrix_dirty = true;
    }

    pub fn set_scale(&mut self, scale: V3c<f32>) {
        self.scale = scale;
        self.matrix_dirty = true;
    }

    fn recompute_if_dirty(&mut self) {
        if !self.matrix_dirty {
            return;
        }
        let t = translation4(self.position);
        let r = rotation4(self.rotation);
        let s = scale4(self.scale);
        self.matrix = mul4(&t, &mul4(&r, &s));
        self.inverse = invert_affine(&self.matrix);
        self.matrix_dirty = false;
    }

    pub fn matrix(&mut self) -> [[f32; 4]; 4] {
        self.recompute_if_dirty();
        self.matrix
    }

    pub fn inverse(&mut self) -> [[f32; 4]; 4] {
        self.recompute_if_dirty();
        self.inverse
    }

    pub fn transform_point(&mut self, p: V3c<f32>) -> V3c<f32> {
        apply4(&self.matrix(), p)
    }

    /// Cage is affine iff it's still the unit cube within tolerance --
    /// the gate for stencil reuse (spec §4.5).
    pub fn is_affine(&self) -> bool {
        const EPS: f32 = 1e-8;
        self.cage
            .iter()
            .zip(UNIT_CAGE.iter())
            .all(|(c, u)| (c.x - u.x).abs() < EPS && (c.y - u.y).abs() < EPS && (c.z - u.z).abs() < EPS)
    }

    pub fn recompute_projected_bounds(&mut self) {
        let mut min = V3c::unit(f32::INFINITY);
        let mut max = V3c::unit(f32::NEG_INFINITY);
        for v in &self.projected_cage {
            let p = v.projection;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(v.position.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(v.position.z);
        }
        self.projected_min = min;
        self.projected_max = max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cage_is_affine() {
        assert!(Object3D::default().is_affine());
    }

    #[test]
    fn test_deformed_cage_is_not_affine() {
        let mut obj = Object3D::default();
        obj.cage[7].x += 0.5;
        assert!(!obj.is_affine());
    }

    #[test]
    fn test_matrix_lazily_recomputed() {
        let mut obj = Object3D::default();
        let id = obj.matrix();
        assert_eq!(id, identity4());
        obj.set_position(V3c::new(1.0, 2.0, 3.0));
        let m = obj.matrix();
        assert_eq!(m[0][3], 1.0);
        assert_eq!(m[1][3], 2.0);
        assert_eq!(m[2][3], 3.0);
    }

    #[test]
    fn test_transform_point_with_translation() {
        let mut obj = Object3D::default();
        obj.set_position(V3c::new(1.0, 0.0, 0.0));
        let p = obj.transform_point(V3c::new(0.0, 0.0, 0.0));
        assert_eq!(p, V3c::new(1.0, 0.0, 0.0));
    }
}
