use super::ProjectedVertex;
use crate::spatial::V3c;

/// The 3x4 affine matrix mapping the unit cube `[-1,1]^3` to a projected
/// hexahedron: `M(p) = col_x*p.x + col_y*p.y + col_z*p.z + translation`.
/// Output components are `(screen_x, screen_y, depth_in_renderbuffer_z_units)`.
/// This is the matrix [`crate::splat::OctreeRenderer`] consumes; keeping the
/// inner loop fed with one affine matrix per call is what lets it stay
/// fixed-point (spec §4.2 design rationale).
#[derive(Debug, Clone, Copy, Default)]
pub struct AffineMatrix {
    pub col_x: V3c<f32>,
    pub col_y: V3c<f32>,
    pub col_z: V3c<f32>,
    pub translation: V3c<f32>,
}

impl AffineMatrix {
    pub fn apply(&self, p: V3c<f32>) -> V3c<f32> {
        self.col_x * p.x + self.col_y * p.y + self.col_z * p.z + self.translation
    }
}

/// Combines a corner's post-divide screen position and its renderbuffer-Z
/// depth into the single 3D "output" vector affine extraction operates on.
fn out(v: &ProjectedVertex) -> V3c<f32> {
    V3c::new(v.projection.x, v.projection.y, v.position.z)
}

pub struct CageToMatrix;

impl CageToMatrix {
    /// Extracts the affine matrix assuming the hexahedron described by the 8
    /// projected corners (canonical octant order) is an affine image of the
    /// unit cube, plus a distortion metric quantifying how false that
    /// assumption is (0 for a perfectly affine cell).
    pub fn extract(corners: &[ProjectedVertex; 8]) -> (AffineMatrix, f32) {
        let t_min = out(&corners[0]);
        let t_max = out(&corners[7]);

        let x_min = out(&corners[1]) - t_min;
        let x_max = out(&corners[6]) - t_max;
        let y_min = out(&corners[2]) - t_min;
        let y_max = out(&corners[5]) - t_max;
        let z_min = out(&corners[4]) - t_min;
        let z_max = out(&corners[3]) - t_max;

        let matrix = AffineMatrix {
            col_x: (x_min - x_max) * 0.25,
            col_y: (y_min - y_max) * 0.25,
            col_z: (z_min - z_max) * 0.25,
            translation: (t_min + t_max) * 0.5,
        };

        // Distortion: the largest antisymmetric residual of the hexahedron.
        // A perfectly affine cell has A_min == -A_max on every axis, so
        // A_min + A_max == 0; any nonzero residual is how far the cell
        // deviates from that assumption. Required terms per spec §4.3 are
        // {XX,XY,YX,YY,ZX,ZY} (axis x output component); the Z output
        // component (depth) is included too since it's cheap and the spec
        // only specifies a lower bound on which terms must be checked.
        let residual_x = x_min + x_max;
        let residual_y = y_min + y_max;
        let residual_z = z_min + z_max;
        let distortion = [
            residual_x.x, residual_x.y, residual_x.z,
            residual_y.x, residual_y.y, residual_y.z,
            residual_z.x, residual_z.y, residual_z.z,
        ]
        .into_iter()
        .fold(0.0f32, |acc, term| acc.max(term.abs()));

        (matrix, distortion)
    }
}
