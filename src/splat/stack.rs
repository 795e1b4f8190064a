use crate::cage::AffineMatrix;
use crate::spatial::fixed::to_fixed;
use crate::spatial::Fixed;

/// One node awaiting a visit, with its projected pixel center in fixed-point
/// and its pixel half-extent (spec §4.2's stack entry).
#[derive(Debug, Clone, Copy)]
pub struct StackEntry {
    pub address: u32,
    pub level: i32,
    pub px: Fixed,
    pub py: Fixed,
    pub pz: i32,
    pub extent_x: Fixed,
    pub extent_y: Fixed,
    pub extent_z: i32,
    /// Halves every push; scales the per-axis column deltas used to derive
    /// a child's center from its parent's.
    pub col_scale: f32,
}

impl StackEntry {
    pub fn root(matrix: &AffineMatrix, root_address: u32) -> Self {
        let extent_x = matrix.col_x.x.abs() + matrix.col_y.x.abs() + matrix.col_z.x.abs();
        let extent_y = matrix.col_x.y.abs() + matrix.col_y.y.abs() + matrix.col_z.y.abs();
        let extent_z = matrix.col_x.z.abs() + matrix.col_y.z.abs() + matrix.col_z.z.abs();
        Self {
            address: root_address,
            level: 0,
            px: to_fixed(matrix.translation.x),
            py: to_fixed(matrix.translation.y),
            pz: matrix.translation.z.round() as i32,
            extent_x: to_fixed(extent_x),
            extent_y: to_fixed(extent_y),
            extent_z: extent_z.round() as i32,
            col_scale: 1.0,
        }
    }

    /// Derives child octant `o`'s entry. `o`'s sign per axis follows the
    /// canonical octant bits (bit0=+X, bit1=+Y, bit2=+Z): `+` halves
    /// `col_scale` toward that axis's column, `-` away from it.
    pub fn child(&self, octant: u8, address: u32, matrix: &AffineMatrix) -> Self {
        let sx = if octant & 0b001 != 0 { 1.0 } else { -1.0 };
        let sy = if octant & 0b010 != 0 { 1.0 } else { -1.0 };
        let sz = if octant & 0b100 != 0 { 1.0 } else { -1.0 };
        let child_scale = self.col_scale * 0.5;
        let delta = (matrix.col_x * sx + matrix.col_y * sy + matrix.col_z * sz) * child_scale;

        Self {
            address,
            level: self.level + 1,
            px: self.px + to_fixed(delta.x),
            py: self.py + to_fixed(delta.y),
            pz: self.pz + delta.z.round() as i32,
            extent_x: self.extent_x / 2,
            extent_y: self.extent_y / 2,
            extent_z: self.extent_z / 2,
            col_scale: child_scale,
        }
    }
}

/// The far-corner bitmask from spec §4.2: bit `a` set iff moving in the `+a`
/// cage direction increases screen-space depth (makes that half farther).
/// Computed once per render call from `M`'s Z column.
pub fn forward_octant(matrix: &AffineMatrix) -> u8 {
    ((matrix.col_x.z > 0.0) as u8) | (((matrix.col_y.z > 0.0) as u8) << 1) | (((matrix.col_z.z > 0.0) as u8) << 2)
}

/// Front-to-back visiting order of the 8 child octants: the octant with zero
/// "far" bits (nearest) first, the all-far octant (farthest) last.
/// Exchanging two octants' positions in the projection direction (i.e.
/// flipping `forward_octant`'s bit for that axis) reverses the order along
/// that axis, matching spec §8 invariant 4.
pub fn traversal_order(forward: u8) -> [u8; 8] {
    let near_octant = (!forward) & 0b111;
    std::array::from_fn(|v| (v as u8) ^ near_octant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::V3c;

    fn matrix_with_col_z(cx: f32, cy: f32, cz: f32) -> AffineMatrix {
        AffineMatrix {
            col_x: V3c::new(0.0, 0.0, cx),
            col_y: V3c::new(0.0, 0.0, cy),
            col_z: V3c::new(0.0, 0.0, cz),
            translation: V3c::unit(0.0),
        }
    }

    #[test]
    fn test_traversal_order_starts_nearest() {
        let m = matrix_with_col_z(1.0, 1.0, 1.0);
        let forward = forward_octant(&m);
        let order = traversal_order(forward);
        // octant 0 (all "-" bits) is nearest when every +axis is farther.
        assert_eq!(order[0], 0);
        assert_eq!(order[7], 0b111);
    }

    #[test]
    fn test_flipping_one_axis_reverses_that_axis_in_order() {
        let m1 = matrix_with_col_z(1.0, 1.0, 1.0);
        let m2 = matrix_with_col_z(-1.0, 1.0, 1.0);
        let order1 = traversal_order(forward_octant(&m1));
        let order2 = traversal_order(forward_octant(&m2));
        // bit0 (X) meaning flips: the octant visited first differs exactly
        // by the X bit.
        assert_eq!(order1[0] ^ order2[0], 0b001);
    }

    #[test]
    fn test_traversal_order_is_a_permutation() {
        let m = matrix_with_col_z(1.0, -1.0, 1.0);
        let order = traversal_order(forward_octant(&m));
        let mut seen = [false; 8];
        for o in order {
            assert!(!seen[o as usize]);
            seen[o as usize] = true;
        }
    }
}
