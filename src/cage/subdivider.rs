use super::ProjectedVertex;
use crate::spatial::octant_offset;

/// Precomputed per-frame perspective-correction coefficients (spec §4.5
/// step 2). Applied to interior grid depths only when the cage being
/// subdivided is non-affine; an affine cage's linearly-blended depth is
/// already exact.
#[derive(Debug, Clone, Copy)]
pub struct ZCorrection {
    pub slope: f32,
    pub intercept: f32,
}

impl ZCorrection {
    fn correct(&self, blended_depth: f32) -> f32 {
        self.intercept + self.slope * blended_depth
    }
}

/// Per-child-octant state handed to the subdivision callback.
pub struct SubdivisionState<'a, D> {
    pub level: u32,
    pub octant: u8,
    pub grid: &'a [ProjectedVertex; 27],
    /// Indices into `grid` forming this child's own 8-corner cage, in
    /// canonical octant order.
    pub indices: [u8; 8],
    pub parent_data: &'a D,
}

impl<'a, D> SubdivisionState<'a, D> {
    /// Materializes this child's 8-corner cage from the shared grid.
    pub fn child_cage(&self) -> [ProjectedVertex; 8] {
        std::array::from_fn(|c| self.grid[self.indices[c] as usize])
    }
}

#[inline]
fn flat_index(i: usize, j: usize, k: usize) -> usize {
    i + 3 * j + 9 * k
}

pub struct CageSubdivider;

impl CageSubdivider {
    /// Builds the 3x3x3 trilinear grid from 8 projected corners.
    pub fn build_grid(corners: &[ProjectedVertex; 8], z_correction: Option<ZCorrection>) -> [ProjectedVertex; 27] {
        let mut grid = [ProjectedVertex::default(); 27];
        for k in 0..3usize {
            let t_k = k as f32 / 2.0;
            for j in 0..3usize {
                let t_j = j as f32 / 2.0;
                for i in 0..3usize {
                    let t_i = i as f32 / 2.0;
                    // classic trilinear: interpolate along x, then y, then z
                    let c = |a: usize, b: usize, cc: usize| corners[a + 2 * b + 4 * cc];
                    let x0 = c(0, 0, 0).lerp(&c(1, 0, 0), t_i);
                    let x1 = c(0, 1, 0).lerp(&c(1, 1, 0), t_i);
                    let x2 = c(0, 0, 1).lerp(&c(1, 0, 1), t_i);
                    let x3 = c(0, 1, 1).lerp(&c(1, 1, 1), t_i);
                    let y0 = x0.lerp(&x1, t_j);
                    let y1 = x2.lerp(&x3, t_j);
                    let mut blended = y0.lerp(&y1, t_k);

                    if let Some(correction) = z_correction {
                        blended.position.z = correction.correct(blended.position.z);
                    }
                    grid[flat_index(i, j, k)] = blended;
                }
            }
        }
        grid
    }

    /// Child octant `o`'s 8 grid-corner indices, in canonical octant order.
    pub fn child_indices(octant: u8) -> [u8; 8] {
        let base = octant_offset(octant);
        let base_i = base.x as usize;
        let base_j = base.y as usize;
        let base_k = base.z as usize;
        std::array::from_fn(|corner| {
            let o = octant_offset(corner as u8);
            flat_index(base_i + o.x as usize, base_j + o.y as usize, base_k + o.z as usize) as u8
        })
    }

    /// Subdivides `corners` recursively. `callback` is invoked once per
    /// child octant and returns `(recurse, data)`: `recurse == 0` prunes
    /// that branch, any nonzero value recurses into it with `data` becoming
    /// that branch's `parent_data`. There is no depth cap here -- the
    /// caller's callback (backed by `SubdivisionDecider`) is responsible.
    pub fn subdivide<D, F>(
        corners: &[ProjectedVertex; 8],
        level: u32,
        parent_data: &D,
        z_correction: Option<ZCorrection>,
        callback: &mut F,
    ) where
        F: FnMut(&SubdivisionState<D>) -> (u8, D),
    {
        let grid = Self::build_grid(corners, z_correction);
        for octant in 0..8u8 {
            let state = SubdivisionState {
                level,
                octant,
                grid: &grid,
                indices: Self::child_indices(octant),
                parent_data,
            };
            let (recurse, data) = callback(&state);
            if recurse != 0 {
                let child_cage = state.child_cage();
                Self::subdivide(&child_cage, level + 1, &data, z_correction, callback);
            }
        }
    }
}
