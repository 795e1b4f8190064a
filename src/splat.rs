//! [`OctreeRenderer`]: the per-node recursive splatter (spec §4.2). Given an
//! affine matrix mapping the unit cube to screen pixels and a root address,
//! walks the octree front-to-back in fixed-point and writes a splat
//! footprint per leaf into a [`crate::framebuffer::Renderbuffer`] stripe.

mod shapes;
mod stack;

pub use shapes::RenderTarget;
pub use stack::StackEntry;

use crate::cage::{AffineMatrix, Shape};
use crate::octree::Octree;
use stack::{forward_octant, traversal_order};

/// Root extent past which a node is reported `TooBig` rather than rendered
/// (spec §2's "tuned constant around 128").
pub const MAX_SIZE_IN_PIXELS: f32 = 128.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderResult {
    Rendered,
    TooBig,
    TooClose,
    Culled,
}

/// Integer pixel bounds in data-space (the stripe's rows intersected with
/// the renderbuffer's full column range).
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderParams {
    pub shape: Shape,
    /// `-1` = unbounded.
    pub max_level: i32,
    pub absolute_dilation: f32,
    pub relative_dilation: f32,
    /// Stop subdividing once a node's pixel extent is `<=` this many pixels
    /// in both axes (spec §9 Open Questions pins the comparison to `<=`).
    pub map_threshold: i32,
    pub effective_near: i32,
}

/// One job's splatter state: a reusable traversal stack, owned by a single
/// `RenderingJob` and never shared across workers (spec §5).
#[derive(Debug, Default)]
pub struct OctreeRenderer {
    stack: Vec<StackEntry>,
}

impl OctreeRenderer {
    pub fn new() -> Self {
        Self { stack: Vec::with_capacity(64) }
    }

    fn node_aabb(entry: &StackEntry) -> (f32, f32, f32, f32) {
        use crate::spatial::fixed::from_fixed;
        let px = from_fixed(entry.px);
        let py = from_fixed(entry.py);
        let ex = from_fixed(entry.extent_x);
        let ey = from_fixed(entry.extent_y);
        (px - ex, px + ex, py - ey, py + ey)
    }

    /// Clips `entry`'s AABB against `viewport` and the occlusion summary;
    /// `false` means this branch contributes nothing and must be dropped
    /// without recursing into it.
    /// Shared with `crate::pipeline`, which runs the same AABB+occlusion
    /// check at cage granularity before deciding to subdivide.
    pub(crate) fn node_visible(entry: &StackEntry, viewport: Viewport, target: &RenderTarget) -> bool {
        let (min_x, max_x, min_y, max_y) = Self::node_aabb(entry);
        let x0 = (min_x.floor() as i32).max(viewport.x0);
        let x1 = (max_x.ceil() as i32).min(viewport.x1);
        let y0 = (min_y.floor() as i32).max(viewport.y0);
        let y1 = (max_y.ceil() as i32).min(viewport.y1);
        if x0 >= x1 || y0 >= y1 {
            return false;
        }
        let min_z = entry.pz - entry.extent_z;
        let row_offset = target.row_offset as i32;
        !target
            .stencil
            .is_occluded((y0 - row_offset) as usize, (y1 - row_offset) as usize, min_z)
    }

    pub fn render(
        &mut self,
        octree: &Octree,
        matrix: &AffineMatrix,
        root_address: u32,
        viewport: Viewport,
        params: &RenderParams,
        target: &mut RenderTarget,
    ) -> RenderResult {
        use crate::spatial::fixed::from_fixed;

        let root = StackEntry::root(matrix, root_address);
        let root_ex = from_fixed(root.extent_x);
        let root_ey = from_fixed(root.extent_y);
        if root_ex >= MAX_SIZE_IN_PIXELS || root_ey >= MAX_SIZE_IN_PIXELS {
            return RenderResult::TooBig;
        }
        if root.pz - root.extent_z <= params.effective_near {
            return RenderResult::TooClose;
        }
        if !Self::node_visible(&root, viewport, target) {
            return RenderResult::Culled;
        }

        let order = traversal_order(forward_octant(matrix));
        self.stack.clear();
        self.stack.push(root);

        while let Some(entry) = self.stack.pop() {
            if !Self::node_visible(&entry, viewport, target) {
                continue;
            }
            let node = *octree.node(entry.address);
            let level_capped = params.max_level >= 0 && entry.level >= params.max_level;
            let is_leaf = node.is_leaf() || level_capped;
            let ex = from_fixed(entry.extent_x);
            let ey = from_fixed(entry.extent_y);
            let small_enough = ex <= params.map_threshold as f32 && ey <= params.map_threshold as f32;

            if is_leaf || small_enough {
                shapes::rasterize(
                    params.shape,
                    &entry,
                    matrix,
                    (params.absolute_dilation, params.relative_dilation),
                    viewport,
                    node.color(),
                    target,
                );
                continue;
            }

            // push farthest-to-nearest so the nearest child pops first
            for &octant in order.iter().rev() {
                if !node.has_child(octant) {
                    continue;
                }
                let child_address = node.child_address(octant);
                self.stack.push(entry.child(octant, child_address, matrix));
            }
        }

        RenderResult::Rendered
    }
}
