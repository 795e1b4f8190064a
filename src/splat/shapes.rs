use super::stack::StackEntry;
use super::Viewport;
use crate::cage::{AffineMatrix, Shape};
use crate::framebuffer::{Color32, StencilSummary};
use crate::spatial::fixed::from_fixed;
use crate::spatial::V3c;

/// Mutable handle to the region of the renderbuffer one `OctreeRenderer`
/// call is allowed to touch: a stripe's color/depth slices (row-major,
/// starting at data-space row `row_offset`) plus the shared occlusion
/// summary, which is indexed in absolute data-space rows.
pub struct RenderTarget<'a> {
    pub color: &'a mut [Color32],
    pub depth: &'a mut [i32],
    pub stride: usize,
    pub row_offset: u32,
    pub stencil: &'a mut StencilSummary,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    fn local_index(&self, x: u32, y: u32) -> usize {
        (y - self.row_offset) as usize * self.stride + x as usize
    }

    /// Depth-tests and writes one pixel; returns whether it was written.
    fn write_pixel(&mut self, x: u32, y: u32, depth: i32, color: Color32) -> bool {
        let idx = self.local_index(x, y);
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.color[idx] = color;
            true
        } else {
            false
        }
    }
}

fn rgb_to_color32(rgb: [u8; 3]) -> Color32 {
    Color32::new(rgb[0], rgb[1], rgb[2], 255)
}

fn dilation_amount(ex: f32, ey: f32, absolute: f32, relative: f32) -> f32 {
    absolute + relative * ex.max(ey)
}

/// Fills the intersection of `[min_x,max_x] x [min_y,max_y]` with `viewport`,
/// optionally gated by `inside` (used for [`Shape::Circle`]'s radial test).
///
/// Only tightens the occlusion summary's per-row bound for a row when the
/// fill spans that row's *entire* viewport-clipped width with no column
/// skipped (an ellipse gap counts as a skip) -- a row is "fully covered by
/// closer geometry" (the glossary's requirement for the occlusion summary)
/// only when every one of its columns was actually touched by this call,
/// not just the ones inside a partial rectangle.
#[allow(clippy::too_many_arguments)]
fn fill_rect(
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
    depth: i32,
    viewport: Viewport,
    target: &mut RenderTarget,
    color: Color32,
    inside: Option<(f32, f32, f32, f32)>, // (cx, cy, rx, ry) ellipse test
) -> bool {
    let x0 = (min_x.floor() as i32).max(viewport.x0);
    let x1 = (max_x.ceil() as i32).min(viewport.x1);
    let y0 = (min_y.floor() as i32).max(viewport.y0);
    let y1 = (max_y.ceil() as i32).min(viewport.y1);
    if x0 >= x1 || y0 >= y1 {
        return false;
    }
    let spans_full_width = x0 == viewport.x0 && x1 == viewport.x1;

    let mut wrote_any = false;
    for y in y0..y1 {
        let mut row_max = i32::MIN;
        let mut row_fully_covered = spans_full_width;
        for x in x0..x1 {
            if let Some((cx, cy, rx, ry)) = inside {
                let dx = (x as f32 + 0.5 - cx) / rx.max(1e-6);
                let dy = (y as f32 + 0.5 - cy) / ry.max(1e-6);
                if dx * dx + dy * dy > 1.0 {
                    row_fully_covered = false;
                    continue;
                }
            }
            if target.write_pixel(x as u32, y as u32, depth, color) {
                wrote_any = true;
            }
            row_max = row_max.max(target.depth[target.local_index(x as u32, y as u32)]);
        }
        if row_fully_covered {
            target.stencil.record_row_bound((y as u32 - target.row_offset) as usize, row_max);
        }
    }
    wrote_any
}

/// Writes one leaf's splat footprint. `entry`'s fixed-point center/extent are
/// in data-space pixels; `matrix` is only needed for [`Shape::Cube`], which
/// reconstructs its three visible faces from `M`'s columns.
#[allow(clippy::too_many_arguments)]
pub fn rasterize(
    shape: Shape,
    entry: &StackEntry,
    matrix: &AffineMatrix,
    dilation: (f32, f32),
    viewport: Viewport,
    rgb: [u8; 3],
    target: &mut RenderTarget,
) -> bool {
    let color = rgb_to_color32(rgb);
    let px = from_fixed(entry.px);
    let py = from_fixed(entry.py);
    let ex = from_fixed(entry.extent_x);
    let ey = from_fixed(entry.extent_y);
    let (absolute, relative) = dilation;

    match shape {
        Shape::Point => {
            let x = px.floor() as i32;
            let y = py.floor() as i32;
            if x < viewport.x0 || x >= viewport.x1 || y < viewport.y0 || y >= viewport.y1 {
                return false;
            }
            let wrote = target.write_pixel(x as u32, y as u32, entry.pz, color);
            // a single pixel only fully covers its row's occlusion bound
            // when the viewport itself is one pixel wide -- same rule as
            // `fill_rect`'s `spans_full_width` check.
            if x == viewport.x0 && x + 1 == viewport.x1 {
                let depth_now = target.depth[target.local_index(x as u32, y as u32)];
                target.stencil.record_row_bound((y as u32 - target.row_offset) as usize, depth_now);
            }
            wrote
        }
        Shape::Rectangle => {
            let d = dilation_amount(ex, ey, absolute, relative);
            fill_rect(px - ex - d, px + ex + d, py - ey - d, py + ey + d, entry.pz, viewport, target, color, None)
        }
        Shape::Square => {
            let e = ex.max(ey);
            let d = dilation_amount(e, e, absolute, relative);
            fill_rect(px - e - d, px + e + d, py - e - d, py + e + d, entry.pz, viewport, target, color, None)
        }
        Shape::Circle => {
            let d = dilation_amount(ex, ey, absolute, relative);
            let (rx, ry) = (ex + d, ey + d);
            fill_rect(px - rx, px + rx, py - ry, py + ry, entry.pz, viewport, target, color, Some((px, py, rx, ry)))
        }
        Shape::Cube => rasterize_cube(entry, matrix, viewport, color, target),
    }
}

fn rasterize_cube(entry: &StackEntry, matrix: &AffineMatrix, viewport: Viewport, color: Color32, target: &mut RenderTarget) -> bool {
    let cols = [matrix.col_x, matrix.col_y, matrix.col_z];
    let half = 0.5 * entry.col_scale;
    let center = V3c::new(from_fixed(entry.px), from_fixed(entry.py), entry.pz as f32);
    let mut wrote_any = false;

    for axis in 0..3 {
        let normal = cols[axis];
        let sign = if normal.z < 0.0 { 1.0 } else { -1.0 };
        let a = cols[(axis + 1) % 3];
        let b = cols[(axis + 2) % 3];
        let face_center = V3c::new(
            center.x + sign * half * normal.x,
            center.y + sign * half * normal.y,
            center.z + sign * half * normal.z,
        );
        let corners = [
            (face_center.x + a.x * half + b.x * half, face_center.y + a.y * half + b.y * half),
            (face_center.x + a.x * half - b.x * half, face_center.y + a.y * half - b.y * half),
            (face_center.x - a.x * half + b.x * half, face_center.y - a.y * half + b.y * half),
            (face_center.x - a.x * half - b.x * half, face_center.y - a.y * half - b.y * half),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
        let depth = face_center.z.round() as i32;
        if fill_rect(min_x, max_x, min_y, max_y, depth, viewport, target, color, None) {
            wrote_any = true;
        }
    }
    wrote_any
}
