//! [`CameraFrustum`]: the ortho/perspective/blended projection used to turn
//! an object's world-space cage into a [`crate::cage::ProjectedVertex`]
//! octet for the per-frame pipeline (spec §4.5 step 3).

use crate::spatial::{V2, V3c};

#[derive(Debug, Clone, Copy)]
pub struct CameraFrustum {
    pub aperture: V2,
    pub focus: V3c<f32>,
    pub near: f32,
    pub far: f32,
    /// 0 = pure orthographic, 1 = pure perspective, in between is a linear
    /// blend of both matrices' coefficients.
    pub perspective: f32,
}

impl Default for CameraFrustum {
    fn default() -> Self {
        Self {
            aperture: V2::new(2.0, 2.0),
            focus: V3c::new(0.0, 0.0, 1.0),
            near: 0.001,
            far: 100.0,
            perspective: 0.0,
        }
    }
}

/// Left/right/bottom/top frustum extents derived from `focus`/`aperture`,
/// shared between the ortho and perspective matrices (spec §3).
struct Extents {
    l: f32,
    r: f32,
    b: f32,
    t: f32,
}

impl CameraFrustum {
    fn extents(&self, k: f32) -> Extents {
        Extents {
            l: self.focus.x * k - self.aperture.x * k / 2.0,
            r: self.focus.x * k + self.aperture.x * k / 2.0,
            b: self.focus.y * k - self.aperture.y * k / 2.0,
            t: self.focus.y * k + self.aperture.y * k / 2.0,
        }
    }

    fn ortho_extents(&self) -> Extents {
        self.extents(1.0)
    }

    fn perspective_extents(&self) -> Extents {
        // guard idiom: a NaN/zero focus.z poisons k, which poisons every
        // downstream comparison into the cull branch rather than panicking.
        self.extents(self.near / self.focus.z)
    }

    /// Projects a single point (already in view space, i.e. post-`Model *
    /// View`) into screen-pixel X/Y with depth in renderbuffer-Z units.
    ///
    /// `position` is the pre-divide (clip-space-like) value used for depth
    /// and affine-matrix reconstruction; `projection` is the post-divide
    /// value used for culling bounds. Per the codebase convention recorded
    /// in spec §9's Open Questions, the input point must already have been
    /// negated by the caller.
    pub fn project(&self, point: V3c<f32>, data_w: f32, data_h: f32, size_z: f32) -> Projected {
        let eo = self.ortho_extents();
        let ep = self.perspective_extents();
        let blend = self.perspective;

        // Orthographic: w == 1, x'/y' map [l,r]x[b,t] to [-1,1].
        let ortho_x = 2.0 * (point.x - eo.l) / (eo.r - eo.l) - 1.0;
        let ortho_y = 2.0 * (point.y - eo.b) / (eo.t - eo.b) - 1.0;
        let ortho_w = 1.0f32;

        // Perspective, off-center frustum: w == z, x'/y' scale with depth.
        let persp_x = (2.0 * self.near * point.x) / (ep.r - ep.l)
            - point.z * (ep.r + ep.l) / (ep.r - ep.l);
        let persp_y = (2.0 * self.near * point.y) / (ep.t - ep.b)
            - point.z * (ep.t + ep.b) / (ep.t - ep.b);
        let persp_w = point.z;

        let clip_x = ortho_x * (1.0 - blend) + persp_x * blend;
        let clip_y = ortho_y * (1.0 - blend) + persp_y * blend;
        let clip_w = ortho_w * (1.0 - blend) + persp_w * blend;

        // map clip-space [-1,1] to renderbuffer pixels, keep depth in Z
        // discretization units (linear in raster space, see pipeline::ZSlope).
        let screen_x = (clip_x + clip_w) * 0.5 * data_w;
        let screen_y = (clip_y + clip_w) * 0.5 * data_h;
        let screen_z = ((point.z - self.near) / (self.far - self.near)) * size_z;

        Projected {
            position: V3c::new(screen_x, screen_y, screen_z * clip_w.max(f32::MIN_POSITIVE)),
            projection: if !(clip_w.abs() > 1e-12) {
                V2::new(screen_x, screen_y)
            } else {
                V2::new(screen_x / clip_w, screen_y / clip_w)
            },
        }
    }
}

/// Raw projection output before it's wrapped into a
/// [`crate::cage::ProjectedVertex`] (kept separate so `camera` doesn't need
/// to depend on `cage`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Projected {
    pub position: V3c<f32>,
    pub projection: V2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ortho_centered_unit_square_maps_to_viewport() {
        let cam = CameraFrustum {
            aperture: V2::new(2.0, 2.0),
            focus: V3c::new(0.0, 0.0, 1.0),
            near: 0.001,
            far: 100.0,
            perspective: 0.0,
        };
        let bottom_left = cam.project(V3c::new(-1.0, -1.0, 0.5), 100.0, 100.0, (1 << 24) as f32);
        assert!((bottom_left.position.x - 0.0).abs() < 1e-3);
        assert!((bottom_left.position.y - 0.0).abs() < 1e-3);
        let top_right = cam.project(V3c::new(1.0, 1.0, 0.5), 100.0, 100.0, (1 << 24) as f32);
        assert!((top_right.position.x - 100.0).abs() < 1e-3);
        assert!((top_right.position.y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_nan_focus_never_panics() {
        let cam = CameraFrustum {
            focus: V3c::new(0.0, 0.0, f32::NAN),
            ..Default::default()
        };
        let result = cam.project(V3c::new(0.0, 0.0, 0.0), 10.0, 10.0, (1 << 24) as f32);
        // guard idiom: NaN propagates, it never panics, and callers compare
        // with `!(x < bound)` so it always culls.
        assert!(result.position.x.is_nan() || result.projection.x.is_nan());
    }
}
