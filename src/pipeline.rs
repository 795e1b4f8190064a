//! The per-frame driver (spec §4.5): projects every model's cage, culls and
//! depth-sorts front-to-back, splits the renderbuffer into worker stripes,
//! and walks each model's cage through [`SubdivisionDecider`] down to
//! [`OctreeRenderer`] calls. [`Demo`] is the `new_demo`/`render_frame`
//! surface a host application drives (spec §6).

mod tests;

use crate::cage::{CageSubdivider, CageToMatrix, Decision, ProjectedVertex, Shape, SubdivisionDecider, ZCorrection};
use crate::camera::CameraFrustum;
use crate::framebuffer::{Color32, Renderbuffer, StencilSummary, DEFAULT_SIZE_Z};
use crate::object3d::{apply4, rotate_vector, Object3D};
use crate::octree::{Octree, RenderError};
use crate::settings::RenderSettings;
use crate::spatial::fixed::from_fixed;
use crate::spatial::{V2, V3c};
use crate::splat::{OctreeRenderer, RenderParams, RenderTarget, StackEntry, Viewport, MAX_SIZE_IN_PIXELS};

/// One world or player-attached octree plus its TRS/cage state.
struct RenderModel {
    octree: Octree,
    object: Object3D,
    is_player: bool,
}

/// One worker's persistent splatter state: its own traversal stack and its
/// own stripe-local occlusion summary, owned for the job's lifetime and
/// resized (never reallocated from scratch) as stripe heights change
/// (spec §5's "static pool of preallocated rendering jobs").
pub struct RenderingJob {
    renderer: OctreeRenderer,
    stencil: StencilSummary,
}

impl RenderingJob {
    fn new() -> Self {
        Self {
            renderer: OctreeRenderer::new(),
            stencil: StencilSummary::new(0, DEFAULT_SIZE_Z),
        }
    }
}

/// Per-frame camera-derived coefficients: the perspective-correction line
/// used by [`CageSubdivider`] to recompute interior grid depths, and the
/// near-plane clamp fed to every [`RenderParams`] this frame (spec §4.5
/// step 2).
struct FrameDepth {
    correction: ZCorrection,
    effective_near: i32,
}

/// `ZSlope`/`ZIntercept` from spec §4.5 step 2, derived from the frustum's
/// near/far/perspective-blend alone (the clip-space `w` at `z=near`/`z=far`,
/// independent of screen X/Y). `effective_near_fraction` is the `[0,1]`
/// tunable clamping how far above the true near plane `TooClose` triggers.
fn z_slope_intercept(frustum: &CameraFrustum, size_z: f32, effective_near_fraction: f32) -> FrameDepth {
    let blend = frustum.perspective;
    let w_near = (1.0 - blend) + frustum.near * blend;
    let w_far = (1.0 - blend) + frustum.far * blend;
    let z_near_raster = 0.0f32;
    let z_far_raster = size_z;

    let denom = (z_far_raster - z_near_raster).abs().max(f32::MIN_POSITIVE);
    let slope = (w_far - w_near).abs() / denom;
    let intercept = w_near.abs() - slope * z_near_raster;

    let safe_slope = if slope.abs() > 1e-12 { slope } else { 1e-12 };
    let raw_near = -intercept / safe_slope;
    let lower_bound = -size_z * effective_near_fraction;
    let effective_near = if raw_near.is_nan() { 0.0 } else { raw_near.clamp(lower_bound, 0.0) };

    FrameDepth {
        correction: ZCorrection { slope, intercept },
        effective_near: effective_near.round() as i32,
    }
}

/// Transforms one cage corner by `Model * View` and projects it, writing
/// both halves of [`ProjectedVertex`]. The vertex is negated before the
/// model transform is applied -- a codebase convention spec §9's Open
/// Questions calls out as unexplained but required for bit-identical
/// results; its sign is tied to depth being stored as `-position.z +
/// offset.z` throughout the rest of the pipeline.
///
/// `sample_offset` is the frame's sub-pixel jitter in data-space pixels
/// (`Renderbuffer::sampling_offset`, `(0,0)` unless upscaling); it's added
/// to the post-divide screen X/Y that `CageToMatrix`/the splatter actually
/// rasterize from, which is what makes each of the 4 jitter phases sample a
/// different sub-pixel location of the same scene (spec §3, §8 invariant 7).
fn project_model(
    model: &mut Object3D,
    view: &[[f32; 4]; 4],
    frustum: &CameraFrustum,
    data_w: f32,
    data_h: f32,
    size_z: f32,
    sample_offset: (f32, f32),
) {
    let model_matrix = model.matrix();
    let mut projected = [ProjectedVertex::default(); 8];
    for (i, corner) in model.cage.iter().enumerate() {
        let world = apply4(&model_matrix, -*corner);
        let view_space = apply4(view, world);
        let p = frustum.project(view_space, data_w, data_h, size_z);
        let position = V3c::new(p.position.x + sample_offset.0, p.position.y + sample_offset.1, p.position.z);
        let projection = V2::new(p.projection.x + sample_offset.0, p.projection.y + sample_offset.1);
        projected[i] = ProjectedVertex::new(position, projection);
    }
    model.projected_cage = projected;
    model.recompute_projected_bounds();
}

/// Frustum/depth-range cull in projection space (spec §4.5 step 3). Written
/// as plain comparisons whose conjunction is the acceptance test, per the
/// NaN guard idiom (§7): a NaN bound anywhere makes the conjunction `false`,
/// so `should_cull` returns `true` and the model is dropped rather than
/// rendered with garbage bounds.
fn should_cull(model: &Object3D, viewport: Viewport, size_z: f32) -> bool {
    let min = model.projected_min;
    let max = model.projected_max;
    let within_x = min.x < viewport.x1 as f32 && max.x > viewport.x0 as f32;
    let within_y = min.y < viewport.y1 as f32 && max.y > viewport.y0 as f32;
    let within_z = min.z < size_z && max.z > 0.0;
    !(within_x && within_y && within_z)
}

/// One cage cell's decide/render/subdivide step (spec §4.4 + §4.5 step 6).
/// `address`/`level` identify the octree node this cell currently stands
/// for; on `Subdivide`, the cell is manually recursed rather than relying on
/// [`CageSubdivider::subdivide`]'s own recursion (it is always told to prune
/// via a `0` recurse flag), so that `OctreeRenderer::render` calls interleave
/// with the decision tree in the exact front-to-back, cell-by-cell order the
/// spec describes.
#[allow(clippy::too_many_arguments)]
fn decide_and_render(
    octree: &Octree,
    corners: &[ProjectedVertex; 8],
    level: i32,
    address: u32,
    target: &mut RenderTarget,
    renderer: &mut OctreeRenderer,
    viewport: Viewport,
    params: &RenderParams,
    max_distortion: f32,
    z_correction: Option<ZCorrection>,
) {
    let (matrix, distortion) = CageToMatrix::extract(corners);
    let root_entry = StackEntry::root(&matrix, address);
    if !OctreeRenderer::node_visible(&root_entry, viewport, target) {
        return;
    }

    let node = *octree.node(address);
    let is_leaf = node.is_leaf() || (params.max_level >= 0 && level >= params.max_level);
    let ex = from_fixed(root_entry.extent_x);
    let ey = from_fixed(root_entry.extent_y);
    let is_too_big = ex >= MAX_SIZE_IN_PIXELS || ey >= MAX_SIZE_IN_PIXELS;
    let is_too_close = root_entry.pz - root_entry.extent_z <= params.effective_near;
    let is_distorted = distortion > max_distortion;
    let is_cube = params.shape == Shape::Cube;

    match SubdivisionDecider::evaluate(is_cube, is_leaf, is_too_close, is_too_big, is_distorted) {
        Decision::Cull => {}
        Decision::Render => {
            renderer.render(octree, &matrix, address, viewport, params, target);
        }
        Decision::Subdivide => {
            CageSubdivider::subdivide(corners, level as u32, &(), z_correction, &mut |state| {
                let child_address = if node.is_leaf() {
                    address
                } else if node.has_child(state.octant) {
                    node.child_address(state.octant)
                } else {
                    return (0u8, ());
                };
                let child_corners = state.child_cage();
                decide_and_render(
                    octree,
                    &child_corners,
                    level + 1,
                    child_address,
                    &mut *target,
                    &mut *renderer,
                    viewport,
                    params,
                    max_distortion,
                    z_correction,
                );
                (0u8, ())
            });
        }
    }
}

/// One worker stripe's full pass over the sorted, visible model list.
#[allow(clippy::too_many_arguments)]
fn render_stripe(
    models: &[RenderModel],
    order: &[usize],
    job: &mut RenderingJob,
    color: &mut [Color32],
    depth: &mut [i32],
    stride: usize,
    row_offset: u32,
    viewport: Viewport,
    params: &RenderParams,
    max_distortion: f32,
    z_correction: ZCorrection,
) {
    let mut target = RenderTarget {
        color,
        depth,
        stride,
        row_offset,
        stencil: &mut job.stencil,
    };
    for &idx in order {
        let model = &models[idx];
        let corners = model.object.projected_cage;
        // an affine cage's linearly-blended depth is already exact; only a
        // deformed cage needs the per-cell perspective recorrection.
        let correction = if model.object.is_affine() { None } else { Some(z_correction) };
        decide_and_render(
            &model.octree,
            &corners,
            0,
            0,
            &mut target,
            &mut job.renderer,
            viewport,
            params,
            max_distortion,
            correction,
        );
    }
}

/// The `new_demo`/`render_frame` surface (spec §6). Owns the renderbuffer,
/// the camera pose, every model's octree + TRS/cage state, and the worker
/// job pool.
pub struct Demo {
    renderbuffer: Renderbuffer,
    camera_pose: Object3D,
    frustum: CameraFrustum,
    zoom: f32,
    settings: RenderSettings,
    models: Vec<RenderModel>,
    jobs: Vec<RenderingJob>,
    /// The color `Begin` clears to every frame (spec §3's `Begin(background)`).
    background: Color32,
}

/// Builds the world + player model list and applies the `switch_to_perspective`
/// preset, matching how a fresh renderer starts up before any host input
/// has arrived.
pub fn new_demo(octrees: Vec<Octree>, player_octrees: Vec<Octree>) -> Demo {
    let models = octrees
        .into_iter()
        .map(|octree| RenderModel { octree, object: Object3D::default(), is_player: false })
        .chain(player_octrees.into_iter().map(|octree| RenderModel { octree, object: Object3D::default(), is_player: true }))
        .collect();

    let mut demo = Demo {
        renderbuffer: Renderbuffer::new(1, 1, false).expect("1x1 is always a valid size"),
        camera_pose: Object3D::default(),
        frustum: CameraFrustum::default(),
        zoom: 0.0,
        settings: RenderSettings::default(),
        models,
        jobs: Vec::new(),
        background: Color32::BLACK,
    };
    demo.switch_to_perspective();
    demo
}

impl Demo {
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.renderbuffer.resize(width, height, self.settings.use_upscaling())
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// World models occupy indices `[0, world_count)`, player models occupy
    /// the rest, in `new_demo`'s argument order.
    pub fn object_mut(&mut self, index: usize) -> &mut Object3D {
        &mut self.models[index].object
    }

    pub fn set_camera_pitch(&mut self, pitch: f32) {
        let r = self.camera_pose.rotation();
        self.camera_pose.set_rotation(V3c::new(pitch, r.y, r.z));
    }

    pub fn set_camera_yaw(&mut self, yaw: f32) {
        let r = self.camera_pose.rotation();
        self.camera_pose.set_rotation(V3c::new(r.x, yaw, r.z));
    }

    /// `zoom` is an exponential distance-step count: `focus.z = 2^(zoom/8)`,
    /// matching the `distanceSteps` preset values in spec §6's
    /// `switch_to_perspective`/`switch_to_orthographic`.
    pub fn set_camera_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
        self.frustum.focus.z = 2.0f32.powf(zoom / 8.0);
    }

    pub fn camera_zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_camera_perspective(&mut self, perspective: f32) {
        self.frustum.perspective = perspective.clamp(0.0, 1.0);
    }

    /// Moves the camera by `(dx, dy, dz)` expressed in the camera's own
    /// local frame (spec §6).
    pub fn move_camera(&mut self, dx: f32, dy: f32, dz: f32) {
        let delta = rotate_vector(self.camera_pose.rotation(), V3c::new(dx, dy, dz));
        let position = self.camera_pose.position();
        self.camera_pose.set_position(position + delta);
    }

    pub fn switch_to_perspective(&mut self) {
        self.set_camera_zoom(-8.0);
        self.frustum.perspective = 0.98;
        self.frustum.near = 0.001;
        self.frustum.far = 100.0;
    }

    pub fn switch_to_orthographic(&mut self) {
        self.set_camera_zoom(56.0);
        self.frustum.perspective = 0.0;
        self.frustum.near = 0.001;
        self.frustum.far = 1000.0;
    }

    pub fn thread_count(&self) -> u32 {
        self.settings.thread_count()
    }

    pub fn set_thread_count(&mut self, value: u32) {
        self.settings.set_thread_count(value);
    }

    pub fn max_level(&self) -> i32 {
        self.settings.max_level()
    }

    pub fn set_max_level(&mut self, value: i32) {
        self.settings.set_max_level(value);
    }

    pub fn absolute_dilation(&self) -> f32 {
        self.settings.absolute_dilation()
    }

    pub fn set_absolute_dilation(&mut self, value: f32) {
        self.settings.set_absolute_dilation(value);
    }

    pub fn relative_dilation(&self) -> f32 {
        self.settings.relative_dilation()
    }

    pub fn set_relative_dilation(&mut self, value: f32) {
        self.settings.set_relative_dilation(value);
    }

    pub fn shape(&self) -> Shape {
        self.settings.shape()
    }

    pub fn set_shape(&mut self, value: Shape) {
        self.settings.set_shape(value);
    }

    pub fn show_bounds(&self) -> bool {
        self.settings.show_bounds()
    }

    pub fn set_show_bounds(&mut self, value: bool) {
        self.settings.set_show_bounds(value);
    }

    pub fn background(&self) -> Color32 {
        self.background
    }

    pub fn set_background(&mut self, value: Color32) {
        self.background = value;
    }

    pub fn max_distortion(&self) -> f32 {
        self.settings.max_distortion()
    }

    pub fn set_max_distortion(&mut self, value: f32) {
        self.settings.set_max_distortion(value);
    }

    pub fn use_map_at_3(&self) -> bool {
        self.settings.use_map_at_3()
    }

    pub fn set_use_map_at_3(&mut self, value: bool) {
        self.settings.set_use_map_at_3(value);
    }

    pub fn use_upscaling(&self) -> bool {
        self.settings.use_upscaling()
    }

    /// Toggling upscaling changes the renderbuffer's oversampled dimensions,
    /// so unlike the other tunables this one can fail the way `resize` can.
    pub fn set_use_upscaling(&mut self, value: bool) -> Result<(), RenderError> {
        self.settings.set_use_upscaling(value);
        let (width, height) = (self.renderbuffer.width(), self.renderbuffer.height());
        self.renderbuffer.resize(width, height, value)
    }

    pub fn effective_near(&self) -> f32 {
        self.settings.effective_near()
    }

    pub fn set_effective_near(&mut self, value: f32) {
        self.settings.set_effective_near(value);
    }

    pub fn get_image_data(&self) -> (u32, u32, &[Color32]) {
        self.renderbuffer.get_image_data()
    }

    /// Runs one full frame: projects and culls every model, depth-sorts
    /// front-to-back, splits the renderbuffer into `thread_count` stripes,
    /// and dispatches one `RenderingJob` per stripe (spec §4.5, §5).
    pub fn render_frame(&mut self) {
        let thread_count = self.settings.thread_count() as usize;
        if self.jobs.len() < thread_count {
            self.jobs.resize_with(thread_count, RenderingJob::new);
        }

        let size_z = self.renderbuffer.size_z();
        let data_w = self.renderbuffer.data_width() as f32;
        let data_h = self.renderbuffer.data_height() as f32;
        let full_viewport = Viewport { x0: 0, y0: 0, x1: data_w as i32, y1: data_h as i32 };

        self.renderbuffer.begin(self.background);
        let sample_offset = self.renderbuffer.sampling_offset();

        let view = self.camera_pose.inverse();
        let frame_depth = z_slope_intercept(&self.frustum, size_z as f32, self.settings.effective_near());
        let render_params = RenderParams {
            shape: self.settings.shape(),
            max_level: self.settings.max_level(),
            absolute_dilation: self.settings.absolute_dilation(),
            relative_dilation: self.settings.relative_dilation(),
            map_threshold: self.settings.map_threshold(),
            effective_near: frame_depth.effective_near,
        };

        let camera_position = self.camera_pose.position();
        let camera_rotation = self.camera_pose.rotation();
        for model in self.models.iter_mut().filter(|m| m.is_player) {
            model.object.set_position(camera_position);
            model.object.set_rotation(camera_rotation);
        }

        for model in self.models.iter_mut() {
            project_model(&mut model.object, &view, &self.frustum, data_w, data_h, size_z as f32, sample_offset);
        }

        let mut order: Vec<usize> = (0..self.models.len())
            .filter(|&i| !should_cull(&self.models[i].object, full_viewport, size_z as f32))
            .collect();
        order.sort_by(|&a, &b| {
            self.models[a]
                .object
                .projected_min
                .z
                .partial_cmp(&self.models[b].object.projected_min.z)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let bounds = self.renderbuffer.stripe_bounds(thread_count);
        for (job, &(y0, y1)) in self.jobs.iter_mut().zip(bounds.iter()) {
            job.stencil.resize((y1 - y0) as usize, size_z);
        }

        let stride = self.renderbuffer.stride();
        let models: &[RenderModel] = &self.models;
        let order_slice: &[usize] = &order;
        let max_distortion = self.settings.max_distortion();
        let z_correction = frame_depth.correction;
        let stripes = self.renderbuffer.split_stripes_mut(&bounds);

        if thread_count <= 1 {
            for (job, ((color, depth), &(y0, y1))) in self.jobs.iter_mut().zip(stripes.into_iter().zip(bounds.iter())) {
                let viewport = Viewport { x0: 0, y0: y0 as i32, x1: data_w as i32, y1: y1 as i32 };
                render_stripe(models, order_slice, job, color, depth, stride, y0, viewport, &render_params, max_distortion, z_correction);
            }
        } else {
            let jobs = &mut self.jobs;
            rayon::scope(|scope| {
                for ((job, (color, depth)), &(y0, y1)) in jobs.iter_mut().zip(stripes.into_iter()).zip(bounds.iter()) {
                    let viewport = Viewport { x0: 0, y0: y0 as i32, x1: data_w as i32, y1: y1 as i32 };
                    scope.spawn(move |_| {
                        render_stripe(models, order_slice, job, color, depth, stride, y0, viewport, &render_params, max_distortion, z_correction);
                    });
                }
            });
        }

        self.renderbuffer.end();
    }
}
