//! [`Renderbuffer`]: the stencil/depth/color target the splatter writes
//! into, with optional 2x temporal-upscaled rendering (spec §2, §3).

pub mod color;
pub mod stencil;

mod tests;

pub use color::Color32;
pub use stencil::StencilSummary;

use crate::octree::io::RenderError;

/// Depth discretization steps, `1<<24` per spec §3's example.
pub const DEFAULT_SIZE_Z: i32 = 1 << 24;

/// The 4-phase sub-pixel jitter schedule for temporal upscaling. Order is
/// implementation-defined (spec §9 Open Questions) but must be stable
/// frame-over-frame; this crate fixes it to the order spec §3 lists the
/// corners in.
const SAMPLE_OFFSETS: [(f32, f32); 4] = [(-0.25, -0.25), (0.25, -0.25), (-0.25, 0.25), (0.25, 0.25)];

fn row_stride_shift(data_width: u32) -> u8 {
    let mut shift = 0u8;
    while (1u32 << shift) < data_width.max(1) {
        shift += 1;
    }
    shift
}

#[derive(Debug, Clone)]
pub struct Renderbuffer {
    width: u32,
    height: u32,
    data_width: u32,
    data_height: u32,
    shift_x: u8,
    size_z: i32,
    upscaling: bool,
    temporal_phase: u8,

    color: Vec<Color32>,
    depth: Vec<i32>,
    stencil: StencilSummary,
    final_color: Vec<Color32>,
    has_history: bool,
}

impl Renderbuffer {
    pub fn new(width: u32, height: u32, upscaling: bool) -> Result<Self, RenderError> {
        let mut rb = Self {
            width: 0,
            height: 0,
            data_width: 0,
            data_height: 0,
            shift_x: 0,
            size_z: DEFAULT_SIZE_Z,
            upscaling,
            temporal_phase: 0,
            color: Vec::new(),
            depth: Vec::new(),
            stencil: StencilSummary::new(0, DEFAULT_SIZE_Z),
            final_color: Vec::new(),
            has_history: false,
        };
        rb.resize(width, height, upscaling)?;
        Ok(rb)
    }

    pub fn resize(&mut self, width: u32, height: u32, upscaling: bool) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions);
        }
        let scale = if upscaling { 2 } else { 1 };
        self.width = width;
        self.height = height;
        self.data_width = width * scale;
        self.data_height = height * scale;
        self.upscaling = upscaling;
        self.shift_x = row_stride_shift(self.data_width);
        let stride = self.stride();
        self.color = vec![Color32::default(); stride * self.data_height as usize];
        self.depth = vec![self.size_z; stride * self.data_height as usize];
        self.stencil.resize(self.data_height as usize, self.size_z);
        self.final_color = vec![Color32::default(); (width * height) as usize];
        self.has_history = false;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn data_height(&self) -> u32 {
        self.data_height
    }

    pub fn size_z(&self) -> i32 {
        self.size_z
    }

    pub fn shift_x(&self) -> u8 {
        self.shift_x
    }

    pub fn stride(&self) -> usize {
        1usize << self.shift_x
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * self.stride() + x as usize
    }

    /// Current frame's sub-pixel sample offset; `(0,0)` unless upscaling.
    pub fn sampling_offset(&self) -> (f32, f32) {
        if self.upscaling {
            SAMPLE_OFFSETS[self.temporal_phase as usize]
        } else {
            (0.0, 0.0)
        }
    }

    pub fn stencil(&self) -> &StencilSummary {
        &self.stencil
    }

    pub fn stencil_mut(&mut self) -> &mut StencilSummary {
        &mut self.stencil
    }

    pub fn color(&self) -> &[Color32] {
        &self.color
    }

    pub fn depth(&self) -> &[i32] {
        &self.depth
    }

    /// Disjoint mutable row ranges for `worker_count` stripes, each
    /// `[y0, y1)` in data-space rows. Non-overlapping by construction --
    /// the pipeline hands one range to each `RenderingJob` (spec §5).
    pub fn stripe_bounds(&self, worker_count: usize) -> Vec<(u32, u32)> {
        let worker_count = worker_count.max(1).min(self.data_height.max(1) as usize) as u32;
        let rows = self.data_height;
        let base = rows / worker_count;
        let remainder = rows % worker_count;
        let mut bounds = Vec::with_capacity(worker_count as usize);
        let mut y = 0u32;
        for w in 0..worker_count {
            let extra = if w < remainder { 1 } else { 0 };
            let y1 = y + base + extra;
            bounds.push((y, y1));
            y = y1;
        }
        bounds
    }

    /// Mutable color+depth slices covering rows `[y0, y1)`, for a single
    /// worker's stripe. Row-major layout makes a row range a contiguous
    /// index range, so this is a plain sub-slice, no locking needed.
    pub fn stripe_mut(&mut self, y0: u32, y1: u32) -> (&mut [Color32], &mut [i32]) {
        let stride = self.stride();
        let lo = y0 as usize * stride;
        let hi = (y1 as usize * stride).min(self.color.len());
        (&mut self.color[lo..hi], &mut self.depth[lo..hi])
    }

    /// Splits color+depth into as many disjoint mutable stripes as `bounds`
    /// has entries, all live simultaneously -- what the threaded pipeline
    /// needs to hand one stripe to each parallel `RenderingJob` (spec §5).
    /// `bounds` must be contiguous, ascending, and cover `[0, data_height)`,
    /// exactly what [`Renderbuffer::stripe_bounds`] returns.
    pub fn split_stripes_mut(&mut self, bounds: &[(u32, u32)]) -> Vec<(&mut [Color32], &mut [i32])> {
        let stride = self.stride();
        let mut color_rest: &mut [Color32] = &mut self.color;
        let mut depth_rest: &mut [i32] = &mut self.depth;
        let mut out = Vec::with_capacity(bounds.len());
        for &(y0, y1) in bounds {
            let len = (y1.saturating_sub(y0) as usize) * stride;
            let (color_head, color_tail) = color_rest.split_at_mut(len.min(color_rest.len()));
            let (depth_head, depth_tail) = depth_rest.split_at_mut(len.min(depth_rest.len()));
            color_rest = color_tail;
            depth_rest = depth_tail;
            out.push((color_head, depth_head));
        }
        out
    }

    /// Clears color to `background` and depth to `size_z` over the full
    /// oversampled buffer, and resets the occlusion summary.
    pub fn begin(&mut self, background: Color32) {
        self.color.fill(background);
        self.depth.fill(self.size_z);
        self.stencil.reset(self.size_z);
    }

    /// Downsamples the oversampled buffer into final resolution. When
    /// upscaling is enabled, blends this frame's raw downsample 50/50 with
    /// the running history so a static scene converges across the 4 jitter
    /// phases rather than flickering between them; then advances the phase.
    pub fn end(&mut self) {
        let scale: u32 = if self.upscaling { 2 } else { 1 };
        let stride = self.stride();
        for oy in 0..self.height {
            for ox in 0..self.width {
                let color = if self.upscaling {
                    let mut samples = [Color32::default(); 4];
                    let mut n = 0;
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let x = ox * scale + sx;
                            let y = oy * scale + sy;
                            samples[n] = self.color[y as usize * stride + x as usize];
                            n += 1;
                        }
                    }
                    Color32::average(&samples[..n])
                } else {
                    self.color[oy as usize * stride + ox as usize]
                };

                let out_index = (oy * self.width + ox) as usize;
                self.final_color[out_index] = if self.upscaling && self.has_history {
                    Color32::average(&[self.final_color[out_index], color])
                } else {
                    color
                };
            }
        }
        self.has_history = true;
        self.temporal_phase = (self.temporal_phase + 1) % 4;
    }

    pub fn get_image_data(&self) -> (u32, u32, &[Color32]) {
        (self.width, self.height, &self.final_color)
    }
}
