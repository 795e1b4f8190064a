use criterion::{criterion_group, criterion_main};

use octosplat::cage::Shape;
use octosplat::framebuffer::{Color32, Renderbuffer, StencilSummary};
use octosplat::octree::{Octree, OctreeNode};
use octosplat::splat::{OctreeRenderer, RenderParams, RenderTarget, Viewport};
use octosplat::spatial::V3c;
use octosplat::{new_demo, Demo};

use rand::Rng;

/// Builds a perfect octree `depth` levels deep, every leaf a random color --
/// the worst case for the splatter's traversal stack (every node visited,
/// no early leaf termination).
fn full_octree(depth: u32) -> Octree {
    let mut rng = rand::thread_rng();
    let mut nodes = Vec::new();
    let mut level: Vec<usize> = vec![0]; // one placeholder, patched below
    nodes.push(OctreeNode::default());

    for d in 0..depth {
        let is_last = d + 1 == depth;
        let mut next_level = Vec::with_capacity(level.len() * 8);
        for &parent_idx in &level {
            let address = nodes.len() as u32;
            nodes[parent_idx] = OctreeNode::new(0xff, 0, 0, 0, address);
            for _ in 0..8 {
                let child_idx = nodes.len();
                if is_last {
                    nodes.push(OctreeNode::new(0, rng.gen(), rng.gen(), rng.gen(), 0));
                } else {
                    nodes.push(OctreeNode::default());
                }
                next_level.push(child_idx);
            }
        }
        level = next_level;
    }
    Octree::new(nodes)
}

fn centered_matrix(size_z: f32, viewport: f32) -> octosplat::cage::AffineMatrix {
    let half = viewport / 2.0;
    octosplat::cage::AffineMatrix {
        col_x: V3c::new(half, 0.0, 0.0),
        col_y: V3c::new(0.0, half, 0.0),
        col_z: V3c::new(0.0, 0.0, 0.0),
        translation: V3c::new(half, half, size_z / 2.0),
    }
}

fn bench_splat_traversal(c: &mut criterion::Criterion) {
    let octree = full_octree(4); // 4-deep, 4096 leaves
    let mut rb = Renderbuffer::new(512, 512, false).unwrap();
    rb.begin(Color32::default());
    let matrix = centered_matrix(rb.size_z() as f32, 512.0);
    let viewport = Viewport { x0: 0, y0: 0, x1: rb.data_width() as i32, y1: rb.data_height() as i32 };
    let stride = rb.stride();
    let mut stencil = StencilSummary::new(rb.data_height() as usize, rb.size_z());
    let params = RenderParams {
        shape: Shape::Rectangle,
        max_level: -1,
        absolute_dilation: 0.0,
        relative_dilation: 0.0,
        map_threshold: 2,
        effective_near: 0,
    };

    c.bench_function("octree splat traversal (depth 4, 512x512)", |b| {
        b.iter(|| {
            let (color, depth) = rb.stripe_mut(0, rb.data_height());
            let mut target = RenderTarget { color, depth, stride, row_offset: 0, stencil: &mut stencil };
            let mut renderer = OctreeRenderer::new();
            renderer.render(&octree, &matrix, 0, viewport, &params, &mut target);
        });
    });
}

fn bench_render_frame_thread_scaling(c: &mut criterion::Criterion) {
    let mut group = c.benchmark_group("render_frame thread scaling");
    for &threads in &[1u32, 2, 4, 8] {
        group.bench_function(format!("{threads} threads"), |b| {
            let mut demo: Demo = new_demo(vec![full_octree(3), full_octree(3)], vec![]);
            demo.resize(256, 256).unwrap();
            demo.set_thread_count(threads);
            demo.object_mut(1).set_position(V3c::new(0.3, 0.0, 0.2));
            b.iter(|| demo.render_frame());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_splat_traversal, bench_render_frame_thread_scaling);
criterion_main!(benches);
