#![cfg(test)]

use super::*;
use crate::cage::Shape;
use crate::octree::OctreeNode;
use crate::spatial::V3c;

fn leaf_octree(r: u8, g: u8, b: u8) -> Octree {
    Octree::new(vec![OctreeNode::new(0, r, g, b, 0)])
}

#[test]
fn test_z_slope_intercept_is_finite_for_default_frustum() {
    let frustum = CameraFrustum::default();
    let fd = z_slope_intercept(&frustum, (1 << 24) as f32, 0.05);
    assert!(fd.correction.slope.is_finite());
    assert!(fd.correction.intercept.is_finite());
}

#[test]
fn test_should_cull_rejects_nan_bounds() {
    let mut model = Object3D::default();
    model.projected_min = V3c::new(f32::NAN, 0.0, 0.0);
    model.projected_max = V3c::new(10.0, 10.0, 10.0);
    let viewport = Viewport { x0: 0, y0: 0, x1: 100, y1: 100 };
    assert!(should_cull(&model, viewport, (1 << 24) as f32));
}

/// S5: a deformed, non-cube cage renders without holes across its
/// projected bounds.
#[test]
fn test_s5_deformed_cage_renders_without_holes() {
    let mut demo = new_demo(vec![leaf_octree(255, 0, 0)], vec![]);
    demo.resize(64, 64).unwrap();
    demo.set_shape(Shape::Rectangle);
    demo.set_thread_count(1);
    demo.object_mut(0).cage[7].x += 0.5;
    assert!(!demo.object_mut(0).is_affine());

    demo.render_frame();
    let (w, h, pixels) = demo.get_image_data();
    assert_eq!((w, h), (64, 64));

    let center = pixels[(h / 2 * w + w / 2) as usize];
    assert_ne!(center, Color32::default(), "center of a deformed full-screen cube must not be background");

    let colored = pixels.iter().filter(|&&p| p != Color32::default()).count();
    assert!(colored > (w * h) as usize / 4, "deformed cage left most of the viewport blank");
}

/// S6: rendering the same scene with 1 vs 8 worker stripes must produce
/// bit-identical output (stripe partitioning respects row exclusivity).
#[test]
fn test_s6_multithread_determinism() {
    let build = || {
        let mut demo = new_demo(vec![leaf_octree(255, 0, 0), leaf_octree(0, 255, 0)], vec![]);
        demo.resize(80, 60).unwrap();
        demo.object_mut(1).set_position(V3c::new(0.0, 0.0, 0.5));
        demo
    };

    let mut single = build();
    single.set_thread_count(1);
    single.render_frame();
    let (w1, h1, pixels1) = single.get_image_data();
    let pixels1: Vec<Color32> = pixels1.to_vec();

    let mut multi = build();
    multi.set_thread_count(8);
    multi.render_frame();
    let (w2, h2, pixels2) = multi.get_image_data();

    assert_eq!((w1, h1), (w2, h2));
    assert_eq!(pixels1, pixels2);
}

#[test]
fn test_render_frame_does_not_panic_with_no_models() {
    let mut demo = new_demo(vec![], vec![]);
    demo.resize(16, 16).unwrap();
    demo.render_frame();
    let (w, h, pixels) = demo.get_image_data();
    assert_eq!(pixels.len(), (w * h) as usize);
}

#[test]
fn test_move_camera_translates_in_local_frame() {
    let mut demo = new_demo(vec![], vec![]);
    demo.set_camera_yaw(std::f32::consts::FRAC_PI_2);
    demo.move_camera(0.0, 0.0, 1.0);
    // a +Z local move rotated 90 degrees in yaw lands mostly on X, not Z.
    let pos = demo.camera_pose.position();
    assert!(pos.x.abs() > pos.z.abs());
}
