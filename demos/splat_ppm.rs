//! Renders a few frames of a subdivided, colored cube and writes the last
//! one to a PPM file -- the headless equivalent of the teacher's
//! `cpu_render` example, which instead opened a live window.

use octosplat::framebuffer::Color32;
use octosplat::octree::{Octree, OctreeNode};
use octosplat::new_demo;

/// Builds a 2-level octree: a root that subdivides into 8 colored octants.
/// Node layout matches `octree::io`'s doc: root at 0, its children at 1..=8.
fn colored_octants() -> Octree {
    let mut nodes = vec![OctreeNode::new(0xff, 0, 0, 0, 1)];
    for octant in 0u8..8 {
        let r = if octant & 0b001 != 0 { 255 } else { 0 };
        let g = if octant & 0b010 != 0 { 255 } else { 0 };
        let b = if octant & 0b100 != 0 { 255 } else { 0 };
        nodes.push(OctreeNode::new(0, r, g, b, 0));
    }
    Octree::new(nodes)
}

fn write_ppm(path: &str, width: u32, height: u32, pixels: &[Color32]) -> std::io::Result<()> {
    use std::io::Write;
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "P3\n{width} {height}\n255")?;
    for row in pixels.chunks(width as usize) {
        for p in row {
            write!(file, "{} {} {} ", p.r, p.g, p.b)?;
        }
        writeln!(file)?;
    }
    Ok(())
}

fn main() -> std::io::Result<()> {
    let mut demo = new_demo(vec![colored_octants()], vec![]);
    demo.resize(256, 256).expect("256x256 is a valid size");
    demo.set_thread_count(4);
    demo.object_mut(0).cage[7].x += 0.35; // a touch of distortion, to exercise CageSubdivider

    demo.move_camera(0.0, 0.0, -4.0);
    for frame in 0..4 {
        demo.set_camera_yaw(frame as f32 * 0.1);
        demo.render_frame();
    }

    let (w, h, pixels) = demo.get_image_data();
    write_ppm("splat_ppm.ppm", w, h, pixels)?;
    println!("wrote splat_ppm.ppm ({w}x{h})");
    Ok(())
}
