//! Sparse voxel octree splatting.
//!
//! An [`Octree`] of fixed-size [`OctreeNode`]s is rendered by projecting its
//! root-to-leaf cages through a [`CameraFrustum`], subdividing cages with
//! [`cage::CageSubdivider`] where the affine approximation drifts too far
//! from perspective, and splatting the remaining leaves with
//! [`splat::OctreeRenderer`] into a [`framebuffer::Renderbuffer`].
//! [`pipeline::Demo`] drives the whole per-frame pipeline and is the crate's
//! main entry point.

pub mod cage;
pub mod camera;
pub mod framebuffer;
pub mod object3d;
pub mod octree;
pub mod pipeline;
pub mod settings;
pub mod spatial;
pub mod splat;

pub use camera::CameraFrustum;
pub use object3d::Object3D;
pub use octree::{Octree, OctreeNode, RenderError};
pub use pipeline::{new_demo, Demo};
pub use settings::RenderSettings;
