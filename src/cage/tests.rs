//! Integration tests exercising subdivider, matrix extraction and the
//! decider together, the way [`crate::splat`] actually chains them.

use super::*;
use crate::object3d::UNIT_CAGE;
use crate::spatial::V2;

fn corner(p: V3c<f32>) -> ProjectedVertex {
    ProjectedVertex::new(p, V2::new(p.x, p.y))
}

fn unit_corners() -> [ProjectedVertex; 8] {
    std::array::from_fn(|i| corner(UNIT_CAGE[i]))
}

#[test]
fn test_affine_cage_never_forces_subdivision_on_distortion_alone() {
    let corners = unit_corners();
    let (_, distortion) = CageToMatrix::extract(&corners);
    let decision = SubdivisionDecider::evaluate(
        /* is_cube */ false,
        /* is_leaf */ true,
        /* is_too_close */ false,
        /* is_too_big */ false,
        /* is_distorted */ distortion > 1e-6,
    );
    assert_eq!(decision, Decision::Render);
}

#[test]
fn test_distorted_cage_subdivides_then_converges() {
    let mut corners = unit_corners();
    corners[7] = corner(V3c::new(1.6, 1.0, 1.0));

    let mut max_depth_distortion = 0.0f32;
    CageSubdivider::subdivide(&corners, 0, &0u32, None, &mut |state: &SubdivisionState<u32>| {
        let child = state.child_cage();
        let (_, distortion) = CageToMatrix::extract(&child);
        if state.level == 2 {
            max_depth_distortion = max_depth_distortion.max(distortion);
            return (0u8, 0u32);
        }
        let decision = SubdivisionDecider::evaluate(false, false, false, false, distortion > 1e-4);
        match decision {
            Decision::Subdivide => (1u8, 0u32),
            _ => (0u8, 0u32),
        }
    });

    // Subdividing a distorted cage shrinks each child's share of the
    // distortion -- by level 2 it should be well below the original.
    let (_, root_distortion) = CageToMatrix::extract(&corners);
    assert!(max_depth_distortion < root_distortion);
}

#[test]
fn test_decision_sequence_matches_spec_priority_order() {
    // too_close beats everything else, even when every other flag says render.
    assert_eq!(
        SubdivisionDecider::evaluate(true, true, true, true, true),
        Decision::Cull
    );
}
