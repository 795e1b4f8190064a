/// Splat footprint. `Cube` writes three visible quads per cube face and is
/// used to debug orientation; every other variant writes a single 2D
/// footprint per leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Point,
    Rectangle,
    Square,
    Circle,
    Cube,
}

/// The outcome of [`SubdivisionDecider::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Cull,
    Subdivide,
    Render,
}

/// Pure predicate collapsing the 5 boolean inputs to a decision. No state,
/// no side effects -- a plain function, matching the teacher's preference
/// for free predicates over trait objects at decision points that don't
/// need dynamic dispatch.
pub struct SubdivisionDecider;

impl SubdivisionDecider {
    pub fn evaluate(
        is_cube: bool,
        is_leaf: bool,
        is_too_close: bool,
        is_too_big: bool,
        is_distorted: bool,
    ) -> Decision {
        if is_too_close {
            return if is_leaf { Decision::Cull } else { Decision::Subdivide };
        }
        if is_too_big {
            return Decision::Subdivide;
        }
        if is_distorted && (is_cube || !is_leaf) {
            return Decision::Subdivide;
        }
        Decision::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exhaustive truth table over all 32 boolean combinations, matching
    /// §4.4 literally: `IsTooClose` always wins first, then `IsTooBig`,
    /// then the `IsDistorted` + (`IsCube` or not `IsLeaf`) conjunction,
    /// else `Render`.
    #[test]
    fn test_truth_table_exhaustive() {
        for bits in 0u8..32 {
            let is_cube = bits & 1 != 0;
            let is_leaf = bits & 2 != 0;
            let is_too_close = bits & 4 != 0;
            let is_too_big = bits & 8 != 0;
            let is_distorted = bits & 16 != 0;

            let expected = if is_too_close {
                if is_leaf { Decision::Cull } else { Decision::Subdivide }
            } else if is_too_big {
                Decision::Subdivide
            } else if is_distorted && (is_cube || !is_leaf) {
                Decision::Subdivide
            } else {
                Decision::Render
            };

            assert_eq!(
                SubdivisionDecider::evaluate(is_cube, is_leaf, is_too_close, is_too_big, is_distorted),
                expected,
                "mismatch for bits={bits:#07b}"
            );
        }
    }

    #[test]
    fn test_too_close_leaf_culls() {
        assert_eq!(
            SubdivisionDecider::evaluate(false, true, true, false, false),
            Decision::Cull
        );
    }

    #[test]
    fn test_too_close_non_leaf_subdivides() {
        assert_eq!(
            SubdivisionDecider::evaluate(false, false, true, false, false),
            Decision::Subdivide
        );
    }

    #[test]
    fn test_distorted_leaf_non_cube_renders() {
        // distortion only forces subdivision on a leaf when shape == Cube
        assert_eq!(
            SubdivisionDecider::evaluate(false, true, false, false, true),
            Decision::Render
        );
    }
}
