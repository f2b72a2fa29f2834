use thiserror::Error;

/// Error types for skeleton and clip construction
///
/// These surface structural invariant violations at build/load time.
/// Steady-state per-frame calls (sampling, blending, skinning, solving)
/// never return errors; degenerate numeric input is handled locally with
/// well-defined fallbacks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimError {
    /// Parent and local-transform arrays of a pose disagree in length
    #[error("mismatched pose arrays: {parents} parent indices, {locals} local transforms")]
    MismatchedArrayLengths { parents: usize, locals: usize },

    /// Rest pose, bind pose, and joint names disagree in joint count
    #[error(
        "mismatched joint counts: rest pose has {rest}, bind pose has {bind}, names has {names}"
    )]
    MismatchedJointCounts {
        rest: usize,
        bind: usize,
        names: usize,
    },

    /// A joint references a parent index outside the joint array
    #[error("joint {joint}: parent index {parent} out of range for {joint_count} joints")]
    ParentOutOfRange {
        joint: usize,
        parent: i32,
        joint_count: usize,
    },

    /// The parent graph contains a cycle reachable from the given joint
    #[error("cyclic parent chain detected at joint {joint}")]
    CyclicHierarchy { joint: usize },

    /// An animation track targets a joint index outside the skeleton
    #[error("joint index {joint} out of range for {joint_count} joints")]
    JointOutOfRange { joint: usize, joint_count: usize },
}

/// Result type using AnimError
pub type Result<T> = std::result::Result<T, AnimError>;
