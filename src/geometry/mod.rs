//! Geometry utilities: world-space composition and convention conversion.

pub mod transforms;

pub use transforms::{
    camera_to_world, marker_world_pose, rotation_from_rodrigues, to_render_convention,
};
