//! External collaborators: page rendering and AI classification.

pub mod ai;
pub mod render;
