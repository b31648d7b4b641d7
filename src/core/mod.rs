pub mod color;
pub mod geometry;
pub mod model;
pub mod policy;
