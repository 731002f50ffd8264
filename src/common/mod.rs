pub mod color;
pub mod geometry;
pub mod random;
pub mod scene;
