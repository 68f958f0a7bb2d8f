pub mod error;
pub mod frost;
pub mod yr;
