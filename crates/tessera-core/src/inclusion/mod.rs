pub mod data;
pub mod merkle;

pub use data::*;
pub use merkle::*;
