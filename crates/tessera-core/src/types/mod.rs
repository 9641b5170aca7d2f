pub mod bytes;
pub mod proof;
pub mod validators;

pub use bytes::*;
pub use proof::*;
pub use validators::*;
