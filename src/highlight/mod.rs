pub mod matcher;
pub mod pass;

pub use matcher::*;
pub use pass::*;
