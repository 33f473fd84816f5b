pub mod host;
pub mod coordinator;
pub mod tooltip;
pub mod annotator;
pub mod driver;

pub use host::*;
pub use coordinator::*;
pub use tooltip::*;
pub use annotator::*;
pub use driver::*;

#[cfg(test)]
mod tests;
