pub mod set;
pub mod store;
pub mod loader;
pub mod refresh;

pub use set::*;
pub use store::*;
pub use loader::*;
pub use refresh::*;
