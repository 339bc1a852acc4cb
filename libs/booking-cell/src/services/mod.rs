pub mod engine;
pub mod lifecycle;
pub mod notify;
pub mod store;

pub use engine::*;
pub use lifecycle::*;
pub use notify::*;
pub use store::*;
