pub mod gateway;
pub mod signature;

pub use gateway::*;
