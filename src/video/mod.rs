pub mod frame;
pub mod processor;
pub mod store;

pub use frame::*;
pub use processor::*;
pub use store::*;
