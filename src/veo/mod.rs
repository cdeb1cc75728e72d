pub mod api;
pub mod convert;
pub mod messages;
pub mod worker;

pub use api::*;
pub use convert::*;
pub use messages::*;
pub use worker::*;
