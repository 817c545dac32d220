pub mod address;
pub mod deployment;
pub mod integration;
pub mod operation;
pub mod query;
pub mod status;
pub mod step;

pub use address::*;
pub use deployment::*;
pub use integration::*;
pub use operation::*;
pub use query::*;
pub use status::*;
pub use step::*;

/// Strkey length for account and contract addresses
pub const ADDRESS_LEN: usize = 56;
