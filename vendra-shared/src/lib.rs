pub mod address;
pub mod models;
pub mod pii;

pub use address::Address;
