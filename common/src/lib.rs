pub mod chart;
pub mod error;
pub mod filter;
pub mod models;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
