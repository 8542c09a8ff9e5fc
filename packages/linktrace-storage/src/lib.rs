pub mod db;
pub mod models;
pub mod queries;
pub mod retry;
pub mod session;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
