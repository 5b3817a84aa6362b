pub mod creators;
pub mod db;
pub mod models;
pub mod query_cache;
pub mod schema;
pub mod sessions;

mod error;

pub use error::{Error, Result};
