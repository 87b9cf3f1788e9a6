pub mod access;
pub mod api;
pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod notify;
pub mod rules;
pub mod service;
pub mod wiki;

pub use access::{Actor, Capability, Role};
pub use error::ServiceError;
pub use service::Context;
