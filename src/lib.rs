pub mod catalog;
pub mod config;
pub mod criteria;
pub mod engine;
pub mod model;
pub mod notify;
pub mod observability;
pub mod scenario;
