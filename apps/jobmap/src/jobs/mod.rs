pub mod filters;
pub mod handlers;

pub use filters::{distinct_locations, JobFilter, JobQuery};
