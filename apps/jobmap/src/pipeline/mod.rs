pub mod refresh;
pub mod resolution;
pub mod store;

pub use refresh::Refresher;
pub use store::JobStore;
