pub mod flags;
pub mod model;
mod persist;
pub mod store;

pub use flags::{FeatureFlags, StatusSummary};
pub use model::Feature;
pub use store::ConfigStore;
