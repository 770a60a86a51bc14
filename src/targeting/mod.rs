pub mod client;
pub mod endpoint;
pub mod enricher;
pub mod metadata;
pub mod segments;

pub use enricher::{ContentTargeting, Enricher};
