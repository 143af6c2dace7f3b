//! Rate limiting logic and state management.

mod bucket;
mod reclaimer;
mod registry;

pub use bucket::TokenBucket;
pub use reclaimer::Reclaimer;
pub use registry::ClientRegistry;
