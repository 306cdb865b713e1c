pub mod retrieval;
pub mod schema;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use retrieval::{rank_by_weight, recall_strongest, top_memories};
pub use schema::{Memory, MemorySource, UserProfile};
pub use seed::seed_from_profile;
pub use snapshot::AgentSnapshot;
pub use store::MemoryStore;
