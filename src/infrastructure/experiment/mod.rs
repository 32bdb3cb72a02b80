//! Experiment infrastructure implementations

mod broadcast;
mod name_lock;
mod sampler;
mod storage_store;

pub use broadcast::{BroadcastObserver, DEFAULT_EVENT_CAPACITY};
pub use name_lock::{NameGuard, NameLocks};
pub use sampler::WeightedSampler;
pub use storage_store::StorageAssignmentStore;
