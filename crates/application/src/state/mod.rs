mod persister;
mod store;

pub use persister::SnapshotPersister;
pub use store::StateStore;
