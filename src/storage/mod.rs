//! Block persistence: binary codec and the append-only file store

pub mod block;
pub mod store;

pub use block::{Block, BlockHeader, BlockLayout, BlockShape, Vector, HEADER_SIZE};
pub use store::{PersistentStore, StoreConfig};
