//! The cascade core: per-node cache slots, the coordinating service, and the
//! snapshots it publishes to the surface.

pub mod service;
pub mod slot;
pub mod snapshot;


pub use service::ExplorerService;
pub use snapshot::{
    ExplorerSnapshot, MockSnapshotSink, NoOpSnapshotSink, NodePhase, NodeSnapshot, SnapshotSink,
};
