//! Synchronization engine for the observation explorer.
//!
//! Keeps the station store, the marker layers and the filter fields
//! consistent with the explorer snapshots reported by the server. The engine
//! performs no I/O: `ExplorerSession` turns user intents into `Command`s and
//! takes the results back as `Completion`s.

pub mod bus;
pub mod config;
pub mod coordinator;
pub mod edit;
pub mod field;
pub mod geo;
pub mod layer;
pub mod map_sync;
pub mod session;
pub mod station;

pub use bus::{EventBus, Intent};
pub use config::ExplorerConfig;
pub use coordinator::{FilterCoordinator, SubmitTicket};
pub use edit::{EditOutcome, EditRecord, EditState, EditTarget, InlineEdit};
pub use field::{FieldKind, FieldView, FilterField, Pending};
pub use geo::{GeoBounds, LatLon};
pub use layer::{ClusterIcon, LayerOp, MarkerIcon, MarkerId, MarkerLayer, RecordingLayer};
pub use map_sync::{MapSyncController, SyncAction};
pub use session::{drive, execute, Command, Completion, ExplorerSession, Replaced};
pub use station::{Reconciliation, Station, StationKey, StationStore, StoreConfig, Tracking};
