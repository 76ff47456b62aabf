//! Outlyer sync engine
//!
//! Maps local resource files to their API identity and keeps the two in
//! sync:
//! - [`resource`]: kinds, identities and path classification
//! - [`codec`]: local ⇄ wire payloads (plugin envelopes, check field names)
//! - [`resolver`]: apply paths and export selectors
//! - [`sync`]: concurrent apply/export producing a [`Report`]

pub mod codec;
pub mod error;
pub mod fakes;
pub mod report;
pub mod resolver;
pub mod resource;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use codec::{decode, encode, PluginEnvelope, CHECK_FIELD_MAPPING, PLUGIN_ENCODING};
pub use error::{
    ClassificationError, CodecError, ResolveError, Result, StoreError, SyncError,
};
pub use report::{Outcome, Report, ResourceRecord};
pub use resolver::{output_folder, resolve_paths, resolve_selectors, ExportSelector};
pub use resource::{ResourceKind, ResourceRef};
pub use store::{FileStore, LocalFileStore};
pub use sync::SyncOrchestrator;
pub use telemetry::init_tracing;
