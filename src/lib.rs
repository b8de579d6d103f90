//! Check whether a Hugging Face model is supported by optimum-intel[openvino].
//!
//! The supported architectures come from a [`snapshot::CompatibilitySnapshot`]:
//! either the table vendored with this crate or one scanned from a local
//! optimum-intel checkout by [`ingest`]. [`classifier::ModelSupportChecker`]
//! combines it with the model's hub metadata.

pub mod classifier;
pub mod config;
pub mod hub;
pub mod ingest;
pub mod logging;
#[cfg(feature = "python")]
mod python;
pub mod server;
pub mod snapshot;
pub mod sync;
pub mod version;

pub use classifier::{CheckError, Classification, ModelSupportChecker, SupportStatus};
pub use config::{CheckerConfig, ServerConfig, SnapshotSource};
pub use hub::{HttpHub, HubConfig, HubError, ModelHub, ModelInfo};
pub use snapshot::CompatibilitySnapshot;
