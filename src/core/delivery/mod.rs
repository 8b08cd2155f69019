//! Delivery Orchestrator: per-platform contracts, a
//! sequential validate/process/upload pipeline, and the upload boundary.

pub mod orchestrator;
pub mod platforms;
pub mod upload;

pub use orchestrator::DeliveryOrchestrator;
pub use platforms::{PlatformContract, PlatformTable};
pub use upload::{PlatformUploader, SimulatedUploader, UploadReceipt};
