mod api;
mod capability;
mod control;
mod error;
mod logger;
mod poll;
mod types;

pub use api::{DEFAULT_BASE_URL, RemoClient, RemoClientBuilder};
pub use capability::{CapabilityModel, ModeCapability, normalize};
pub use control::AcController;
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use poll::{Coordinator, CoordinatorBuilder, DEFAULT_POLL_INTERVAL};
pub use types::*;
