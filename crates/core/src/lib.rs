pub mod catalog;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mount;
pub mod pipeline;

pub use catalog::{CATALOG, CatalogEntry};
pub use config::Config;
pub use error::{ConfigError, Result, ServerError};
pub use lifecycle::{EventLoop, Lifecycle, ProcessState, SignalClass};
pub use mount::{MountPoints, MountRegistration, TransportMode};
pub use pipeline::Codec;
