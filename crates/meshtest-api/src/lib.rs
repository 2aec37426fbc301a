//! Meshtest configuration values.
//!
//! These types describe everything a test run consumes as configuration: the
//! scope it provisions into, the workloads it deploys, and the matrix of
//! bootstrap-generator versions it exercises. Every type validates its input
//! at construction time so that the driver in `meshtest-core` never has to
//! re-check a namespace name or an image reference mid-run.
//!
//! All of these values are immutable once built. Testing a different
//! bootstrap image means building a new [ClientConfig], not mutating a shared
//! one - see [ClientConfig::for_bootstrap_image].

mod error;
pub use error::Error;

mod name;
pub use name::Name;

mod image;
pub use image::{ImageRef, MatrixEntry, VersionMatrix};

mod address;
pub use address::XdsAddress;

mod config;
pub use config::{ClientConfig, ServerConfig, TestScope};
