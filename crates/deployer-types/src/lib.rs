//! Common types module for the Delance deployer.
//!
//! This module defines the data types shared between the artifact store, the
//! delivery layer and the deployment orchestrator. Keeping them in one crate
//! lets each collaborator depend on the handle and result types without
//! depending on one another.

/// Compiled contract handles produced by the artifact store.
pub mod artifact;
/// Deployment outcome and lifecycle types.
pub mod deployment;
/// Secure string type for handling sensitive data.
pub mod secret_string;
/// Utility functions for hex formatting.
pub mod utils;

pub use artifact::{ContractFactory, EncodingError};
pub use deployment::{DeploymentResult, DeploymentState};
pub use secret_string::SecretString;
pub use utils::without_0x_prefix;

/// Contract name deployed when neither configuration nor CLI selects another.
pub const DEFAULT_CONTRACT_NAME: &str = "Delance";
