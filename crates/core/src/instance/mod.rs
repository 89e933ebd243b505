//! Configured upstream instances and the secrets needed to reach them.
//!
//! The aggregator only reads from an [`InstanceDirectory`] and asks a
//! [`CredentialResolver`] for secrets; both are passed in explicitly.

mod credentials;
mod directory;
mod types;

pub use credentials::{mask_secret, ConfigCredentialResolver, CredentialError, CredentialResolver};
pub use directory::{ConfigInstanceDirectory, InstanceDirectory};
pub use types::*;
