//! oci-tf-bootstrap
//!
//! Discovers what already exists in an Oracle Cloud Infrastructure tenancy and
//! writes Terraform declarations that reference it.
//!
//! # Module Structure
//!
//! - [`config`] - OCI CLI config file and profile resolution
//! - [`discovery`] - Concurrent tenancy discovery into a [`discovery::Snapshot`]
//! - [`oci`] - Signed REST client for the OCI APIs
//! - [`render`] - Terraform and snapshot output
//! - [`error`] - Error taxonomy surfaced to the binary

pub mod config;
pub mod discovery;
pub mod error;
pub mod oci;
pub mod render;

pub use error::{Error, Result};
