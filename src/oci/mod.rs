//! OCI API interaction module
//!
//! This module provides the core functionality for talking to Oracle Cloud
//! Infrastructure REST APIs: request signing, the HTTP client and the
//! [`ResourceClient`](crate::discovery::ResourceClient) implementation used by
//! discovery.
//!
//! # Module Structure
//!
//! - [`auth`] - API-key request signing
//! - [`client`] - Main OCI client and service endpoints
//! - [`http`] - Signed HTTP requests and error formatting
//! - [`models`] - Conversion of OCI JSON into snapshot types
//!
//! # Example
//!
//! ```ignore
//! use oci_tf_bootstrap::oci::{auth::OciCredentials, client::OciClient};
//!
//! fn example(pem: &str) -> anyhow::Result<OciClient> {
//!     let creds = OciCredentials::from_pem("ocid1.tenancy...", "ocid1.user...", "aa:bb", pem)?;
//!     OciClient::new(creds, "us-ashburn-1")
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod models;

pub use client::{Endpoints, OciClient};
pub use http::format_oci_error;
