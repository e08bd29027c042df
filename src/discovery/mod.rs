//! Tenancy discovery
//!
//! Builds a [`Snapshot`] of everything Terraform generation needs to know
//! about a tenancy.
//!
//! # Module Structure
//!
//! - [`types`] - Snapshot data model
//! - [`client`] - The [`ResourceClient`] capability, pagination and cancellation
//! - [`policy`] - Discovery categories and whether their failure is fatal
//! - [`tasks`] - One discovery routine per category
//! - [`orchestrator`] - Concurrent fan-out and consolidation into a snapshot
//! - [`always_free`] - Narrowing a snapshot to the always-free tier
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oci_tf_bootstrap::discovery::{self, Scope};
//!
//! async fn example(client: Arc<dyn discovery::ResourceClient>) -> anyhow::Result<()> {
//!     let scope = Scope::new("ocid1.tenancy.oc1..example", "us-ashburn-1");
//!     let snapshot = discovery::run(client, &scope).await?;
//!     println!("{} shapes", snapshot.shapes.len());
//!     Ok(())
//! }
//! ```

pub mod always_free;
pub mod client;
pub mod orchestrator;
pub mod policy;
pub mod tasks;
pub mod types;

pub use client::{CancelSignal, Page, ResourceClient, TaskError, TaskResult};
pub use orchestrator::{run, Scope};
pub use policy::{Category, FailurePolicy, CATEGORY_POLICY};
pub use types::*;
