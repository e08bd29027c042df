//! Resource client abstraction
//!
//! Discovery only ever talks to the provider through [`ResourceClient`]. The
//! production implementation lives in [`crate::oci`]; tests substitute an
//! in-memory one.

use super::types::{
    AvailabilityDomain, BlockVolume, Compartment, Image, InternetGateway, NatGateway,
    RouteTable, SecurityList, ServiceLimit, Shape, Subnet, Tenancy, Vcn,
};
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use tokio::sync::watch;

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` means this was the last page
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_page: impl Into<String>) -> Self {
        Self {
            items,
            next_page: Some(next_page.into()),
        }
    }
}

/// Authenticated read access to a tenancy.
///
/// `scope` is the compartment OCID a listing is rooted at (the tenancy for
/// every top-level listing). Paginated listings take the continuation token
/// returned by the previous page.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn get_tenancy(&self, tenancy_id: &str) -> Result<Tenancy>;

    async fn list_compartments(&self, scope: &str, page: Option<String>)
        -> Result<Page<Compartment>>;

    /// Returned domains have no fault domains filled in yet
    async fn list_availability_domains(&self, scope: &str) -> Result<Vec<AvailabilityDomain>>;

    async fn list_fault_domains(&self, scope: &str, availability_domain: &str)
        -> Result<Vec<String>>;

    async fn list_shapes(&self, scope: &str, page: Option<String>) -> Result<Page<Shape>>;

    /// Images of one OS family, newest first
    async fn list_images(
        &self,
        scope: &str,
        operating_system: &str,
        page: Option<String>,
    ) -> Result<Page<Image>>;

    /// Returned VCNs have no nested resources filled in yet
    async fn list_vcns(&self, scope: &str, page: Option<String>) -> Result<Page<Vcn>>;

    async fn list_subnets(
        &self,
        compartment_id: &str,
        vcn_id: &str,
        page: Option<String>,
    ) -> Result<Page<Subnet>>;

    async fn list_security_lists(
        &self,
        compartment_id: &str,
        vcn_id: &str,
        page: Option<String>,
    ) -> Result<Page<SecurityList>>;

    async fn list_route_tables(
        &self,
        compartment_id: &str,
        vcn_id: &str,
        page: Option<String>,
    ) -> Result<Page<RouteTable>>;

    async fn list_internet_gateways(
        &self,
        compartment_id: &str,
        vcn_id: &str,
    ) -> Result<Vec<InternetGateway>>;

    async fn list_nat_gateways(&self, compartment_id: &str, vcn_id: &str)
        -> Result<Vec<NatGateway>>;

    async fn list_volumes(&self, scope: &str, page: Option<String>) -> Result<Page<BlockVolume>>;

    async fn list_limit_values(
        &self,
        scope: &str,
        service: &str,
        page: Option<String>,
    ) -> Result<Page<ServiceLimit>>;
}

/// Why a discovery task stopped without a value
#[derive(Debug)]
pub enum TaskError {
    /// The run was aborted by another task's fatal failure
    Cancelled,
    Remote(anyhow::Error),
}

impl TaskError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Remote(err)
    }
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Cooperative cancellation signal shared by every task of one run
#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create the trigger side and the signal handed to tasks
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the
    /// trigger is dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run one remote call unless the run is cancelled first
    pub async fn guard<T, F>(&self, call: F) -> TaskResult<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(TaskError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(TaskError::Cancelled),
            result = call => result.map_err(TaskError::Remote),
        }
    }
}

/// Fetch all pages of a listing (auto-paginate)
///
/// Every page request is a cancellation point. A failure on any page fails
/// the whole listing: partial results are never returned.
pub async fn drain<T, F, Fut>(cancel: &CancelSignal, mut fetch: F) -> TaskResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = cancel.guard(fetch(page_token.take())).await?;
        all_items.extend(page.items);

        match page.next_page {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(all_items)
}
