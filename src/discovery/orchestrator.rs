//! Discovery orchestrator
//!
//! Fans out one task per [`Category`], collects each task's outcome, and
//! assembles the [`Snapshot`] in a single consolidating step once every task
//! has finished. The first fatal failure cancels all other tasks.

use super::client::{CancelSignal, ResourceClient, TaskError, TaskResult};
use super::policy::{Category, FailurePolicy};
use super::tasks;
use super::types::{
    AvailabilityDomain, BlockVolume, Compartment, Image, ServiceLimit, Shape, Snapshot, Tenancy,
    Vcn,
};
use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Where discovery is rooted
#[derive(Debug, Clone)]
pub struct Scope {
    pub tenancy_id: String,
    pub region: String,
}

impl Scope {
    pub fn new(tenancy_id: &str, region: &str) -> Self {
        Self {
            tenancy_id: tenancy_id.to_string(),
            region: region.to_string(),
        }
    }
}

/// Value produced by one successful task
#[derive(Debug)]
pub enum Discovered {
    Tenancy(Tenancy),
    Compartments(Vec<Compartment>),
    AvailabilityDomains(Vec<AvailabilityDomain>),
    Shapes(Vec<Shape>),
    Images(Vec<Image>),
    Vcns(Vec<Vcn>),
    BlockVolumes(Vec<BlockVolume>),
    ServiceLimits(Vec<ServiceLimit>),
}

impl Discovered {
    fn len(&self) -> usize {
        match self {
            Self::Tenancy(_) => 1,
            Self::Compartments(v) => v.len(),
            Self::AvailabilityDomains(v) => v.len(),
            Self::Shapes(v) => v.len(),
            Self::Images(v) => v.len(),
            Self::Vcns(v) => v.len(),
            Self::BlockVolumes(v) => v.len(),
            Self::ServiceLimits(v) => v.len(),
        }
    }
}

/// Run the discovery task for one category
async fn discover(
    category: Category,
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Discovered> {
    Ok(match category {
        Category::Tenancy => {
            Discovered::Tenancy(tasks::discover_tenancy(client, cancel, tenancy_id).await?)
        }
        Category::Compartments => Discovered::Compartments(
            tasks::discover_compartments(client, cancel, tenancy_id).await?,
        ),
        Category::AvailabilityDomains => Discovered::AvailabilityDomains(
            tasks::discover_availability_domains(client, cancel, tenancy_id).await?,
        ),
        Category::Shapes => {
            Discovered::Shapes(tasks::discover_shapes(client, cancel, tenancy_id).await?)
        }
        Category::Images => {
            Discovered::Images(tasks::discover_images(client, cancel, tenancy_id).await?)
        }
        Category::Vcns => Discovered::Vcns(tasks::discover_vcns(client, cancel, tenancy_id).await?),
        Category::BlockVolumes => Discovered::BlockVolumes(
            tasks::discover_block_volumes(client, cancel, tenancy_id).await?,
        ),
        Category::ServiceLimits => {
            Discovered::ServiceLimits(tasks::discover_limits(client, cancel, tenancy_id).await?)
        }
    })
}

/// Discover everything under `scope`.
///
/// Tolerable failures are logged and leave their field empty. The first fatal
/// failure is returned as [`Error::FatalDiscovery`] after every other task
/// has observed the cancellation and stopped.
pub async fn run(client: Arc<dyn ResourceClient>, scope: &Scope) -> Result<Snapshot> {
    tracing::info!("Discovering resources...");

    let (trigger, cancel) = CancelSignal::channel();
    let mut set = JoinSet::new();

    for category in Category::ALL {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        let tenancy_id = scope.tenancy_id.clone();

        set.spawn(async move {
            tracing::info!("  → {}", category.display_name());
            let outcome = discover(category, client.as_ref(), &cancel, &tenancy_id).await;
            (category, outcome)
        });
    }

    let mut collected = Vec::with_capacity(Category::ALL.len());
    let mut fatal: Option<Error> = None;

    while let Some(joined) = set.join_next().await {
        let (category, outcome) = match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => continue,
        };

        match outcome {
            Ok(value) => {
                tracing::debug!("{} discovered: {} item(s)", category, value.len());
                collected.push(value);
            }
            Err(TaskError::Cancelled) => {
                tracing::debug!("{} discovery cancelled", category);
            }
            Err(TaskError::Remote(source)) => match category.policy() {
                FailurePolicy::Fatal => {
                    if fatal.is_none() {
                        tracing::error!("{} discovery failed: {:#}", category, source);
                        trigger.send_replace(true);
                        fatal = Some(Error::FatalDiscovery { category, source });
                    }
                }
                FailurePolicy::Tolerable => {
                    let warning = Error::TolerableDiscovery { category, source };
                    tracing::warn!("⚠ {}", warning);
                }
            },
        }
    }

    if let Some(err) = fatal {
        return Err(err);
    }

    Ok(consolidate(scope, collected))
}

/// Assemble the snapshot from task outputs, one whole field at a time
pub fn consolidate(scope: &Scope, collected: Vec<Discovered>) -> Snapshot {
    let mut snapshot = Snapshot {
        tenancy: Tenancy::from_id(&scope.tenancy_id),
        ..Snapshot::default()
    };

    for value in collected {
        match value {
            Discovered::Tenancy(tenancy) => snapshot.tenancy = tenancy,
            Discovered::Compartments(v) => snapshot.compartments = v,
            Discovered::AvailabilityDomains(v) => snapshot.availability_domains = v,
            Discovered::Shapes(v) => snapshot.shapes = v,
            Discovered::Images(v) => snapshot.images = v,
            Discovered::Vcns(v) => snapshot.vcns = v,
            Discovered::BlockVolumes(v) => snapshot.block_volumes = v,
            Discovered::ServiceLimits(v) => snapshot.limits = v,
        }
    }

    // The provider block targets the region we ran against
    snapshot.tenancy.home_region = scope.region.clone();
    snapshot
}
