//! Per-category discovery
//!
//! One function per top-level category. Each drains its listings through the
//! [`ResourceClient`], observes the run's [`CancelSignal`] at every remote
//! call, and absorbs the failures that only degrade its own result.

use super::client::{drain, CancelSignal, ResourceClient, TaskError, TaskResult};
use super::types::{
    AvailabilityDomain, BlockVolume, Compartment, Image, ServiceLimit, Shape, Tenancy, Vcn,
};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};

/// OS families queried for platform images, in output order
pub const IMAGE_OS_FAMILIES: [&str; 4] = ["Oracle Linux", "Canonical Ubuntu", "CentOS", "Windows"];

/// Limits services whose quotas are reported
pub const LIMIT_SERVICES: [&str; 2] = ["compute", "compute-core"];

/// Turn a remote failure into `None` with a warning. Cancellation is never
/// absorbed.
fn tolerate<T>(result: TaskResult<T>, what: &str, owner: &str) -> TaskResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TaskError::Cancelled) => Err(TaskError::Cancelled),
        Err(TaskError::Remote(err)) => {
            tracing::warn!("Could not list {} for {}: {:#}", what, owner, err);
            Ok(None)
        }
    }
}

/// Tenancy metadata. A failing lookup falls back to the bare OCID.
pub async fn discover_tenancy(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Tenancy> {
    let lookup = cancel.guard(client.get_tenancy(tenancy_id)).await;
    Ok(tolerate(lookup, "tenancy details", tenancy_id)?
        .unwrap_or_else(|| Tenancy::from_id(tenancy_id)))
}

/// Active compartments in the whole tenancy subtree, with paths resolved
pub async fn discover_compartments(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Vec<Compartment>> {
    let mut compartments = drain(cancel, |page| client.list_compartments(tenancy_id, page)).await?;
    assign_paths(&mut compartments);
    Ok(compartments)
}

/// Fill `path` from the parent chain. Parents outside the list (the tenancy
/// root) end the chain; the walk is bounded so a malformed tree cannot loop.
pub fn assign_paths(compartments: &mut [Compartment]) {
    let by_id: HashMap<String, (String, String)> = compartments
        .iter()
        .map(|c| (c.id.clone(), (c.name.clone(), c.parent_id.clone())))
        .collect();

    for compartment in compartments.iter_mut() {
        let mut segments = vec![compartment.name.clone()];
        let mut parent = compartment.parent_id.as_str();

        while let Some((name, grandparent)) = by_id.get(parent) {
            if segments.len() > by_id.len() {
                break;
            }
            segments.push(name.clone());
            parent = grandparent.as_str();
        }

        segments.reverse();
        compartment.path = segments.join("/");
    }
}

/// Availability domains and their fault domains
pub async fn discover_availability_domains(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Vec<AvailabilityDomain>> {
    let domains = cancel
        .guard(client.list_availability_domains(tenancy_id))
        .await?;

    let mut discovered = Vec::with_capacity(domains.len());
    for mut ad in domains {
        let faults = cancel
            .guard(client.list_fault_domains(tenancy_id, &ad.name))
            .await;
        if let Some(fault_domains) = tolerate(faults, "fault domains", &ad.name)? {
            ad.fault_domains = fault_domains;
        }
        discovered.push(ad);
    }
    Ok(discovered)
}

/// Compute shapes, deduplicated by name across pages
pub async fn discover_shapes(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Vec<Shape>> {
    let shapes = drain(cancel, |page| client.list_shapes(tenancy_id, page)).await?;

    let mut seen = HashSet::new();
    Ok(shapes
        .into_iter()
        .filter(|shape| seen.insert(shape.name.clone()))
        .collect())
}

/// Platform images for every OS family.
///
/// Families are listed independently; a failing family is skipped and the
/// others still contribute. Within a family only the newest image per OS
/// version is kept.
pub async fn discover_images(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Vec<Image>> {
    let listings = join_all(IMAGE_OS_FAMILIES.iter().map(|family| async move {
        let listing = drain(cancel, |page| client.list_images(tenancy_id, family, page)).await;
        (*family, listing)
    }))
    .await;

    let mut images = Vec::new();
    for (family, listing) in listings {
        let Some(family_images) = tolerate(listing, "images", family)? else {
            continue;
        };
        images.extend(newest_per_version(family_images));
    }
    Ok(images)
}

/// Keep the first image per `(OS, version)`; listings arrive newest first
pub fn newest_per_version(images: Vec<Image>) -> Vec<Image> {
    let mut seen = HashSet::new();
    images
        .into_iter()
        .filter(|image| {
            let (os, version) = image.key();
            seen.insert((os.to_string(), version.to_string()))
        })
        .collect()
}

/// VCNs with their subnets, security lists, route tables and gateways.
///
/// Sub-resources are listed sequentially per VCN. A failing sub-listing
/// leaves that one sub-resource empty on that one VCN.
pub async fn discover_vcns(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Vec<Vcn>> {
    let vcns = drain(cancel, |page| client.list_vcns(tenancy_id, page)).await?;

    let mut discovered = Vec::with_capacity(vcns.len());
    for vcn in vcns {
        discovered.push(populate_vcn(client, cancel, vcn).await?);
    }
    Ok(discovered)
}

async fn populate_vcn(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    mut vcn: Vcn,
) -> TaskResult<Vcn> {
    let compartment_id = vcn.compartment_id.clone();
    let vcn_id = vcn.id.clone();
    let label = if vcn.display_name.is_empty() {
        vcn.id.clone()
    } else {
        vcn.display_name.clone()
    };

    let subnets = drain(cancel, |page| client.list_subnets(&compartment_id, &vcn_id, page)).await;
    if let Some(subnets) = tolerate(subnets, "subnets", &label)? {
        vcn.subnets = subnets;
    }

    let security_lists = drain(cancel, |page| {
        client.list_security_lists(&compartment_id, &vcn_id, page)
    })
    .await;
    if let Some(security_lists) = tolerate(security_lists, "security lists", &label)? {
        vcn.security_lists = security_lists;
    }

    let route_tables = drain(cancel, |page| {
        client.list_route_tables(&compartment_id, &vcn_id, page)
    })
    .await;
    if let Some(route_tables) = tolerate(route_tables, "route tables", &label)? {
        vcn.route_tables = route_tables;
    }

    let gateways = cancel
        .guard(client.list_internet_gateways(&compartment_id, &vcn_id))
        .await;
    if let Some(gateways) = tolerate(gateways, "internet gateway", &label)? {
        vcn.internet_gateway = gateways.into_iter().next();
    }

    let nat_gateways = cancel
        .guard(client.list_nat_gateways(&compartment_id, &vcn_id))
        .await;
    if let Some(nat_gateways) = tolerate(nat_gateways, "NAT gateway", &label)? {
        vcn.nat_gateway = nat_gateways.into_iter().next();
    }

    Ok(vcn)
}

pub async fn discover_block_volumes(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Vec<BlockVolume>> {
    drain(cancel, |page| client.list_volumes(tenancy_id, page)).await
}

/// Non-zero compute quotas. A failing service is skipped.
pub async fn discover_limits(
    client: &dyn ResourceClient,
    cancel: &CancelSignal,
    tenancy_id: &str,
) -> TaskResult<Vec<ServiceLimit>> {
    let mut limits = Vec::new();

    for service in LIMIT_SERVICES {
        let listing = drain(cancel, |page| client.list_limit_values(tenancy_id, service, page)).await;
        let Some(values) = tolerate(listing, "limits", service)? else {
            continue;
        };
        limits.extend(values.into_iter().filter(|limit| limit.value != 0));
    }

    Ok(limits)
}
