//! Orchestrator tests against an in-memory resource client
//!
//! Exercises failure policy, cancellation and partial degradation without
//! any network.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use oci_tf_bootstrap::discovery::{
    self, AvailabilityDomain, BlockVolume, Category, Compartment, Image, InternetGateway,
    NatGateway, Page, ResourceClient, RouteTable, Scope, SecurityList, ServiceLimit, Shape,
    Subnet, Tenancy, Vcn,
};
use oci_tf_bootstrap::Error;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TENANCY: &str = "ocid1.tenancy.oc1..fake";

/// In-memory tenancy. Operations named in `failing` return an error
/// (after `failure_delay`), operations named in `hanging` never complete and
/// operations named in `endless` always report another page.
#[derive(Default)]
struct FakeClient {
    failing: HashSet<String>,
    hanging: HashSet<String>,
    endless: HashSet<String>,
    failure_delay: Duration,
    failed: AtomicBool,
    calls: AtomicUsize,
    calls_after_failure: AtomicUsize,
}

impl FakeClient {
    fn failing(ops: &[&str]) -> Self {
        Self {
            failing: ops.iter().map(|op| op.to_string()).collect(),
            ..Default::default()
        }
    }

    fn hanging(mut self, ops: &[&str]) -> Self {
        self.hanging = ops.iter().map(|op| op.to_string()).collect();
        self
    }

    fn endless(mut self, ops: &[&str], failure_delay: Duration) -> Self {
        self.endless = ops.iter().map(|op| op.to_string()).collect();
        self.failure_delay = failure_delay;
        self
    }

    async fn call(&self, op: &str) -> Result<()> {
        if self.failed.load(Ordering::SeqCst) {
            self.calls_after_failure.fetch_add(1, Ordering::SeqCst);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.contains(op) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(op) {
            tokio::time::sleep(self.failure_delay).await;
            self.failed.store(true, Ordering::SeqCst);
            return Err(anyhow!("API request failed: 500 Internal Server Error ({})", op));
        }
        if self.endless.contains(op) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok(())
    }
}

fn named<T: Default>(f: impl FnOnce(&mut T)) -> T {
    let mut value = T::default();
    f(&mut value);
    value
}

#[async_trait]
impl ResourceClient for FakeClient {
    async fn get_tenancy(&self, tenancy_id: &str) -> Result<Tenancy> {
        self.call("tenancy").await?;
        Ok(Tenancy {
            id: tenancy_id.to_string(),
            name: "fake".to_string(),
            home_region: "IAD".to_string(),
            description: String::new(),
        })
    }

    async fn list_compartments(&self, _scope: &str, page: Option<String>) -> Result<Page<Compartment>> {
        self.call("compartments").await?;
        Ok(match page.as_deref() {
            None => Page::with_next(
                vec![named(|c: &mut Compartment| {
                    c.id = "c-prod".into();
                    c.name = "prod".into();
                    c.parent_id = TENANCY.into();
                })],
                "c2",
            ),
            Some(_) => Page::last(vec![named(|c: &mut Compartment| {
                c.id = "c-app".into();
                c.name = "app".into();
                c.parent_id = "c-prod".into();
            })]),
        })
    }

    async fn list_availability_domains(&self, _scope: &str) -> Result<Vec<AvailabilityDomain>> {
        self.call("availability_domains").await?;
        Ok(vec![named(|ad: &mut AvailabilityDomain| {
            ad.name = "AD-1".into();
        })])
    }

    async fn list_fault_domains(&self, _scope: &str, _ad: &str) -> Result<Vec<String>> {
        self.call("fault_domains").await?;
        Ok(vec!["FAULT-DOMAIN-1".to_string(), "FAULT-DOMAIN-2".to_string()])
    }

    async fn list_shapes(&self, _scope: &str, page: Option<String>) -> Result<Page<Shape>> {
        self.call("shapes").await?;
        let shape = |name: &str| named(|s: &mut Shape| s.name = name.to_string());
        Ok(match page.as_deref() {
            None => Page::with_next(vec![shape("VM.Standard.A1.Flex")], "s2"),
            Some(_) => Page::last(vec![shape("VM.Standard.A1.Flex"), shape("VM.Standard.E4.Flex")]),
        })
    }

    async fn list_images(
        &self,
        _scope: &str,
        operating_system: &str,
        _page: Option<String>,
    ) -> Result<Page<Image>> {
        self.call(&format!("images:{}", operating_system)).await?;
        let image = |id: &str, version: &str| {
            named(|i: &mut Image| {
                i.id = id.to_string();
                i.operating_system = operating_system.to_string();
                i.operating_system_version = version.to_string();
            })
        };
        Ok(Page::last(vec![
            image(&format!("{}-new", operating_system), "1"),
            image(&format!("{}-old", operating_system), "1"),
        ]))
    }

    async fn list_vcns(&self, _scope: &str, page: Option<String>) -> Result<Page<Vcn>> {
        self.call("vcns").await?;
        let vcn = |id: &str| {
            named(|v: &mut Vcn| {
                v.id = id.to_string();
                v.display_name = id.to_string();
                v.compartment_id = "c-prod".to_string();
            })
        };
        if self.endless.contains("vcns") {
            let next = page.map_or(1, |token| token.parse::<u32>().unwrap_or(0) + 1);
            return Ok(Page::with_next(vec![vcn(&format!("vcn-{}", next))], next.to_string()));
        }
        Ok(Page::last(vec![vcn("vcn-a"), vcn("vcn-b")]))
    }

    async fn list_subnets(&self, _c: &str, vcn_id: &str, _page: Option<String>) -> Result<Page<Subnet>> {
        self.call(&format!("subnets:{}", vcn_id)).await?;
        Ok(Page::last(vec![named(|s: &mut Subnet| {
            s.id = format!("{}-subnet", vcn_id);
            s.is_public = true;
        })]))
    }

    async fn list_security_lists(
        &self,
        _c: &str,
        vcn_id: &str,
        _page: Option<String>,
    ) -> Result<Page<SecurityList>> {
        self.call(&format!("security_lists:{}", vcn_id)).await?;
        Ok(Page::last(vec![named(|s: &mut SecurityList| {
            s.id = format!("{}-sl", vcn_id);
        })]))
    }

    async fn list_route_tables(
        &self,
        _c: &str,
        vcn_id: &str,
        _page: Option<String>,
    ) -> Result<Page<RouteTable>> {
        self.call(&format!("route_tables:{}", vcn_id)).await?;
        Ok(Page::last(Vec::new()))
    }

    async fn list_internet_gateways(&self, _c: &str, vcn_id: &str) -> Result<Vec<InternetGateway>> {
        self.call(&format!("internet_gateways:{}", vcn_id)).await?;
        Ok(vec![named(|g: &mut InternetGateway| {
            g.id = format!("{}-igw", vcn_id);
            g.is_enabled = true;
        })])
    }

    async fn list_nat_gateways(&self, _c: &str, vcn_id: &str) -> Result<Vec<NatGateway>> {
        self.call(&format!("nat_gateways:{}", vcn_id)).await?;
        Ok(Vec::new())
    }

    async fn list_volumes(&self, _scope: &str, _page: Option<String>) -> Result<Page<BlockVolume>> {
        self.call("volumes").await?;
        Ok(Page::last(vec![named(|v: &mut BlockVolume| {
            v.id = "vol-1".into();
            v.size_gb = 50;
        })]))
    }

    async fn list_limit_values(
        &self,
        _scope: &str,
        service: &str,
        _page: Option<String>,
    ) -> Result<Page<ServiceLimit>> {
        self.call(&format!("limits:{}", service)).await?;
        let limit = |name: &str, value: i64| ServiceLimit {
            service_name: service.to_string(),
            limit_name: name.to_string(),
            value,
            scope: "AD-1".to_string(),
        };
        Ok(Page::last(vec![limit("used", 4), limit("unused", 0)]))
    }
}

fn scope() -> Scope {
    Scope::new(TENANCY, "us-ashburn-1")
}

async fn discover(client: FakeClient) -> oci_tf_bootstrap::Result<discovery::Snapshot> {
    discover_shared(Arc::new(client)).await
}

async fn discover_shared(client: Arc<FakeClient>) -> oci_tf_bootstrap::Result<discovery::Snapshot> {
    tokio::time::timeout(Duration::from_secs(5), discovery::run(client, &scope()))
        .await
        .expect("discovery should never hang")
}

#[tokio::test]
async fn test_complete_discovery() {
    let snapshot = discover(FakeClient::default()).await.unwrap();

    assert_eq!(snapshot.tenancy.name, "fake");
    assert_eq!(snapshot.tenancy.home_region, "us-ashburn-1");

    let paths: Vec<&str> = snapshot.compartments.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["prod", "prod/app"]);

    assert_eq!(snapshot.availability_domains[0].fault_domains.len(), 2);

    let shapes: Vec<&str> = snapshot.shapes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(shapes, vec!["VM.Standard.A1.Flex", "VM.Standard.E4.Flex"]);

    // one image per family, the newest
    assert_eq!(snapshot.images.len(), 4);
    assert!(snapshot.images.iter().all(|i| i.id.ends_with("-new")));
    assert_eq!(snapshot.images[0].operating_system, "Oracle Linux");

    assert_eq!(snapshot.vcns.len(), 2);
    assert_eq!(snapshot.vcns[0].subnets.len(), 1);
    assert_eq!(
        snapshot.vcns[0].internet_gateway.as_ref().map(|g| g.id.as_str()),
        Some("vcn-a-igw")
    );
    assert!(snapshot.vcns[0].nat_gateway.is_none());

    assert_eq!(snapshot.block_volumes.len(), 1);

    // zero-valued quotas are dropped for both services
    assert_eq!(snapshot.limits.len(), 2);
    assert!(snapshot.limits.iter().all(|l| l.value != 0));
}

#[tokio::test]
async fn test_tolerable_failures_leave_fields_empty() {
    let client = FakeClient::failing(&["vcns", "volumes", "limits:compute", "limits:compute-core"]);

    let snapshot = discover(client).await.unwrap();

    assert!(snapshot.vcns.is_empty());
    assert!(snapshot.block_volumes.is_empty());
    assert!(snapshot.limits.is_empty());
    assert_eq!(snapshot.shapes.len(), 2);
    assert_eq!(snapshot.compartments.len(), 2);
}

#[tokio::test]
async fn test_fatal_failure_returns_no_snapshot() {
    let client = FakeClient::failing(&["compartments"]);

    let err = discover(client).await.unwrap_err();

    match err {
        Error::FatalDiscovery { category, source } => {
            assert_eq!(category, Category::Compartments);
            assert!(source.to_string().contains("500"));
        }
        other => panic!("expected a fatal discovery error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fatal_failure_cancels_pending_tasks() {
    // Volumes never answer; only cancellation lets the run finish
    let client = FakeClient::failing(&["availability_domains"]).hanging(&["volumes", "vcns"]);

    let err = discover(client).await.unwrap_err();

    assert!(matches!(
        err,
        Error::FatalDiscovery {
            category: Category::AvailabilityDomains,
            ..
        }
    ));
}

// Paused clock: VCN pages end at 5ms steps, the failure lands at 22ms
#[tokio::test(start_paused = true)]
async fn test_cancelled_tasks_make_no_further_calls() {
    let client = Arc::new(
        FakeClient::failing(&["availability_domains"])
            .endless(&["vcns"], Duration::from_millis(22)),
    );

    let err = discover_shared(Arc::clone(&client)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::FatalDiscovery {
            category: Category::AvailabilityDomains,
            ..
        }
    ));

    let total = client.calls.load(Ordering::SeqCst);
    assert!(client.failed.load(Ordering::SeqCst));
    assert!(total < 50, "VCN pagination kept going: {total} calls");
    assert_eq!(client.calls_after_failure.load(Ordering::SeqCst), 0);

    // nothing is left running once the run has returned
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(client.calls.load(Ordering::SeqCst), total);
}

#[tokio::test]
async fn test_failing_image_family_is_skipped() {
    let client = FakeClient::failing(&["images:CentOS"]);

    let snapshot = discover(client).await.unwrap();

    let families: Vec<&str> = snapshot
        .images
        .iter()
        .map(|i| i.operating_system.as_str())
        .collect();
    assert_eq!(families, vec!["Oracle Linux", "Canonical Ubuntu", "Windows"]);
}

#[tokio::test]
async fn test_vcn_sub_resource_failure_degrades_one_vcn() {
    let client = FakeClient::failing(&["subnets:vcn-a", "internet_gateways:vcn-b"]);

    let snapshot = discover(client).await.unwrap();

    let a = &snapshot.vcns[0];
    let b = &snapshot.vcns[1];
    assert!(a.subnets.is_empty());
    assert_eq!(a.security_lists.len(), 1);
    assert!(a.internet_gateway.is_some());

    assert_eq!(b.subnets.len(), 1);
    assert!(b.internet_gateway.is_none());
}

#[tokio::test]
async fn test_failing_tenancy_lookup_keeps_ocid() {
    let client = FakeClient::failing(&["tenancy", "fault_domains"]);

    let snapshot = discover(client).await.unwrap();

    assert_eq!(snapshot.tenancy.id, TENANCY);
    assert!(snapshot.tenancy.name.is_empty());
    assert!(snapshot.availability_domains[0].fault_domains.is_empty());
}
