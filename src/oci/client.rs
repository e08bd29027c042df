//! OCI Client
//!
//! Read-only client for the identity, core and limits services, combining
//! request signing and HTTP functionality behind [`ResourceClient`].

use super::auth::OciCredentials;
use super::http::OciHttpClient;
use super::models::{fault_domain_name, service_limit};
use crate::discovery::client::{Page, ResourceClient};
use crate::discovery::types::{
    AvailabilityDomain, BlockVolume, Compartment, Image, InternetGateway, NatGateway, RouteTable,
    SecurityList, ServiceLimit, Shape, Subnet, Tenancy, Vcn,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Base URLs of the services discovery talks to
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub identity: String,
    pub core: String,
    pub limits: String,
}

impl Endpoints {
    /// Public endpoints of `region`
    pub fn for_region(region: &str) -> Self {
        Self {
            identity: format!("https://identity.{}.oraclecloud.com/20160918", region),
            core: format!("https://iaas.{}.oraclecloud.com/20160918", region),
            limits: format!("https://limits.{}.oci.oraclecloud.com/20190729", region),
        }
    }

    /// Every service behind one base URL (local mocks, proxies)
    pub fn uniform(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            identity: format!("{}/20160918", base),
            core: format!("{}/20160918", base),
            limits: format!("{}/20190729", base),
        }
    }
}

/// Build a request URL from a service base, a path and query parameters
pub fn api_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let mut url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    if !query.is_empty() {
        let pairs: Vec<String> = query
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        url.push('?');
        url.push_str(&pairs.join("&"));
    }
    Url::parse(&url).with_context(|| format!("Invalid API URL {}", url))
}

/// Main OCI client
#[derive(Clone)]
pub struct OciClient {
    pub http: OciHttpClient,
    pub endpoints: Endpoints,
    pub region: String,
}

impl OciClient {
    /// Create a client for the public endpoints of `region`
    pub fn new(credentials: OciCredentials, region: &str) -> Result<Self> {
        Self::with_endpoints(credentials, region, Endpoints::for_region(region))
    }

    pub fn with_endpoints(
        credentials: OciCredentials,
        region: &str,
        endpoints: Endpoints,
    ) -> Result<Self> {
        let http = OciHttpClient::new(credentials)?;
        tracing::debug!("OCI client for {} using {:?}", region, endpoints);

        Ok(Self {
            http,
            endpoints,
            region: region.to_string(),
        })
    }

    /// GET one page of a list endpoint and convert every item
    async fn list_with<T>(
        &self,
        base: &str,
        path: &str,
        query: &[(&str, &str)],
        page: Option<String>,
        convert: impl Fn(&Value) -> T + Send,
    ) -> Result<Page<T>> {
        let mut query = query.to_vec();
        if let Some(token) = page.as_deref() {
            query.push(("page", token));
        }

        let url = api_url(base, path, &query)?;
        let response = self.http.get(&url).await?;

        let items = response
            .body
            .as_array()
            .with_context(|| format!("Unexpected response from {}: expected a list", path))?
            .iter()
            .map(convert)
            .collect();

        Ok(Page {
            items,
            next_page: response.next_page,
        })
    }

    async fn list<T>(
        &self,
        base: &str,
        path: &str,
        query: &[(&str, &str)],
        page: Option<String>,
    ) -> Result<Page<T>>
    where
        T: for<'a> From<&'a Value>,
    {
        self.list_with(base, path, query, page, |value| T::from(value))
            .await
    }

    /// Every item of a list endpoint that is small enough not to page
    async fn list_all<T>(
        &self,
        base: &str,
        path: &str,
        query: &[(&str, &str)],
        convert: impl Fn(&Value) -> T + Send,
    ) -> Result<Vec<T>> {
        Ok(self.list_with(base, path, query, None, convert).await?.items)
    }
}

#[async_trait]
impl ResourceClient for OciClient {
    async fn get_tenancy(&self, tenancy_id: &str) -> Result<Tenancy> {
        let url = api_url(&self.endpoints.identity, &format!("tenancies/{}", tenancy_id), &[])?;
        let response = self.http.get(&url).await?;
        Ok(Tenancy::from(&response.body))
    }

    async fn list_compartments(
        &self,
        scope: &str,
        page: Option<String>,
    ) -> Result<Page<Compartment>> {
        self.list(
            &self.endpoints.identity,
            "compartments",
            &[
                ("compartmentId", scope),
                ("compartmentIdInSubtree", "true"),
                ("lifecycleState", "ACTIVE"),
            ],
            page,
        )
        .await
    }

    async fn list_availability_domains(&self, scope: &str) -> Result<Vec<AvailabilityDomain>> {
        self.list_all(
            &self.endpoints.identity,
            "availabilityDomains",
            &[("compartmentId", scope)],
            |value| AvailabilityDomain::from(value),
        )
        .await
    }

    async fn list_fault_domains(
        &self,
        scope: &str,
        availability_domain: &str,
    ) -> Result<Vec<String>> {
        self.list_all(
            &self.endpoints.identity,
            "faultDomains",
            &[
                ("compartmentId", scope),
                ("availabilityDomain", availability_domain),
            ],
            fault_domain_name,
        )
        .await
    }

    async fn list_shapes(&self, scope: &str, page: Option<String>) -> Result<Page<Shape>> {
        self.list(
            &self.endpoints.core,
            "shapes",
            &[("compartmentId", scope)],
            page,
        )
        .await
    }

    async fn list_images(
        &self,
        scope: &str,
        operating_system: &str,
        page: Option<String>,
    ) -> Result<Page<Image>> {
        self.list(
            &self.endpoints.core,
            "images",
            &[
                ("compartmentId", scope),
                ("operatingSystem", operating_system),
                ("sortBy", "TIMECREATED"),
                ("sortOrder", "DESC"),
            ],
            page,
        )
        .await
    }

    async fn list_vcns(&self, scope: &str, page: Option<String>) -> Result<Page<Vcn>> {
        self.list(
            &self.endpoints.core,
            "vcns",
            &[("compartmentId", scope)],
            page,
        )
        .await
    }

    async fn list_subnets(
        &self,
        compartment_id: &str,
        vcn_id: &str,
        page: Option<String>,
    ) -> Result<Page<Subnet>> {
        self.list(
            &self.endpoints.core,
            "subnets",
            &[("compartmentId", compartment_id), ("vcnId", vcn_id)],
            page,
        )
        .await
    }

    async fn list_security_lists(
        &self,
        compartment_id: &str,
        vcn_id: &str,
        page: Option<String>,
    ) -> Result<Page<SecurityList>> {
        self.list(
            &self.endpoints.core,
            "securityLists",
            &[("compartmentId", compartment_id), ("vcnId", vcn_id)],
            page,
        )
        .await
    }

    async fn list_route_tables(
        &self,
        compartment_id: &str,
        vcn_id: &str,
        page: Option<String>,
    ) -> Result<Page<RouteTable>> {
        self.list(
            &self.endpoints.core,
            "routeTables",
            &[("compartmentId", compartment_id), ("vcnId", vcn_id)],
            page,
        )
        .await
    }

    async fn list_internet_gateways(
        &self,
        compartment_id: &str,
        vcn_id: &str,
    ) -> Result<Vec<InternetGateway>> {
        self.list_all(
            &self.endpoints.core,
            "internetGateways",
            &[("compartmentId", compartment_id), ("vcnId", vcn_id)],
            |value| InternetGateway::from(value),
        )
        .await
    }

    async fn list_nat_gateways(
        &self,
        compartment_id: &str,
        vcn_id: &str,
    ) -> Result<Vec<NatGateway>> {
        self.list_all(
            &self.endpoints.core,
            "natGateways",
            &[("compartmentId", compartment_id), ("vcnId", vcn_id)],
            |value| NatGateway::from(value),
        )
        .await
    }

    async fn list_volumes(&self, scope: &str, page: Option<String>) -> Result<Page<BlockVolume>> {
        self.list(
            &self.endpoints.core,
            "volumes",
            &[("compartmentId", scope)],
            page,
        )
        .await
    }

    async fn list_limit_values(
        &self,
        scope: &str,
        service: &str,
        page: Option<String>,
    ) -> Result<Page<ServiceLimit>> {
        self.list_with(
            &self.endpoints.limits,
            "limitValues",
            &[("compartmentId", scope), ("serviceName", service)],
            page,
            |value| service_limit(service, value),
        )
        .await
    }
}
