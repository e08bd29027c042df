//! Snapshot data model
//!
//! Everything one discovery run knows about a tenancy. Field names in the
//! serialized form are stable: the raw snapshot output is consumed by scripts.

use serde::{Deserialize, Serialize};

/// Aggregate result of one discovery run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tenancy: Tenancy,
    pub compartments: Vec<Compartment>,
    pub availability_domains: Vec<AvailabilityDomain>,
    pub shapes: Vec<Shape>,
    pub images: Vec<Image>,
    pub vcns: Vec<Vcn>,
    pub block_volumes: Vec<BlockVolume>,
    pub limits: Vec<ServiceLimit>,
}

/// Tenancy identity metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tenancy {
    pub id: String,
    pub name: String,
    pub home_region: String,
    pub description: String,
}

impl Tenancy {
    /// Minimal identity record used when the tenancy lookup itself fails
    pub fn from_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parent_id: String,
    /// Slash-joined names from the top-level compartment down to this one
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityDomain {
    pub id: String,
    pub name: String,
    pub fault_domains: Vec<String>,
}

/// Compute SKU
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub name: String,
    pub processor_description: String,
    pub ocpus: f32,
    pub memory_gb: f32,
    pub is_flexible: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_ocpus: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_memory_gb: f32,
}

fn is_zero(value: &f32) -> bool {
    *value == 0.0
}

/// Platform image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub display_name: String,
    pub operating_system: String,
    pub operating_system_version: String,
    pub time_created: String,
    pub size_gb: f64,
}

impl Image {
    /// Semantic identity of an image: same OS and version means same image
    /// family, whatever the build date.
    pub fn key(&self) -> (&str, &str) {
        (&self.operating_system, &self.operating_system_version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vcn {
    pub id: String,
    pub display_name: String,
    pub cidr_block: String,
    pub compartment_id: String,
    pub dns_label: String,
    pub subnets: Vec<Subnet>,
    pub security_lists: Vec<SecurityList>,
    pub route_tables: Vec<RouteTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_gateway: Option<InternetGateway>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_gateway: Option<NatGateway>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub display_name: String,
    pub cidr_block: String,
    pub availability_domain: String,
    pub is_public: bool,
    pub dns_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityList {
    pub id: String,
    pub display_name: String,
    pub ingress_rules: Vec<SecurityRule>,
    pub egress_rules: Vec<SecurityRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_min: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_max: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    pub id: String,
    pub display_name: String,
    pub routes: Vec<RouteRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    pub destination: String,
    pub destination_type: String,
    pub network_entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternetGateway {
    pub id: String,
    pub display_name: String,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NatGateway {
    pub id: String,
    pub display_name: String,
    pub public_ip: String,
    pub block_traffic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockVolume {
    pub id: String,
    pub display_name: String,
    pub size_gb: i64,
    pub availability_domain: String,
    pub vpus_per_gb: i64,
    pub is_hydrated: bool,
}

/// One non-zero quota value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceLimit {
    pub service_name: String,
    pub limit_name: String,
    pub value: i64,
    pub scope: String,
}
