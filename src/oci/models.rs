//! OCI wire models
//!
//! Conversions from the camelCase JSON the OCI REST APIs return into the
//! snapshot types. Missing fields fall back to empty values instead of
//! failing the whole listing.

use crate::discovery::types::{
    AvailabilityDomain, BlockVolume, Compartment, Image, InternetGateway, NatGateway, RouteRule,
    RouteTable, SecurityList, SecurityRule, ServiceLimit, Shape, Subnet, Tenancy, Vcn,
};
use serde_json::Value;

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn optional_text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(|v| v.as_f64()).unwrap_or_default()
}

fn integer(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(|v| v.as_i64()).unwrap_or_default()
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(|v| v.as_bool()).unwrap_or_default()
}

impl From<&Value> for Tenancy {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            name: text(value, "name"),
            home_region: text(value, "homeRegionKey"),
            description: text(value, "description"),
        }
    }
}

impl From<&Value> for Compartment {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            name: text(value, "name"),
            description: text(value, "description"),
            parent_id: text(value, "compartmentId"),
            path: String::new(),
        }
    }
}

impl From<&Value> for AvailabilityDomain {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            name: text(value, "name"),
            fault_domains: Vec::new(),
        }
    }
}

impl From<&Value> for Shape {
    fn from(value: &Value) -> Self {
        let ocpu_options = value.get("ocpuOptions").filter(|v| v.is_object());
        let memory_options = value.get("memoryOptions").filter(|v| v.is_object());

        Self {
            name: text(value, "shape"),
            processor_description: text(value, "processorDescription"),
            ocpus: number(value, "ocpus") as f32,
            memory_gb: number(value, "memoryInGBs") as f32,
            is_flexible: ocpu_options.is_some(),
            max_ocpus: ocpu_options.map_or(0.0, |o| number(o, "max") as f32),
            max_memory_gb: memory_options.map_or(0.0, |o| number(o, "maxInGBs") as f32),
        }
    }
}

impl From<&Value> for Image {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            operating_system: text(value, "operatingSystem"),
            operating_system_version: text(value, "operatingSystemVersion"),
            time_created: text(value, "timeCreated"),
            size_gb: number(value, "sizeInMBs") / 1024.0,
        }
    }
}

impl From<&Value> for Vcn {
    fn from(value: &Value) -> Self {
        // `cidrBlock` is deprecated in favour of `cidrBlocks`
        let cidr_block = optional_text(value, "cidrBlock").unwrap_or_else(|| {
            value
                .get("cidrBlocks")
                .and_then(|v| v.as_array())
                .and_then(|blocks| blocks.first())
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        });

        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            cidr_block,
            compartment_id: text(value, "compartmentId"),
            dns_label: text(value, "dnsLabel"),
            ..Self::default()
        }
    }
}

impl From<&Value> for Subnet {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            cidr_block: text(value, "cidrBlock"),
            availability_domain: text(value, "availabilityDomain"),
            is_public: !flag(value, "prohibitPublicIpOnVnic"),
            dns_label: text(value, "dnsLabel"),
        }
    }
}

/// `(min, max)` destination ports of a TCP or UDP rule
fn port_range(rule: &Value) -> (Option<u16>, Option<u16>) {
    let range = ["tcpOptions", "udpOptions"].iter().find_map(|options| {
        rule.get(*options)
            .and_then(|o| o.get("destinationPortRange"))
            .filter(|r| r.is_object())
    });

    let port = |key: &str| {
        range
            .and_then(|r| r.get(key))
            .and_then(|v| v.as_u64())
            .and_then(|p| u16::try_from(p).ok())
    };

    (port("min"), port("max"))
}

fn security_rule(rule: &Value) -> SecurityRule {
    let (port_min, port_max) = port_range(rule);
    SecurityRule {
        protocol: text(rule, "protocol"),
        source: optional_text(rule, "source"),
        destination: optional_text(rule, "destination"),
        port_min,
        port_max,
        description: optional_text(rule, "description"),
    }
}

fn rules(value: &Value, key: &str) -> Vec<SecurityRule> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(security_rule).collect())
        .unwrap_or_default()
}

impl From<&Value> for SecurityList {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            ingress_rules: rules(value, "ingressSecurityRules"),
            egress_rules: rules(value, "egressSecurityRules"),
        }
    }
}

impl From<&Value> for RouteRule {
    fn from(value: &Value) -> Self {
        Self {
            destination: text(value, "destination"),
            destination_type: text(value, "destinationType"),
            network_entity_id: text(value, "networkEntityId"),
            description: optional_text(value, "description"),
        }
    }
}

impl From<&Value> for RouteTable {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            routes: value
                .get("routeRules")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().map(RouteRule::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<&Value> for InternetGateway {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            is_enabled: flag(value, "isEnabled"),
        }
    }
}

impl From<&Value> for NatGateway {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            public_ip: text(value, "natIp"),
            block_traffic: flag(value, "blockTraffic"),
        }
    }
}

impl From<&Value> for BlockVolume {
    fn from(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            display_name: text(value, "displayName"),
            size_gb: integer(value, "sizeInGBs"),
            availability_domain: text(value, "availabilityDomain"),
            vpus_per_gb: integer(value, "vpusPerGB"),
            is_hydrated: flag(value, "isHydrated"),
        }
    }
}

/// A limit value of `service`. AD-scoped limits report their AD as scope.
pub fn service_limit(service: &str, value: &Value) -> ServiceLimit {
    ServiceLimit {
        service_name: service.to_string(),
        limit_name: text(value, "name"),
        value: integer(value, "value"),
        scope: optional_text(value, "availabilityDomain")
            .unwrap_or_else(|| text(value, "scopeType")),
    }
}

/// Name of a fault domain entry
pub fn fault_domain_name(value: &Value) -> String {
    text(value, "name")
}
