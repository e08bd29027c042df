//! Terraform file templates
//!
//! Each function renders one file from a [`RenderContext`]. Attribute groups
//! are aligned the way `terraform fmt` would leave them.

use super::{ImageLookup, RenderContext};
use crate::discovery::always_free::{AlwaysFreeResources, A1_FLEX_SHAPE, E2_MICRO_SHAPE};

const HEADER: &str = "# Generated by oci-tf-bootstrap. Review before applying.\n";

const TENANCY_REF: &str = "local.tenancy_ocid";
const FIRST_AD_REF: &str =
    "data.oci_identity_availability_domains.ads.availability_domains[0].name";

/// Quote a value as an HCL string literal, escaping template sequences
pub fn hcl_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("${", "$${")
        .replace("%{", "%%{");
    format!("\"{}\"", escaped)
}

/// Render `key = value` lines with the `=` signs aligned
fn attributes<K: AsRef<str>>(indent: usize, pairs: &[(K, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.as_ref().len()).max().unwrap_or(0);
    let pad = " ".repeat(indent);
    pairs
        .iter()
        .map(|(key, value)| format!("{pad}{:<width$} = {value}\n", key.as_ref()))
        .collect()
}

/// Render `header {` ... `}` with the closing brace at `indent`
fn block(indent: usize, header: &str, body: &str) -> String {
    let pad = " ".repeat(indent);
    format!("{pad}{header} {{\n{body}{pad}}}\n")
}

/// An object value whose keys are quoted, so any identifier is accepted
fn object(indent: usize, name: &str, entries: &[(String, String)]) -> String {
    if entries.is_empty() {
        return format!("{}{} = {{}}\n", " ".repeat(indent), name);
    }
    let quoted: Vec<(String, String)> = entries
        .iter()
        .map(|(key, value)| (hcl_string(key), value.clone()))
        .collect();
    block(indent, &format!("{name} ="), &attributes(indent + 2, &quoted))
}

pub fn provider(ctx: &RenderContext) -> String {
    let region = &ctx.snapshot.tenancy.home_region;

    let mut out = String::from(HEADER);
    out.push_str(
        r#"
terraform {
  required_providers {
    oci = {
      source  = "oracle/oci"
      version = ">= 5.0"
    }
  }
}

"#,
    );
    out.push_str(&block(
        0,
        "provider \"oci\"",
        &attributes(2, &[("region", hcl_string(region))]),
    ));
    out
}

fn always_free_banner(limits: &AlwaysFreeResources) -> String {
    format!(
        r#"# =============================================================================
# This configuration targets always-free tier resources only.
#
# Always-free allowances per tenancy:
#   - Ampere A1 ({a1}): {ocpus} OCPUs + {memory}GB memory in total
#   - AMD ({e2}): up to {micro} instances
#   - Block Storage: {storage}GB in total (boot and block volumes)
#   - Outbound data transfer: {egress}TB per month
#   - Load balancing: {lbs} Flexible Load Balancer ({mbps} Mbps)
#   - Bastion service
# =============================================================================
"#,
        a1 = A1_FLEX_SHAPE,
        ocpus = limits.a1_flex_ocpus,
        memory = limits.a1_flex_memory_gb,
        e2 = E2_MICRO_SHAPE,
        micro = limits.e2_micro_instances,
        storage = limits.block_storage_gb,
        egress = limits.outbound_data_tb,
        lbs = limits.flexible_load_balancers,
        mbps = limits.load_balancer_mbps,
    )
}

pub fn locals(ctx: &RenderContext) -> String {
    let tenancy = &ctx.snapshot.tenancy;

    let mut out = String::from(HEADER);
    if ctx.options.always_free {
        out.push('\n');
        out.push_str(&always_free_banner(&AlwaysFreeResources::default()));
    }

    let mut body = attributes(
        2,
        &[
            ("tenancy_ocid", hcl_string(&tenancy.id)),
            ("tenancy_name", hcl_string(&tenancy.name)),
            ("region", hcl_string(&tenancy.home_region)),
        ],
    );

    if ctx.options.always_free {
        let limits = AlwaysFreeResources::default();
        body.push('\n');
        body.push_str(&attributes(
            2,
            &[
                ("always_free_a1_ocpus", limits.a1_flex_ocpus.to_string()),
                ("always_free_a1_memory_gb", limits.a1_flex_memory_gb.to_string()),
                ("always_free_e2_micro_count", limits.e2_micro_instances.to_string()),
                ("always_free_storage_gb", limits.block_storage_gb.to_string()),
            ],
        ));
    }

    let entries: Vec<(String, String)> = ctx
        .compartments
        .iter()
        .map(|(name, id)| (name.clone(), hcl_string(id)))
        .collect();
    body.push('\n');
    body.push_str(&object(2, "compartments", &entries));

    out.push('\n');
    out.push_str(&block(0, "locals", &body));
    out
}

fn image_data_source(lookup: &ImageLookup, always_free: bool) -> String {
    let mut pairs = vec![
        ("compartment_id", TENANCY_REF.to_string()),
        ("operating_system", hcl_string(&lookup.operating_system)),
        (
            "operating_system_version",
            hcl_string(&lookup.operating_system_version),
        ),
    ];
    if always_free && lookup.is_arm {
        pairs.push(("shape", hcl_string(A1_FLEX_SHAPE)));
    }
    pairs.push(("sort_by", hcl_string("TIMECREATED")));
    pairs.push(("sort_order", hcl_string("DESC")));

    block(
        0,
        &format!("data \"oci_core_images\" \"{}\"", lookup.name),
        &attributes(2, &pairs),
    )
}

pub fn data_sources(ctx: &RenderContext) -> String {
    let mut out = String::from(HEADER);

    out.push('\n');
    if !ctx.snapshot.availability_domains.is_empty() {
        let names: Vec<&str> = ctx
            .snapshot
            .availability_domains
            .iter()
            .map(|ad| ad.name.as_str())
            .collect();
        out.push_str(&format!("# Discovered: {}\n", names.join(", ")));
    }
    out.push_str(&block(
        0,
        "data \"oci_identity_availability_domains\" \"ads\"",
        &attributes(2, &[("compartment_id", TENANCY_REF.to_string())]),
    ));

    for lookup in &ctx.image_lookups {
        out.push('\n');
        out.push_str(&image_data_source(lookup, ctx.options.always_free));
    }

    out.push('\n');
    out.push_str(&block(
        0,
        "output \"availability_domains\"",
        "  value = data.oci_identity_availability_domains.ads.availability_domains[*].name\n",
    ));

    let entries: Vec<(String, String)> = ctx
        .image_lookups
        .iter()
        .map(|lookup| {
            (
                lookup.name.clone(),
                format!(
                    "try(data.oci_core_images.{}.images[0].id, null)",
                    lookup.name
                ),
            )
        })
        .collect();
    out.push('\n');
    out.push_str(&block(
        0,
        "output \"latest_images\"",
        &object(2, "value", &entries),
    ));

    out
}

/// Subnet reference for the example instance
fn subnet_ref(ctx: &RenderContext) -> String {
    if ctx.generate_network {
        return "oci_core_subnet.public.id".to_string();
    }

    let subnets = ctx.snapshot.vcns.iter().flat_map(|vcn| vcn.subnets.iter());
    let chosen = subnets
        .clone()
        .find(|subnet| subnet.is_public)
        .or_else(|| subnets.clone().next());

    match chosen {
        Some(subnet) => hcl_string(&subnet.id),
        None => hcl_string("<subnet-ocid>"),
    }
}

fn image_ref(lookup: Option<&ImageLookup>) -> String {
    match lookup {
        Some(lookup) => format!("data.oci_core_images.{}.images[0].id", lookup.name),
        None => hcl_string("<image-ocid>"),
    }
}

fn instance_block(
    resource_name: &str,
    display_name: &str,
    shape: &str,
    shape_config: Option<(String, String)>,
    image: String,
    subnet: String,
) -> String {
    let mut body = attributes(
        2,
        &[
            ("availability_domain", FIRST_AD_REF.to_string()),
            ("compartment_id", TENANCY_REF.to_string()),
            ("display_name", hcl_string(display_name)),
            ("shape", hcl_string(shape)),
        ],
    );

    if let Some((ocpus, memory)) = shape_config {
        body.push('\n');
        body.push_str(&block(
            2,
            "shape_config",
            &attributes(4, &[("ocpus", ocpus), ("memory_in_gbs", memory)]),
        ));
    }

    body.push('\n');
    body.push_str(&block(
        2,
        "source_details",
        &attributes(4, &[("source_type", hcl_string("image")), ("source_id", image)]),
    ));

    body.push('\n');
    body.push_str(&block(
        2,
        "create_vnic_details",
        &attributes(
            4,
            &[("subnet_id", subnet), ("assign_public_ip", "true".to_string())],
        ),
    ));

    body.push('\n');
    body.push_str(&object(
        2,
        "metadata",
        &[(
            "ssh_authorized_keys".to_string(),
            "file(pathexpand(\"~/.ssh/id_rsa.pub\"))".to_string(),
        )],
    ));

    block(
        0,
        &format!("resource \"oci_core_instance\" \"{}\"", resource_name),
        &body,
    )
}

fn format_number(value: f32) -> String {
    value.to_string()
}

pub fn instance_example(ctx: &RenderContext) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    if ctx.options.always_free {
        let limits = AlwaysFreeResources::default();
        let ocpus = limits.a1_flex_ocpus / 2.0;
        let memory = limits.a1_flex_memory_gb / 2.0;
        let image = ctx
            .image_lookups
            .iter()
            .find(|lookup| lookup.is_arm)
            .or_else(|| ctx.image_lookups.first());

        out.push_str(&format!(
            "# Ampere A1 instance using half of the always-free allowance\n\
             # ({} of {} OCPUs, {}GB of {}GB memory). A second one of the same size\n\
             # still fits within the free tier.\n",
            format_number(ocpus),
            format_number(limits.a1_flex_ocpus),
            format_number(memory),
            format_number(limits.a1_flex_memory_gb),
        ));
        out.push_str(&instance_block(
            "always_free",
            "always-free-a1",
            A1_FLEX_SHAPE,
            Some((format_number(ocpus), format_number(memory))),
            image_ref(image),
            subnet_ref(ctx),
        ));
        return out;
    }

    let shape = ctx.snapshot.shapes.first();
    let shape_name = shape.map_or("<shape-name>", |s| s.name.as_str());
    let shape_config = shape
        .filter(|s| s.is_flexible && s.ocpus > 0.0 && s.memory_gb > 0.0)
        .map(|s| (format_number(s.ocpus), format_number(s.memory_gb)));

    out.push_str("# Example instance using the first discovered shape and image\n");
    out.push_str(&instance_block(
        "example",
        "example-instance",
        shape_name,
        shape_config,
        image_ref(ctx.image_lookups.first()),
        subnet_ref(ctx),
    ));
    out
}

const NETWORK_RESOURCES: &str = r#"resource "oci_core_vcn" "main" {
  compartment_id = local.tenancy_ocid
  cidr_blocks    = ["10.0.0.0/16"]
  display_name   = "main-vcn"
  dns_label      = "main"
}

resource "oci_core_internet_gateway" "main" {
  compartment_id = local.tenancy_ocid
  vcn_id         = oci_core_vcn.main.id
  display_name   = "main-igw"
  enabled        = true
}

resource "oci_core_route_table" "public" {
  compartment_id = local.tenancy_ocid
  vcn_id         = oci_core_vcn.main.id
  display_name   = "public-rt"

  route_rules {
    destination       = "0.0.0.0/0"
    destination_type  = "CIDR_BLOCK"
    network_entity_id = oci_core_internet_gateway.main.id
  }
}

resource "oci_core_security_list" "public" {
  compartment_id = local.tenancy_ocid
  vcn_id         = oci_core_vcn.main.id
  display_name   = "public-sl"

  egress_security_rules {
    destination = "0.0.0.0/0"
    protocol    = "all"
  }

  ingress_security_rules {
    protocol = "6"
    source   = "0.0.0.0/0"

    tcp_options {
      min = 22
      max = 22
    }
  }

  ingress_security_rules {
    protocol = "1"
    source   = "10.0.0.0/16"

    icmp_options {
      type = 3
    }
  }
}

resource "oci_core_subnet" "public" {
  compartment_id    = local.tenancy_ocid
  vcn_id            = oci_core_vcn.main.id
  cidr_block        = "10.0.1.0/24"
  display_name      = "public-subnet"
  dns_label         = "public"
  route_table_id    = oci_core_route_table.public.id
  security_list_ids = [oci_core_security_list.public.id]
}
"#;

pub fn network(ctx: &RenderContext) -> String {
    let mut out = String::from(HEADER);
    out.push_str("\n# No VCN was found in this tenancy: a minimal public network follows.\n");
    if ctx.options.always_free {
        out.push_str(
            "# VCN and networking resources are FREE: VCNs, subnets, gateways, route\n\
             # tables and security lists carry no charge.\n",
        );
    }
    out.push('\n');
    out.push_str(NETWORK_RESOURCES);
    out
}
