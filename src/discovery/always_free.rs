//! Always-free tier filtering
//!
//! Narrows a snapshot to the shapes and images usable within OCI's
//! always-free allowance.

use super::types::{Image, Shape, Snapshot};
use std::collections::HashSet;

/// Ampere A1 flexible shape: 4 OCPUs / 24 GB free per tenancy
pub const A1_FLEX_SHAPE: &str = "VM.Standard.A1.Flex";

/// AMD micro shape: 2 instances free per tenancy
pub const E2_MICRO_SHAPE: &str = "VM.Standard.E2.1.Micro";

/// Shapes eligible for the always-free tier
pub const ALWAYS_FREE_SHAPES: [&str; 2] = [A1_FLEX_SHAPE, E2_MICRO_SHAPE];

const ARM_MARKER: &str = "aarch64";
const MINIMAL_MARKER: &str = "minimal";

/// Documented always-free limits (per tenancy)
#[derive(Debug, Clone, PartialEq)]
pub struct AlwaysFreeResources {
    /// Ampere A1: total OCPUs across all instances
    pub a1_flex_ocpus: f32,
    /// Ampere A1: total memory across all instances
    pub a1_flex_memory_gb: f32,
    pub e2_micro_instances: u32,
    /// Boot and block volumes combined
    pub block_storage_gb: u32,
    pub outbound_data_tb: u32,
    pub flexible_load_balancers: u32,
    pub load_balancer_mbps: u32,
}

impl Default for AlwaysFreeResources {
    fn default() -> Self {
        Self {
            a1_flex_ocpus: 4.0,
            a1_flex_memory_gb: 24.0,
            e2_micro_instances: 2,
            block_storage_gb: 200,
            outbound_data_tb: 10,
            flexible_load_balancers: 1,
            load_balancer_mbps: 10,
        }
    }
}

/// Narrow a snapshot to always-free shapes and images. Other fields are
/// copied as they are.
pub fn filter(snapshot: &Snapshot) -> Snapshot {
    Snapshot {
        shapes: filter_shapes(&snapshot.shapes),
        images: filter_images(&snapshot.images),
        ..snapshot.clone()
    }
}

/// Keep only always-free shapes, in their original order
pub fn filter_shapes(shapes: &[Shape]) -> Vec<Shape> {
    shapes
        .iter()
        .filter(|shape| ALWAYS_FREE_SHAPES.contains(&shape.name.as_str()))
        .cloned()
        .collect()
}

/// Select images for the always-free shapes.
///
/// aarch64 images (for A1.Flex) come first. Minimal images (for E2.1.Micro)
/// follow for any OS version not already covered. Everything else is
/// dropped. One image per `(OS, version)`.
pub fn filter_images(images: &[Image]) -> Vec<Image> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut filtered = Vec::new();

    for image in images.iter().filter(|image| is_arm64_image(image)) {
        if seen.insert(image.key()) {
            filtered.push(image.clone());
        }
    }

    for image in images.iter().filter(|image| is_minimal_image(image)) {
        if seen.insert(image.key()) {
            filtered.push(image.clone());
        }
    }

    filtered
}

fn matches_marker(image: &Image, marker: &str) -> bool {
    image
        .operating_system_version
        .to_lowercase()
        .contains(marker)
        || image.display_name.to_lowercase().contains(marker)
}

/// Built for ARM64 (usable on A1.Flex)
pub fn is_arm64_image(image: &Image) -> bool {
    matches_marker(image, ARM_MARKER)
}

/// Minimal variant (smaller, faster boot)
pub fn is_minimal_image(image: &Image) -> bool {
    matches_marker(image, MINIMAL_MARKER)
}
