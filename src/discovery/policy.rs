//! Discovery categories and their failure policy
//!
//! Whether a failing category aborts the run is data, not control flow: the
//! orchestrator looks every failure up in [`CATEGORY_POLICY`].

use std::fmt;

/// One kind of discovered resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Tenancy,
    Compartments,
    AvailabilityDomains,
    Shapes,
    Images,
    Vcns,
    BlockVolumes,
    ServiceLimits,
}

impl Category {
    /// Every top-level discovery task, in spawn order
    pub const ALL: [Category; 8] = [
        Category::Tenancy,
        Category::Compartments,
        Category::AvailabilityDomains,
        Category::Shapes,
        Category::Images,
        Category::Vcns,
        Category::BlockVolumes,
        Category::ServiceLimits,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenancy => "tenancy",
            Self::Compartments => "compartments",
            Self::AvailabilityDomains => "availability domains",
            Self::Shapes => "shapes",
            Self::Images => "images",
            Self::Vcns => "VCNs",
            Self::BlockVolumes => "block volumes",
            Self::ServiceLimits => "service limits",
        }
    }

    /// Label used in progress output
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Tenancy => "Tenancy Details",
            Self::Compartments => "Compartments",
            Self::AvailabilityDomains => "Availability Domains",
            Self::Shapes => "Shapes",
            Self::Images => "Images",
            Self::Vcns => "VCNs",
            Self::BlockVolumes => "Block Volumes",
            Self::ServiceLimits => "Service Limits",
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        CATEGORY_POLICY
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, policy)| *policy)
            .unwrap_or(FailurePolicy::Fatal)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a failure of a category means for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run and cancel every other task
    Fatal,
    /// Warn and leave the category empty
    Tolerable,
}

/// Failure policy per category.
///
/// Identity, placement and compute data are required to generate anything
/// useful. Networking, storage and quota data only enrich the output.
pub const CATEGORY_POLICY: [(Category, FailurePolicy); 8] = [
    (Category::Tenancy, FailurePolicy::Fatal),
    (Category::Compartments, FailurePolicy::Fatal),
    (Category::AvailabilityDomains, FailurePolicy::Fatal),
    (Category::Shapes, FailurePolicy::Fatal),
    (Category::Images, FailurePolicy::Fatal),
    (Category::Vcns, FailurePolicy::Tolerable),
    (Category::BlockVolumes, FailurePolicy::Tolerable),
    (Category::ServiceLimits, FailurePolicy::Tolerable),
];
