//! Output rendering
//!
//! Turns a discovery [`Snapshot`] into Terraform files, or serializes it as
//! is.
//!
//! # Module Structure
//!
//! - [`names`] - Collision-free Terraform identifiers
//! - [`templates`] - Text of each generated file

pub mod names;
pub mod templates;

use crate::discovery::always_free;
use crate::discovery::types::{Image, Snapshot};
use crate::error::{Error, Result};
use names::NameTracker;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PROVIDER_TF: &str = "provider.tf";
pub const LOCALS_TF: &str = "locals.tf";
pub const DATA_TF: &str = "data.tf";
pub const INSTANCE_EXAMPLE_TF: &str = "instance_example.tf";
pub const NETWORK_TF: &str = "network.tf";

/// Terraform generation options
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Target always-free tier resources only
    pub always_free: bool,
}

impl Options {
    /// The snapshot every output of this run works from. In always-free mode
    /// that is the filtered snapshot, for Terraform and raw output alike.
    pub fn narrow(&self, snapshot: Snapshot) -> Snapshot {
        if self.always_free {
            always_free::filter(&snapshot)
        } else {
            snapshot
        }
    }
}

/// One generated file
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: &'static str,
    pub contents: String,
}

/// Serialization format for the raw snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    #[default]
    Json,
    Yaml,
}

/// An `oci_core_images` lookup in data.tf
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLookup {
    /// Terraform identifier of the data source
    pub name: String,
    pub operating_system: String,
    pub operating_system_version: String,
    pub is_arm: bool,
}

/// Everything the templates need, with identifiers already assigned
#[derive(Debug)]
pub struct RenderContext<'a> {
    pub snapshot: &'a Snapshot,
    pub options: &'a Options,
    pub image_lookups: Vec<ImageLookup>,
    /// `(identifier, OCID)` per compartment
    pub compartments: Vec<(String, String)>,
    pub generate_network: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(snapshot: &'a Snapshot, options: &'a Options) -> Self {
        let mut names = NameTracker::new();

        let image_lookups = distinct_images(&snapshot.images)
            .into_iter()
            .map(|image| ImageLookup {
                name: names.unique(&format!(
                    "{} {}",
                    image.operating_system, image.operating_system_version
                )),
                operating_system: image.operating_system.clone(),
                operating_system_version: image.operating_system_version.clone(),
                is_arm: always_free::is_arm64_image(image),
            })
            .collect();

        let compartments = snapshot
            .compartments
            .iter()
            .map(|c| (names.unique(&c.name), c.id.clone()))
            .collect();

        Self {
            snapshot,
            options,
            image_lookups,
            compartments,
            generate_network: should_generate_network(snapshot),
        }
    }
}

/// One image per `(OS, version)`, first occurrence wins
fn distinct_images(images: &[Image]) -> Vec<&Image> {
    let mut seen = HashSet::new();
    images
        .iter()
        .filter(|image| seen.insert(image.key()))
        .collect()
}

/// Existing networking is never duplicated: the network file is only
/// generated for a tenancy without any VCN.
pub fn should_generate_network(snapshot: &Snapshot) -> bool {
    snapshot.vcns.is_empty()
}

/// Render every Terraform file for `snapshot`, in write order
pub fn generate(snapshot: &Snapshot, options: &Options) -> Vec<Artifact> {
    let filtered;
    let snapshot = if options.always_free {
        filtered = always_free::filter(snapshot);
        &filtered
    } else {
        snapshot
    };

    let ctx = RenderContext::new(snapshot, options);

    let mut artifacts = vec![
        Artifact {
            name: PROVIDER_TF,
            contents: templates::provider(&ctx),
        },
        Artifact {
            name: LOCALS_TF,
            contents: templates::locals(&ctx),
        },
        Artifact {
            name: DATA_TF,
            contents: templates::data_sources(&ctx),
        },
        Artifact {
            name: INSTANCE_EXAMPLE_TF,
            contents: templates::instance_example(&ctx),
        },
    ];

    if ctx.generate_network {
        artifacts.push(Artifact {
            name: NETWORK_TF,
            contents: templates::network(&ctx),
        });
    } else {
        tracing::info!(
            "Skipping {}: tenancy already has {} VCN(s)",
            NETWORK_TF,
            snapshot.vcns.len()
        );
    }

    artifacts
}

/// Write the Terraform files into `output_dir`, creating it if needed.
///
/// Files are written one after another; when one fails, the ones before it
/// stay on disk.
pub fn write_terraform(
    snapshot: &Snapshot,
    output_dir: &Path,
    options: &Options,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| Error::generation(output_dir.display().to_string(), e))?;

    let mut written = Vec::new();
    for artifact in generate(snapshot, options) {
        let path = output_dir.join(artifact.name);
        std::fs::write(&path, &artifact.contents)
            .map_err(|e| Error::generation(artifact.name, e))?;
        tracing::debug!("Wrote {:?}", path);
        written.push(path);
    }

    Ok(written)
}

/// Serialize the snapshot unchanged
pub fn write_snapshot<W: Write>(
    snapshot: &Snapshot,
    format: SnapshotFormat,
    mut writer: W,
) -> Result<()> {
    let artifact = match format {
        SnapshotFormat::Json => "snapshot.json",
        SnapshotFormat::Yaml => "snapshot.yaml",
    };

    match format {
        SnapshotFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, snapshot)
                .map_err(|e| Error::generation(artifact, e.into()))?;
            writeln!(writer).map_err(|e| Error::generation(artifact, e))?;
        }
        SnapshotFormat::Yaml => {
            let text = serde_yaml::to_string(&Serialized(snapshot))?;
            writer
                .write_all(text.as_bytes())
                .map_err(|e| Error::generation(artifact, e))?;
        }
    }

    writer.flush().map_err(|e| Error::generation(artifact, e))
}

#[derive(Serialize)]
#[serde(transparent)]
struct Serialized<'a>(&'a Snapshot);
