//! Property-based tests using proptest
//!
//! These tests verify the always-free filter and the Terraform name tracker
//! against randomized snapshots and labels.

use oci_tf_bootstrap::discovery::always_free::{self, ALWAYS_FREE_SHAPES};
use oci_tf_bootstrap::discovery::{Image, Shape, Snapshot};
use oci_tf_bootstrap::render::names::{to_tf_name, NameTracker};
use proptest::prelude::*;
use std::collections::HashSet;

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just("VM.Standard.A1.Flex"),
        Just("VM.Standard.E2.1.Micro"),
        Just("VM.Standard.E4.Flex"),
        Just("VM.Standard3.Flex"),
        Just("BM.Standard.E4.128"),
    ]
    .prop_map(|name| Shape {
        name: name.to_string(),
        ..Default::default()
    })
}

fn arb_image() -> impl Strategy<Value = Image> {
    (
        prop_oneof![
            Just("Oracle Linux"),
            Just("Canonical Ubuntu"),
            Just("CentOS"),
            Just("Windows")
        ],
        prop_oneof![Just("8"), Just("9"), Just("22.04"), Just("24.04")],
        prop_oneof![Just(""), Just(" Minimal"), Just("-aarch64"), Just(" Minimal aarch64")],
        "[0-9]{4}\\.[0-9]{2}\\.[0-9]{2}",
        any::<bool>(),
    )
        .prop_map(|(os, version, variant, build, variant_in_version)| {
            let (version, display_variant) = if variant_in_version {
                (format!("{}{}", version, variant), String::new())
            } else {
                (version.to_string(), variant.to_string())
            };
            Image {
                id: format!("ocid1.image.oc1..{}", build),
                display_name: format!("{}-{}{}-{}", os.replace(' ', "-"), version, display_variant, build),
                operating_system: os.to_string(),
                operating_system_version: version,
                ..Default::default()
            }
        })
}

fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    (
        prop::collection::vec(arb_shape(), 0..20),
        prop::collection::vec(arb_image(), 0..40),
    )
        .prop_map(|(shapes, images)| Snapshot {
            shapes,
            images,
            ..Default::default()
        })
}

proptest! {
    /// Filtering an already filtered snapshot changes nothing
    #[test]
    fn always_free_filter_is_idempotent(snapshot in arb_snapshot()) {
        let once = always_free::filter(&snapshot);
        let twice = always_free::filter(&once);
        prop_assert_eq!(once, twice);
    }

    /// The filter only ever removes entries
    #[test]
    fn always_free_filter_is_a_subset(snapshot in arb_snapshot()) {
        let filtered = always_free::filter(&snapshot);

        for shape in &filtered.shapes {
            prop_assert!(snapshot.shapes.contains(shape));
            prop_assert!(ALWAYS_FREE_SHAPES.contains(&shape.name.as_str()));
        }
        for image in &filtered.images {
            prop_assert!(snapshot.images.contains(image));
        }
    }

    /// Filtered images are unique per (OS, version) and each is ARM or minimal
    #[test]
    fn filtered_image_keys_are_unique(snapshot in arb_snapshot()) {
        let filtered = always_free::filter(&snapshot);

        let mut keys = HashSet::new();
        for image in &filtered.images {
            prop_assert!(keys.insert(image.key()), "duplicate key {:?}", image.key());
            prop_assert!(always_free::is_arm64_image(image) || always_free::is_minimal_image(image));
        }
    }

    /// When an ARM image exists for a key, the ARM one is chosen
    #[test]
    fn arm_images_win_their_key(snapshot in arb_snapshot()) {
        let filtered = always_free::filter(&snapshot);

        for image in &filtered.images {
            let arm_available = snapshot
                .images
                .iter()
                .any(|i| i.key() == image.key() && always_free::is_arm64_image(i));
            if arm_available {
                prop_assert!(always_free::is_arm64_image(image));
            }
        }
    }

    /// The tracker never hands out the same identifier twice
    #[test]
    fn name_tracker_never_repeats(labels in prop::collection::vec("[a-zA-Z0-9 ._-]{0,12}", 0..60)) {
        let mut tracker = NameTracker::new();
        let mut issued = HashSet::new();

        for label in &labels {
            let name = tracker.unique(label);
            prop_assert!(issued.insert(name.clone()), "{} issued twice", name);
        }
    }

    /// Without digits in the labels, the first use of each base name is unchanged
    #[test]
    fn first_occurrence_is_unchanged(labels in prop::collection::vec("[a-zA-Z .-]{1,12}", 0..60)) {
        let mut tracker = NameTracker::new();
        let mut seen = HashSet::new();

        for label in &labels {
            let base = to_tf_name(label);
            let name = tracker.unique(label);
            if seen.insert(base.clone()) {
                prop_assert_eq!(name, base);
            } else {
                let prefix = format!("{}_", base);
                prop_assert!(name.starts_with(&prefix));
            }
        }
    }

    /// Identifiers only contain lowercase alphanumerics and underscores
    #[test]
    fn tf_names_are_identifier_safe(label in "[ -~]{0,40}") {
        let name = to_tf_name(&label);
        prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert_eq!(name.chars().count(), label.chars().count());
    }
}
