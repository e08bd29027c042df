//! Terraform identifier naming

use std::collections::{HashMap, HashSet};

/// Normalize a label into a Terraform identifier: lowercase, and every
/// non-alphanumeric character becomes `_` (runs are not collapsed).
pub fn to_tf_name(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().to_string()
            } else {
                "_".to_string()
            }
        })
        .collect()
}

/// Hands out identifiers that are unique for the lifetime of one generator
/// run. The first use of a name returns it unchanged; later uses get `_2`,
/// `_3`, ... appended.
#[derive(Debug, Default)]
pub struct NameTracker {
    counts: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl NameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, label: &str) -> String {
        let base = to_tf_name(label);
        let count = self.counts.entry(base.clone()).or_insert(0);

        let mut name = base.clone();
        loop {
            *count += 1;
            if *count > 1 {
                name = format!("{}_{}", base, count);
            }
            if !self.issued.contains(&name) {
                break;
            }
        }

        self.issued.insert(name.clone());
        name
    }
}
