//! Location identity resolution.
//!
//! Free-text city/country names are optionally resolved to opaque location
//! ids before matching, so identity-based conditions keep working across
//! renames. Failing to resolve is a normal, handled case — matching falls
//! back to names.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    City,
    Country,
}

/// One known location with its stable id and naming variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEntry {
    pub id: String,
    pub kind: LocationKind,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

pub trait LocationResolver: Send + Sync {
    /// The identity for a free-text name, if one is known.
    fn resolve(&self, name: &str, kind: LocationKind) -> Option<String>;
}

/// Resolver backed by a fixed table, typically from the config file.
pub struct TableResolver {
    entries: Vec<LocationEntry>,
}

impl TableResolver {
    pub fn new(entries: Vec<LocationEntry>) -> Self {
        TableResolver { entries }
    }
}

impl LocationResolver for TableResolver {
    fn resolve(&self, name: &str, kind: LocationKind) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let lowered = name.to_lowercase();

        let resolved = self.entries.iter().find(|entry| {
            entry.kind == kind
                && std::iter::once(&entry.name)
                    .chain(entry.aliases.iter())
                    .any(|candidate| {
                        let candidate = candidate.to_lowercase();
                        candidate == lowered
                            || candidate.contains(&lowered)
                            || lowered.contains(&candidate)
                    })
        });

        match resolved {
            Some(entry) => {
                debug!(name, id = %entry.id, "Resolved location identity");
                Some(entry.id.clone())
            }
            None => None,
        }
    }
}
