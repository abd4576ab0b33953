//! Component label catalog.
//!
//! Named parts of each subsystem (generators, buses, pumps, ...) with
//! aliases and a one-line conceptual description. The same identifiers
//! label diagrams in the visual training material.
//!
//! Format (`config/component_labels.yaml`):
//!
//! ```yaml
//! electrical:
//!   - id: GENERATOR
//!     name: Engine-driven generator
//!     aliases: [generator, idg]
//!     description: Primary AC source on each engine.
//! hydraulic: []
//! ```

use crate::classifier::normalize;
use crate::error::Result;
use crate::types::SystemFocus;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLabel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl ComponentLabel {
    /// Matchable phrases: aliases plus the display name
    fn phrases(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentCatalog {
    #[serde(default)]
    pub electrical: Vec<ComponentLabel>,
    #[serde(default)]
    pub hydraulic: Vec<ComponentLabel>,
    #[serde(default)]
    pub other: Vec<ComponentLabel>,
}

impl ComponentCatalog {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load, or an empty catalog if the file is missing or malformed
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(catalog) => {
                info!("Loaded {} component labels from {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                warn!(error = %e, "Component catalog {} unavailable", path.display());
                Self::default()
            }
        }
    }

    pub fn for_focus(&self, focus: SystemFocus) -> &[ComponentLabel] {
        match focus {
            SystemFocus::Electrical => &self.electrical,
            SystemFocus::Hydraulic => &self.hydraulic,
            SystemFocus::Other => &self.other,
        }
    }

    pub fn get(&self, focus: SystemFocus, id: &str) -> Option<&ComponentLabel> {
        self.for_focus(focus)
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(id))
    }

    pub fn len(&self) -> usize {
        self.electrical.len() + self.hydraulic.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Components named in `question`, in catalog order. `Other` searches
    /// every subsystem.
    pub fn mentioned_in(&self, question: &str, focus: SystemFocus) -> Vec<&ComponentLabel> {
        let padded = format!(" {} ", normalize(question));
        if padded.trim().is_empty() {
            return Vec::new();
        }

        let pools: Vec<&[ComponentLabel]> = match focus {
            SystemFocus::Other => SystemFocus::all().iter().map(|f| self.for_focus(*f)).collect(),
            f => vec![self.for_focus(f)],
        };

        pools
            .into_iter()
            .flatten()
            .filter(|c| {
                c.phrases().any(|p| {
                    let phrase = normalize(p);
                    !phrase.is_empty() && padded.contains(&format!(" {} ", phrase))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
electrical:
  - id: GENERATOR
    name: Engine-driven generator
    aliases: [generator, idg]
    description: Primary AC source on each engine.
  - id: TRU
    name: Transformer rectifier unit
    aliases: [tru]
hydraulic:
  - id: EDP
    name: Engine-driven pump
    aliases: [edp, engine pump]
"#;

    #[test]
    fn test_parse_and_lookup() {
        let catalog = ComponentCatalog::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.other.is_empty());
        let gen = catalog.get(SystemFocus::Electrical, "generator").unwrap();
        assert_eq!(gen.name, "Engine-driven generator");
        assert!(catalog.get(SystemFocus::Hydraulic, "GENERATOR").is_none());
    }

    #[test]
    fn test_mentioned_in() {
        let catalog = ComponentCatalog::from_yaml_str(SAMPLE).unwrap();
        let hits = catalog.mentioned_in("What does the TRU feed when a generator fails?", SystemFocus::Electrical);
        let ids: Vec<_> = hits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["GENERATOR", "TRU"]);

        // Whole words only
        assert!(catalog
            .mentioned_in("truly generators", SystemFocus::Electrical)
            .is_empty());

        let any = catalog.mentioned_in("Why does the engine pump run?", SystemFocus::Other);
        assert_eq!(any.len(), 1);
        assert_eq!(any[0].id, "EDP");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let catalog = ComponentCatalog::load_or_empty(Path::new("/nonexistent/labels.yaml"));
        assert!(catalog.is_empty());
    }
}
