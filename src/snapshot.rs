use crate::version::{Requirement, Version, VersionConstraint, VersionError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Fixed intermediate transformers version probed between the bounds.
pub const PROBE_MIDPOINT: &str = "4.53.0";

pub const DEFAULT_REPO_URL: &str = "https://github.com/huggingface/optimum-intel.git";

const VENDORED_SNAPSHOT: &str = include_str!("../data/optimum_intel_snapshot.json");

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to decode compatibility snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid transformers requirement in snapshot: {0}")]
    Requirement(#[from] VersionError),
}

/// Architectures declared together, applying only when every `when`
/// constraint holds for the transformers version under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureGroup {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<VersionConstraint>,
    pub architectures: Vec<String>,
}

impl ArchitectureGroup {
    pub fn unconditional(architectures: Vec<String>) -> Self {
        ArchitectureGroup {
            when: Vec::new(),
            architectures,
        }
    }

    pub fn applies_to(&self, version: &Version) -> bool {
        self.when.iter().all(|c| c.matches(version))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffusionPipeline {
    pub pipeline: String,
    pub auto_model_class: Option<String>,
}

/// Serialized form of a snapshot, as vendored in `data/` or produced by
/// ingesting an optimum-intel checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub source: String,
    pub optimum_intel_version: String,
    /// optimum-intel's own dependency on transformers, e.g. `transformers>=4.45,<4.57`.
    pub transformers_requirement: String,
    /// Task name -> architecture groups. One entry per task; a later class
    /// normalizing to the same task replaces the earlier one.
    pub tasks: BTreeMap<String, Vec<ArchitectureGroup>>,
    pub diffusion_pipelines: Vec<DiffusionPipeline>,
}

/// Supported architectures merged over the probed versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub versions: Vec<Version>,
    pub architectures: BTreeSet<String>,
}

/// Immutable compatibility table. Shared read-only between requests.
#[derive(Debug, Clone)]
pub struct CompatibilitySnapshot {
    data: SnapshotData,
    probe_versions: Vec<Version>,
    diffusion_classes: BTreeSet<String>,
}

impl CompatibilitySnapshot {
    pub fn new(data: SnapshotData) -> Result<Self, SnapshotError> {
        let requirement: Requirement = data.transformers_requirement.parse()?;
        let (min, max) = requirement.bounds()?;
        let midpoint: Version = PROBE_MIDPOINT.parse()?;
        let diffusion_classes = data
            .diffusion_pipelines
            .iter()
            .filter_map(|p| p.auto_model_class.clone())
            .collect();
        Ok(CompatibilitySnapshot {
            data,
            probe_versions: vec![min, midpoint, max],
            diffusion_classes,
        })
    }

    /// The table compiled into the binary.
    pub fn vendored() -> Result<Self, SnapshotError> {
        Self::from_json(VENDORED_SNAPSHOT)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    pub fn data(&self) -> &SnapshotData {
        &self.data
    }

    pub fn optimum_intel_version(&self) -> &str {
        &self.data.optimum_intel_version
    }

    /// `[lower bound, 4.53.0, upper bound]` of optimum-intel's transformers range.
    pub fn probe_versions(&self) -> &[Version] {
        &self.probe_versions
    }

    pub fn diffusion_classes(&self) -> &BTreeSet<String> {
        &self.diffusion_classes
    }

    /// Architectures supported under a given transformers version.
    pub fn resolve_architectures(&self, version: &Version) -> BTreeSet<String> {
        self.data
            .tasks
            .values()
            .flatten()
            .filter(|group| group.applies_to(version))
            .flat_map(|group| group.architectures.iter().cloned())
            .collect()
    }

    pub fn aggregate(&self) -> Aggregate {
        let mut architectures = BTreeSet::new();
        for version in &self.probe_versions {
            architectures.extend(self.resolve_architectures(version));
        }
        Aggregate {
            versions: self.probe_versions.clone(),
            architectures,
        }
    }
}
