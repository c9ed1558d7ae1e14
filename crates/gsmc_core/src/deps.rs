//! Peer dependency satisfaction.

use std::collections::BTreeSet;

use gsmc_registry::{Dependencies, ModrinthClient, PeerResolver};

use crate::engine::Resolution;
use crate::error::PackError;
use crate::origin::{Source, SourceKind};
use crate::report::{Outcome, SkipReason};

/// Verdict for one release against the labels present in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Satisfaction {
    /// `(label, present)`
    pub required: Vec<(String, bool)>,
    /// `(label, present)`; a present entry is a conflict.
    pub incompatible: Vec<(String, bool)>,
    /// `(label, present)`; informational only.
    pub optional: Vec<(String, bool)>,
    pub satisfied: bool,
}

impl Satisfaction {
    /// All required labels present and no incompatible label present.
    pub fn evaluate(peers: &PeerLabels, run_labels: &BTreeSet<String>) -> Self {
        let mark = |labels: &[String]| -> Vec<(String, bool)> {
            labels
                .iter()
                .map(|label| (label.clone(), run_labels.contains(label)))
                .collect()
        };

        let required = mark(&peers.required);
        let incompatible = mark(&peers.incompatible);
        let optional = mark(&peers.optional);
        let satisfied =
            required.iter().all(|(_, met)| *met) && !incompatible.iter().any(|(_, present)| *present);

        Self {
            required,
            incompatible,
            optional,
            satisfied,
        }
    }
}

/// Dependencies translated into the label namespace of sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerLabels {
    pub required: Vec<String>,
    pub incompatible: Vec<String>,
    pub optional: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DependencyChecker {
    peers: PeerResolver,
}

impl DependencyChecker {
    pub fn new(client: ModrinthClient) -> Self {
        Self {
            peers: PeerResolver::new(client),
        }
    }

    /// Map the peer IDs of a release to slugs.
    ///
    /// IDs whose slug cannot be looked up keep the raw ID as their label, so
    /// a required peer is never silently dropped.
    pub async fn peer_labels(&self, dependencies: &Dependencies) -> PeerLabels {
        let ids: Vec<String> = dependencies
            .required
            .iter()
            .chain(&dependencies.incompatible)
            .chain(&dependencies.optional)
            .cloned()
            .collect();
        let slugs = self.peers.labels_of(&ids).await;
        let label = |ids: &[String]| -> Vec<String> {
            ids.iter()
                .map(|id| slugs.get(id).cloned().unwrap_or_else(|| id.clone()))
                .collect()
        };

        PeerLabels {
            required: label(&dependencies.required),
            incompatible: label(&dependencies.incompatible),
            optional: label(&dependencies.optional),
        }
    }

    /// Dependency verdict for one source. Only registry releases declare
    /// dependencies; other sources are not applicable.
    pub async fn check(
        &self,
        source: &Source,
        resolution: &Resolution,
        run_labels: &BTreeSet<String>,
    ) -> Outcome {
        match (&source.kind, resolution) {
            (SourceKind::Modrinth { .. }, Resolution::Release(release)) => {
                let peers = self.peer_labels(&release.dependencies).await;
                Outcome::Checked(Satisfaction::evaluate(&peers, run_labels))
            }
            (
                SourceKind::Modrinth {
                    platform,
                    game_version,
                },
                _,
            ) => Outcome::failed(PackError::Unsupported {
                platform: platform.clone(),
                game_version: game_version.clone(),
            }),
            (SourceKind::Assume | SourceKind::Direct { .. }, _) => {
                Outcome::Skipped(SkipReason::NotApplicable)
            }
        }
    }
}
