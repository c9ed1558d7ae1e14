//! Drives one run over the whole origin list.
//!
//! A run goes through four phases:
//!
//! 1. **Parse** every origin; failures become report entries.
//! 2. **Dedupe** by label; the first origin wins.
//! 3. **Resolve** registry sources in waves. With peer checking on, required
//!    peers missing from the run are added as new sources and resolved in the
//!    next wave; incompatible peers are remembered for the conflict check.
//! 4. **Act** on every source concurrently, reusing its resolution. Before a
//!    sync, a target path claimed by an earlier source is skipped for later
//!    ones, so no two downloads ever write the same file.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use futures_util::future::join_all;
use gsmc_registry::ResolvedRelease;
use tracing::{debug, info, warn};

use crate::config::PackConfig;
use crate::deps::DependencyChecker;
use crate::engine::{Resolution, SyncEngine};
use crate::error::PackError;
use crate::origin::{Source, SourceKind};
use crate::report::{Action, Entry, Outcome, Report, SkipReason};

/// A source admitted into the run.
#[derive(Debug, Clone)]
pub struct Admitted {
    pub source: Source,
    /// Added by peer expansion rather than the manifest.
    pub peer: bool,
}

/// State owned by a single run.
#[derive(Debug, Default)]
pub struct RunState {
    /// Admitted sources in admission order.
    pub sources: Vec<Admitted>,
    pub labels: BTreeSet<String>,
    pub rejected_peers: BTreeSet<String>,
}

impl RunState {
    /// Admit a source unless its label is already taken. Returns its index.
    pub fn admit(&mut self, source: Source, peer: bool) -> Option<usize> {
        if !self.labels.insert(source.label.clone()) {
            return None;
        }
        self.sources.push(Admitted { source, peer });
        Some(self.sources.len() - 1)
    }

    /// Rejected peers whose own source did not fail.
    ///
    /// `outcomes` is indexed like `sources`.
    pub fn conflicts(&self, outcomes: &[Outcome]) -> Vec<String> {
        self.sources
            .iter()
            .zip(outcomes)
            .filter(|(_, outcome)| {
                !matches!(
                    outcome,
                    Outcome::Failed { .. }
                        | Outcome::Skipped(SkipReason::SharedTarget { .. })
                )
            })
            .map(|(admitted, _)| &admitted.source.label)
            .filter(|label| self.rejected_peers.contains(*label))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Position of an origin in the report.
enum Slot {
    Done(Entry),
    Source(usize),
}

pub struct Orchestrator {
    config: PackConfig,
    engine: SyncEngine,
    checker: DependencyChecker,
}

impl Orchestrator {
    pub fn new(config: PackConfig) -> Result<Self, PackError> {
        let checker = DependencyChecker::new(config.registry_client()?);
        let engine = SyncEngine::new(config.clone())?;
        Ok(Self {
            config,
            engine,
            checker,
        })
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Remove the pack directory before a clean sync.
    pub async fn clean(&self) -> std::io::Result<()> {
        match tokio::fs::remove_dir_all(&self.config.pack_dir).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Run `action` over `origins`. Per-source failures end up in the report.
    pub async fn run(&self, origins: &[String], action: Action) -> Report {
        let mut state = RunState::default();
        let mut slots = Vec::with_capacity(origins.len());

        for raw in origins {
            match Source::parse(raw) {
                Ok(source) => {
                    let label = source.label.clone();
                    match state.admit(source, false) {
                        Some(index) => slots.push(Slot::Source(index)),
                        None => {
                            warn!("Duplicate label '{}' in '{}', skipping", label, raw);
                            slots.push(Slot::Done(Entry {
                                origin: raw.clone(),
                                label: Some(label),
                                peer: false,
                                outcome: Outcome::Skipped(SkipReason::Duplicate),
                            }));
                        }
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    slots.push(Slot::Done(Entry {
                        origin: raw.clone(),
                        label: None,
                        peer: false,
                        outcome: Outcome::failed(e.into()),
                    }));
                }
            }
        }

        let resolutions = self.resolve_all(&mut state).await;
        for (index, admitted) in state.sources.iter().enumerate() {
            if admitted.peer {
                slots.push(Slot::Source(index));
            }
        }

        let mut prepared: Vec<Result<Resolution, Outcome>> = resolutions
            .into_iter()
            .map(|resolution| resolution.map_err(Outcome::failed))
            .collect();
        if action == Action::Sync {
            self.claim_targets(&state, &mut prepared);
        }

        info!(
            "Running {} over {} sources ({} origins)",
            action,
            state.sources.len(),
            origins.len()
        );
        let outcomes = self.act(&state, prepared, action).await;

        let conflicts = state.conflicts(&outcomes);
        for conflict in &conflicts {
            warn!("'{}' is present but another source is incompatible with it", conflict);
        }

        let mut outcomes: Vec<Option<Outcome>> = outcomes.into_iter().map(Some).collect();
        let entries = slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Done(entry) => Some(entry),
                Slot::Source(index) => {
                    let admitted = &state.sources[index];
                    outcomes[index].take().map(|outcome| Entry {
                        origin: admitted.source.origin.clone(),
                        label: Some(admitted.source.label.clone()),
                        peer: admitted.peer,
                        outcome,
                    })
                }
            })
            .collect();

        Report {
            action,
            entries,
            conflicts,
            labels: state.labels,
        }
    }

    /// Resolve every admitted source, expanding peers wave by wave.
    async fn resolve_all(&self, state: &mut RunState) -> Vec<Result<Resolution, PackError>> {
        let mut resolutions: Vec<Result<Resolution, PackError>> = Vec::new();
        let mut wave: Vec<usize> = (0..state.sources.len()).collect();

        while !wave.is_empty() {
            debug!("Resolving wave of {} sources", wave.len());
            let resolved = join_all(
                wave.iter()
                    .map(|&i| self.engine.resolve(&state.sources[i].source)),
            )
            .await;
            resolutions.extend(resolved);

            if !self.config.check_peers {
                break;
            }

            let releases: Vec<(usize, &ResolvedRelease)> = wave
                .iter()
                .filter_map(|&i| match &resolutions[i] {
                    Ok(Resolution::Release(release)) if !release.dependencies.is_empty() => {
                        Some((i, release))
                    }
                    _ => None,
                })
                .collect();
            let peer_labels = join_all(
                releases
                    .iter()
                    .map(|(_, release)| self.checker.peer_labels(&release.dependencies)),
            )
            .await;
            let owners: Vec<usize> = releases.iter().map(|(i, _)| *i).collect();

            let mut next = Vec::new();
            for (owner, peers) in owners.into_iter().zip(peer_labels) {
                let owner = &state.sources[owner].source;
                let SourceKind::Modrinth {
                    platform,
                    game_version,
                } = owner.kind.clone()
                else {
                    continue;
                };
                let owner_label = owner.label.clone();

                for label in peers.incompatible {
                    state.rejected_peers.insert(label);
                }
                for label in peers.required {
                    if state.labels.contains(&label) {
                        continue;
                    }
                    info!("Adding required peer '{}' of '{}'", label, owner_label);
                    let peer = Source::peer(&label, &platform, &game_version);
                    if let Some(index) = state.admit(peer, true) {
                        next.push(index);
                    }
                }
            }
            wave = next;
        }

        resolutions
    }

    /// Give every target path to the first source that writes it.
    ///
    /// Later sources with the same target are skipped before any transfer
    /// starts. Sources that will not write (assumed, `nosync`, failed) claim
    /// nothing.
    fn claim_targets(&self, state: &RunState, prepared: &mut [Result<Resolution, Outcome>]) {
        let mut owners: HashMap<PathBuf, String> = HashMap::new();
        for (admitted, slot) in state.sources.iter().zip(prepared.iter_mut()) {
            let source = &admitted.source;
            if source.flags.no_sync {
                continue;
            }
            let Ok(resolution) = &*slot else {
                continue;
            };
            let Ok(Some(target)) = self.engine.target_path(source, resolution) else {
                continue;
            };

            match owners.get(&target) {
                Some(owner) => {
                    warn!(
                        "'{}' writes to {}, already claimed by '{}', skipping",
                        source.label,
                        target.display(),
                        owner
                    );
                    *slot = Err(Outcome::Skipped(SkipReason::SharedTarget {
                        path: target,
                        owner: owner.clone(),
                    }));
                }
                None => {
                    owners.insert(target, source.label.clone());
                }
            }
        }
    }

    async fn act(
        &self,
        state: &RunState,
        prepared: Vec<Result<Resolution, Outcome>>,
        action: Action,
    ) -> Vec<Outcome> {
        let labels = &state.labels;
        join_all(
            state
                .sources
                .iter()
                .zip(prepared)
                .map(|(admitted, resolution)| async move {
                    let source = &admitted.source;
                    let resolution = match resolution {
                        Ok(resolution) => resolution,
                        Err(outcome) => return outcome,
                    };
                    match action {
                        Action::Sync => self.engine.sync(source, &resolution).await,
                        Action::Test => self.engine.test(source, &resolution).await,
                        Action::Dep => self.checker.check(source, &resolution, labels).await,
                    }
                }),
        )
        .await
    }
}
