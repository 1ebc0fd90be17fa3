//! Dashboard State Controller
//!
//! Owns the live document of the selected team and mediates every read and
//! write. Accepted patches are merged shallowly, stamped, and persisted
//! either after a debounce window or immediately, depending on
//! [`PersistMode`].
//!
//! Every `select` starts a new epoch. Loads, subscription pushes and
//! listener shutdowns carry the epoch they were started under and are
//! dropped on arrival if it is no longer current. Writes carry the team id
//! captured when they were scheduled.

use crate::bridge;
use crate::config::{BoardConfig, PersistMode};
use crate::error::{BoardError, WidgetError};
use crate::state::{self, ControllerState};
use crate::widgets::WidgetContract;
use async_trait::async_trait;
use board_model::{schema, ErrorKind, ExportBundle, TeamDocument, TeamId, TeamPatch};
use board_store::{Snapshot, StoreError, Subscription, TeamStore};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

const NOTICE_CAPACITY: usize = 64;
const MAX_ECHOES: usize = 16;

/// One-shot notification for the user
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A write reached the store
    Persisted {
        /// Team written
        team: TeamId,
    },
    /// A write failed; the in-memory document stays authoritative
    PersistFailed {
        /// Team whose write failed
        team: TeamId,
        /// Failure class
        kind: ErrorKind,
        /// Human-readable cause
        reason: String,
    },
    /// A remote change replaced the live document
    RemoteUpdate {
        /// Team updated
        team: TeamId,
    },
    /// An import was applied
    Imported {
        /// Teams written
        teams: Vec<TeamId>,
        /// Whether the live document was replaced
        active_replaced: bool,
    },
}

/// How a [`DashboardController::select`] call ended
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// The team's document is live
    Ready(TeamDocument),
    /// Another `select` started before this one finished; its result was
    /// discarded
    Superseded,
}

#[derive(Debug)]
struct PendingPersist {
    team: TeamId,
    document: TeamDocument,
    generation: u64,
    timer: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Inner {
    state: ControllerState,
    epoch: u64,
    generation: u64,
    pending: Option<PendingPersist>,
    listener: Option<JoinHandle<()>>,
    // Documents this controller wrote for the current epoch, oldest first.
    echoes: VecDeque<TeamDocument>,
    // Imported while the selected team was still loading; wins over the load.
    imported: Option<(u64, TeamDocument)>,
}

#[derive(Debug)]
struct Shared {
    store: Arc<dyn TeamStore>,
    config: BoardConfig,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ControllerState>,
    notices: broadcast::Sender<Notice>,
}

impl Shared {
    fn transition(&self, inner: &mut Inner, next: ControllerState) -> Result<(), BoardError> {
        state::validate_transition(inner.state.phase(), next.phase())?;
        inner.state = next;
        self.state_tx.send_replace(inner.state.clone());
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        // No listeners is fine.
        let _ = self.notices.send(notice);
    }

    fn remember_echo(&self, team: &TeamId, doc: &TeamDocument) {
        let mut inner = self.inner.lock();
        if inner.state.team() == Some(team) {
            if inner.echoes.len() == MAX_ECHOES {
                inner.echoes.pop_front();
            }
            inner.echoes.push_back(doc.clone());
        }
    }

    async fn write(&self, team: &TeamId, doc: &TeamDocument) -> Result<(), StoreError> {
        if !self.store.is_authenticated() {
            tracing::warn!(team = %team, "Not signed in, write skipped");
            self.notify(Notice::PersistFailed {
                team: team.clone(),
                kind: ErrorKind::AuthenticationFailed,
                reason: StoreError::Unauthenticated.to_string(),
            });
            return Err(StoreError::Unauthenticated);
        }

        self.remember_echo(team, doc);
        match self.store.save(team, doc).await {
            Ok(()) => {
                tracing::debug!(team = %team, "Persisted dashboard");
                self.notify(Notice::Persisted { team: team.clone() });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(team = %team, "Persist failed, keeping in-memory state: {}", e);
                self.notify(Notice::PersistFailed {
                    team: team.clone(),
                    kind: e.kind(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn schedule(self: &Arc<Self>, inner: &mut Inner, team: TeamId, document: TeamDocument) {
        inner.generation += 1;
        let generation = inner.generation;
        if let Some(previous) = inner.pending.take() {
            previous.timer.abort();
        }

        let delay = self.config.debounce();
        let weak = Arc::downgrade(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.fire_pending(generation).await;
            }
        });
        tracing::debug!(team = %team, "Persist scheduled in {:?}", delay);
        inner.pending = Some(PendingPersist {
            team,
            document,
            generation,
            timer,
        });
    }

    async fn fire_pending(&self, generation: u64) {
        let pending = {
            let mut inner = self.inner.lock();
            match &inner.pending {
                Some(p) if p.generation == generation => inner.pending.take(),
                _ => None,
            }
        };
        // Runs inside the timer task itself, so the handle is dropped, not aborted.
        if let Some(p) = pending {
            let _ = self.write(&p.team, &p.document).await;
        }
    }

    fn take_pending(&self) -> Option<(TeamId, TeamDocument)> {
        let pending = self.inner.lock().pending.take();
        pending.map(|p| {
            p.timer.abort();
            (p.team, p.document)
        })
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.inner.lock().epoch == epoch
    }

    fn apply_remote(&self, epoch: u64, team: &TeamId, snapshot: Snapshot) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || !inner.state.is_ready_for(team) {
            tracing::debug!(team = %team, "Discarding push for an inactive team");
            return;
        }

        let mut document = match snapshot {
            Snapshot::Present(document) => document,
            Snapshot::Absent => {
                tracing::warn!(team = %team, "Remote document disappeared, keeping local copy");
                return;
            }
        };
        document.enforce_invariants();

        if inner.state.document() == Some(&document) {
            return;
        }
        if let Some(at) = inner.echoes.iter().position(|echo| *echo == document) {
            inner.echoes.drain(..=at);
            return;
        }

        // Last writer wins: unsaved local edits are dropped.
        if let Some(pending) = inner.pending.take() {
            pending.timer.abort();
            tracing::warn!(team = %team, "Remote change overwrote unsaved local edits");
        }
        inner.echoes.clear();
        let next = ControllerState::Ready {
            team: team.clone(),
            document,
        };
        if let Err(e) = self.transition(&mut inner, next) {
            tracing::error!(team = %team, "{}", e);
            return;
        }
        drop(inner);
        tracing::info!("Remote update applied for team {}", team);
        self.notify(Notice::RemoteUpdate { team: team.clone() });
    }

    fn feed_closed(&self, epoch: u64, team: &TeamId) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || !inner.state.is_ready_for(team) {
            return;
        }
        inner.listener = None;
        let next = ControllerState::Error {
            team: team.clone(),
            reason: "remote subscription closed".to_string(),
        };
        if self.transition(&mut inner, next).is_ok() {
            tracing::error!(team = %team, "Remote subscription closed");
        }
    }
}

/// Owner of the live dashboard document
///
/// Cheap to clone; clones share one state.
#[derive(Debug, Clone)]
pub struct DashboardController {
    shared: Arc<Shared>,
}

impl DashboardController {
    /// Controller over `store`, uninitialized
    #[must_use]
    pub fn new(store: Arc<dyn TeamStore>, config: BoardConfig) -> Self {
        let (state_tx, _) = watch::channel(ControllerState::Uninitialized);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                store,
                config,
                inner: Mutex::new(Inner::default()),
                state_tx,
                notices,
            }),
        }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.shared.config
    }

    /// Injected store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TeamStore> {
        &self.shared.store
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.shared.inner.lock().state.clone()
    }

    /// Live document, if ready
    #[must_use]
    pub fn document(&self) -> Option<TeamDocument> {
        self.shared.inner.lock().state.document().cloned()
    }

    /// Selected team
    #[must_use]
    pub fn team(&self) -> Option<TeamId> {
        self.shared.inner.lock().state.team().cloned()
    }

    /// State change feed
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ControllerState> {
        self.shared.state_tx.subscribe()
    }

    /// One-shot notifications
    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.shared.notices.subscribe()
    }

    /// Initialize the store and select the configured start team
    ///
    /// # Errors
    /// Store initialization failure, no team configured, or the select
    /// failure.
    pub async fn start(&self) -> Result<SelectOutcome, BoardError> {
        self.shared.store.init().await?;
        let team = self
            .shared
            .config
            .start_team()
            .cloned()
            .ok_or_else(|| BoardError::Config("no team configured".to_string()))?;
        self.select(team).await
    }

    /// Switch to `team`
    ///
    /// Any pending write for the previous team is flushed under that team's
    /// id first. A team with no stored document gets the default document,
    /// which is persisted before the controller becomes ready; a failure of
    /// that write is reported as a notice only.
    ///
    /// # Errors
    /// Read, sync or authentication failure; the controller is left in
    /// `Error` for this team.
    pub async fn select(&self, team: TeamId) -> Result<SelectOutcome, BoardError> {
        let shared = &self.shared;
        let (epoch, pending) = {
            let mut inner = shared.inner.lock();
            inner.epoch += 1;
            if let Some(listener) = inner.listener.take() {
                listener.abort();
            }
            inner.echoes.clear();
            inner.imported = None;
            let pending = inner.pending.take();
            shared.transition(&mut inner, ControllerState::Loading(team.clone()))?;
            (inner.epoch, pending)
        };
        tracing::info!("Switching to team {}", team);

        if let Some(pending) = pending {
            pending.timer.abort();
            let _ = shared.write(&pending.team, &pending.document).await;
        }

        if !shared.store.is_authenticated() {
            return self.load_failed(epoch, &team, StoreError::Unauthenticated);
        }

        match shared.store.subscribe(&team).await {
            Err(e) => self.load_failed(epoch, &team, e),
            Ok(None) => match shared.store.load(&team).await {
                Ok(loaded) => self.resolve(epoch, &team, loaded).await,
                Err(e) => self.load_failed(epoch, &team, e),
            },
            Ok(Some(mut subscription)) => {
                let Some(first) = subscription.next().await else {
                    let closed = StoreError::Sync("subscription closed before first snapshot".into());
                    return self.load_failed(epoch, &team, closed);
                };
                let outcome = self.resolve(epoch, &team, first.into_document()).await?;
                if matches!(outcome, SelectOutcome::Ready(_)) {
                    self.spawn_listener(epoch, team, subscription);
                }
                Ok(outcome)
            }
        }
    }

    fn load_failed(
        &self,
        epoch: u64,
        team: &TeamId,
        error: StoreError,
    ) -> Result<SelectOutcome, BoardError> {
        let mut inner = self.shared.inner.lock();
        if inner.epoch != epoch {
            tracing::warn!(team = %team, "Discarding stale load failure: {}", error);
            return Ok(SelectOutcome::Superseded);
        }
        tracing::error!(team = %team, "Load failed: {}", error);
        let next = ControllerState::Error {
            team: team.clone(),
            reason: error.to_string(),
        };
        self.shared.transition(&mut inner, next)?;
        Err(error.into())
    }

    async fn resolve(
        &self,
        epoch: u64,
        team: &TeamId,
        loaded: Option<TeamDocument>,
    ) -> Result<SelectOutcome, BoardError> {
        let document = match loaded {
            Some(mut document) => {
                bridge::report_issues(team, &document, "Stored");
                document.enforce_invariants();
                document
            }
            None => {
                let (current, imported) = {
                    let inner = self.shared.inner.lock();
                    (inner.epoch == epoch, inner.imported.is_some())
                };
                if !current {
                    return Ok(SelectOutcome::Superseded);
                }
                let document = schema::default_document(team);
                if !imported {
                    tracing::info!("No saved dashboard for team {}, creating defaults", team);
                    let _ = self.shared.write(team, &document).await;
                }
                document
            }
        };

        let mut inner = self.shared.inner.lock();
        if inner.epoch != epoch {
            tracing::warn!(team = %team, "Discarding stale load result");
            return Ok(SelectOutcome::Superseded);
        }
        let document = match inner.imported.take() {
            Some((at, imported)) if at == epoch => {
                tracing::info!("Using imported dashboard for team {} over loaded copy", team);
                imported
            }
            _ => document,
        };
        let next = ControllerState::Ready {
            team: team.clone(),
            document: document.clone(),
        };
        self.shared.transition(&mut inner, next)?;
        Ok(SelectOutcome::Ready(document))
    }

    fn spawn_listener(&self, epoch: u64, team: TeamId, mut subscription: Subscription) {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let handle = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                shared.apply_remote(epoch, &team, snapshot);
            }
            if let Some(shared) = weak.upgrade() {
                shared.feed_closed(epoch, &team);
            }
        });

        let mut inner = self.shared.inner.lock();
        if inner.epoch == epoch {
            if let Some(previous) = inner.listener.replace(handle) {
                previous.abort();
            }
        } else {
            handle.abort();
        }
    }

    /// Merge `patch` into the live document
    ///
    /// An empty patch is a no-op and does not touch `lastUpdated`.
    ///
    /// # Errors
    /// `BoardError::NotReady` unless a document is loaded.
    pub async fn patch(&self, patch: TeamPatch) -> Result<TeamDocument, BoardError> {
        self.update_with(move |_| Ok(patch)).await
    }

    /// Run a widget operation against the live document and merge its patch
    ///
    /// `op` runs under the controller lock, so it sees the latest document
    /// and must not call back into the controller.
    ///
    /// # Errors
    /// `BoardError::NotReady` unless a document is loaded, or the widget
    /// error returned by `op`.
    pub async fn update_with<F>(&self, op: F) -> Result<TeamDocument, BoardError>
    where
        F: FnOnce(&TeamDocument) -> Result<TeamPatch, WidgetError> + Send,
    {
        let shared = &self.shared;
        let (team, document, write_now) = {
            let mut inner = shared.inner.lock();
            let (team, current) = match &inner.state {
                ControllerState::Ready { team, document } => (team.clone(), document.clone()),
                other => return Err(BoardError::NotReady { phase: other.phase() }),
            };

            let patch = op(&current)?;
            if patch.is_empty() {
                return Ok(current);
            }
            tracing::debug!(team = %team, fields = ?patch.field_names(), "Applying patch");

            let mut next = current;
            next.apply(patch);
            next.touch(Utc::now());
            let ready = ControllerState::Ready {
                team: team.clone(),
                document: next.clone(),
            };
            shared.transition(&mut inner, ready)?;

            match shared.config.persist {
                PersistMode::Debounced => {
                    shared.schedule(&mut inner, team.clone(), next.clone());
                    (team, next, false)
                }
                PersistMode::Immediate => (team, next, true),
            }
        };

        if write_now {
            let _ = shared.write(&team, &document).await;
        }
        Ok(document)
    }

    /// Write any pending debounced document now
    ///
    /// # Errors
    /// The store write failure, also reported as a notice.
    pub async fn flush(&self) -> Result<(), BoardError> {
        if let Some((team, document)) = self.shared.take_pending() {
            self.shared.write(&team, &document).await?;
        }
        Ok(())
    }

    /// Flush, stop listening and return to `Uninitialized`
    ///
    /// The store keeps its own lifecycle.
    pub async fn dispose(&self) {
        let listener = self.shared.inner.lock().listener.take();
        if let Some(listener) = listener {
            listener.abort();
        }
        if let Err(e) = self.flush().await {
            tracing::warn!("Final flush failed: {}", e);
        }

        let mut inner = self.shared.inner.lock();
        inner.epoch += 1;
        inner.echoes.clear();
        if let Err(e) = self
            .shared
            .transition(&mut inner, ControllerState::Uninitialized)
        {
            tracing::error!("{}", e);
        }
        tracing::info!("Dashboard controller disposed");
    }

    /// Every stored team, packaged for backup
    ///
    /// Pending edits are flushed first so the bundle matches what is live.
    ///
    /// # Errors
    /// Store read failure.
    pub async fn export_all(&self) -> Result<ExportBundle, BoardError> {
        if let Err(e) = self.flush().await {
            tracing::warn!("Exporting without pending edits: {}", e);
        }
        bridge::export_bundle(
            self.shared.store.as_ref(),
            &self.shared.config.application,
            Utc::now(),
        )
        .await
    }

    /// One team's stored document
    ///
    /// # Errors
    /// Store read failure.
    pub async fn export_team(&self, team: &TeamId) -> Result<Option<TeamDocument>, BoardError> {
        if let Err(e) = self.flush().await {
            tracing::warn!("Exporting without pending edits: {}", e);
        }
        Ok(self.shared.store.load(team).await?)
    }

    /// Restore a bundle produced by [`Self::export_all`]
    ///
    /// Malformed input is rejected before any write. If the bundle carries
    /// the active team, the live document is replaced; if that team is still
    /// loading, the load resolves to the imported document.
    ///
    /// # Errors
    /// `InvalidImportFormat` for malformed input, or the store failure that
    /// aborted (and rolled back) the import.
    pub async fn import_all(&self, raw: &str) -> Result<Vec<TeamId>, BoardError> {
        let bundle = bridge::parse_import(raw)?;
        if let Err(e) = self.flush().await {
            tracing::warn!("Importing without pending edits: {}", e);
        }
        let teams = bridge::import_bundle(self.shared.store.as_ref(), &bundle).await?;

        let active_replaced = {
            let mut guard = self.shared.inner.lock();
            let inner = &mut *guard;
            match &inner.state {
                ControllerState::Ready { team, .. } => match bundle.teams.get(team) {
                    Some(document) => {
                        let next = ControllerState::Ready {
                            team: team.clone(),
                            document: document.clone(),
                        };
                        if let Some(pending) = inner.pending.take() {
                            pending.timer.abort();
                        }
                        self.shared.transition(inner, next)?;
                        true
                    }
                    None => false,
                },
                // The in-flight load may predate the import; it resolves to this instead.
                ControllerState::Loading(team) => match bundle.teams.get(team) {
                    Some(document) => {
                        inner.imported = Some((inner.epoch, document.clone()));
                        true
                    }
                    None => false,
                },
                _ => false,
            }
        };

        self.shared.notify(Notice::Imported {
            teams: teams.clone(),
            active_replaced,
        });
        Ok(teams)
    }
}

#[async_trait]
impl WidgetContract for DashboardController {
    fn dashboard_data(&self) -> Option<TeamDocument> {
        self.document()
    }

    async fn update_dashboard_data(&self, patch: TeamPatch) -> Result<TeamDocument, BoardError> {
        self.patch(patch).await
    }
}
