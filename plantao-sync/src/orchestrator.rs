//! The sync state machine: checkpoint → publish → on conflict,
//! download + reconcile → republish.
//!
//! One retry cycle only. A second conflict means a third writer raced both
//! attempts; that is surfaced to the caller for a user-triggered retry
//! instead of looping against a live host. A failed sync never deletes or
//! corrupts the local working copy: the only destructive step, promoting
//! the merged file over the local one, happens after a successful merge and
//! immediately before the republish whose outcome the report carries.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use plantao_store::{checkpoint, reconcile};

use crate::error::SyncError;
use crate::github::{GitHubClient, Publish};

/// Terminal outcome of one sync attempt, as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// First publish landed; no conflict.
    Published,
    /// Conflict resolved by merging and the republish landed.
    Merged,
    /// A conflict the single retry cycle could not resolve.
    ConflictUnresolved,
    /// Network/host failure; remote state unknown unless the detail says
    /// otherwise.
    TransportFailed,
    /// Host-side or local validation refused the attempt; retrying without
    /// changes will not help.
    Rejected,
}

impl SyncOutcome {
    /// True for the two outcomes that published a new revision.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Published | Self::Merged)
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Published => "success-published",
            Self::Merged => "success-merged",
            Self::ConflictUnresolved => "conflict-unresolved",
            Self::TransportFailed => "transport-error",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Full report of one sync attempt.
///
/// `revision` is present exactly when [`SyncOutcome::is_success`]: only a
/// fully confirmed publish hands the caller a new token to store.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub revision: Option<String>,
    /// Last relevant HTTP status, 0 when the attempt ended before any.
    pub status: u16,
    /// Human-readable detail; host diagnostic bodies are preserved verbatim.
    pub detail: String,
}

impl SyncReport {
    fn failure(outcome: SyncOutcome, status: u16, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            revision: None,
            status,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.outcome, self.detail)
    }
}

/// Drives one local store file through the publish/merge protocol.
///
/// The caller must keep other local writers paused between the call and the
/// returned report: the orchestrator serializes nothing outside its own
/// control flow.
pub struct SyncOrchestrator {
    client: GitHubClient,
    local_path: PathBuf,
}

impl SyncOrchestrator {
    /// Creates an orchestrator for one local store file.
    #[must_use]
    pub fn new(client: GitHubClient, local_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            local_path: local_path.into(),
        }
    }

    /// The local store file this orchestrator publishes.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Runs one sync attempt with the caller's last known revision token
    /// (`None` before anything was ever published or downloaded).
    pub async fn sync(&self, prev_revision: Option<&str>, message: &str) -> SyncReport {
        let local = self.local_path.as_path();
        if !local.exists() {
            return SyncReport::failure(
                SyncOutcome::Rejected,
                0,
                format!("local store file not found: {}", local.display()),
            );
        }

        info!(path = %local.display(), "sync attempt started");

        // Checkpointing: fold the WAL so the raw bytes are complete.
        if let Err(e) = checkpoint(local) {
            return SyncReport::failure(
                SyncOutcome::Rejected,
                0,
                format!("checkpoint before publish failed: {e}"),
            );
        }

        let bytes = match std::fs::read(local) {
            Ok(bytes) => bytes,
            Err(e) => {
                return SyncReport::failure(
                    SyncOutcome::Rejected,
                    0,
                    format!("could not read local store file: {e}"),
                );
            }
        };

        // Publishing.
        match self.client.publish(&bytes, prev_revision, message).await {
            Ok(Publish::Published { revision, status }) => {
                info!(revision = %revision, "published without conflict");
                SyncReport {
                    outcome: SyncOutcome::Published,
                    revision: Some(revision),
                    status,
                    detail: "upload OK".to_string(),
                }
            }
            Ok(Publish::Conflict { status, detail }) => {
                info!("publish conflicted; entering merge path");
                self.merge_and_republish(message, status, detail).await
            }
            Ok(Publish::Rejected { status, detail }) => SyncReport::failure(
                SyncOutcome::Rejected,
                status,
                format!("host rejected the publish: {detail}"),
            ),
            Err(SyncError::Transport(e)) => self.resolve_lost_publish(prev_revision, &e).await,
            Err(e) => SyncReport::failure(SyncOutcome::TransportFailed, 0, e.to_string()),
        }
    }

    /// A publish whose response never arrived may or may not have landed.
    /// With opaque revision tokens the only safe probe is: if the remote
    /// still holds the token we preconditioned on, the write provably did
    /// not land. If it moved, us-vs-another-writer is indistinguishable from
    /// here; the next attempt's conflict path absorbs either case.
    async fn resolve_lost_publish(&self, prev_revision: Option<&str>, error: &str) -> SyncReport {
        match self.client.current_revision().await {
            Ok(current) if current.as_deref() == prev_revision => SyncReport::failure(
                SyncOutcome::TransportFailed,
                0,
                format!("publish did not land (remote revision unchanged): {error}"),
            ),
            Ok(Some(current)) => SyncReport::failure(
                SyncOutcome::TransportFailed,
                0,
                format!(
                    "publish outcome unknown: response lost and remote moved to {current}; \
                     retry will reconcile either way ({error})"
                ),
            ),
            Ok(None) => SyncReport::failure(
                SyncOutcome::TransportFailed,
                0,
                format!("publish did not land (remote still empty): {error}"),
            ),
            Err(probe) => SyncReport::failure(
                SyncOutcome::TransportFailed,
                0,
                format!("{error}; follow-up revision probe also failed: {probe}"),
            ),
        }
    }

    /// The conflict path: download the remote, merge the local copy into
    /// it, promote the merged file, republish with the fresh token.
    async fn merge_and_republish(
        &self,
        message: &str,
        conflict_status: u16,
        conflict_detail: String,
    ) -> SyncReport {
        let local = self.local_path.as_path();
        let remote_tmp = sibling(local, ".remote.tmp");
        let merged_tmp = sibling(local, ".merged.tmp");

        // Downloading.
        let fresh_revision = match self.client.fetch_to_file(&remote_tmp).await {
            Ok(Some(revision)) => revision,
            Ok(None) => {
                discard(&remote_tmp);
                return SyncReport::failure(
                    SyncOutcome::ConflictUnresolved,
                    conflict_status,
                    "conflict reported, but the remote now has no content; \
                     local file left untouched"
                        .to_string(),
                );
            }
            Err(e) => {
                discard(&remote_tmp);
                return SyncReport::failure(
                    SyncOutcome::ConflictUnresolved,
                    conflict_status,
                    format!(
                        "conflict ({conflict_detail}), and downloading the remote failed: {e}; \
                         local file left untouched"
                    ),
                );
            }
        };

        // Reconciling: local rows replayed over the freshly downloaded base.
        if let Err(e) = reconcile(local, &remote_tmp, &merged_tmp) {
            discard(&remote_tmp);
            discard(&merged_tmp);
            return SyncReport::failure(
                SyncOutcome::ConflictUnresolved,
                conflict_status,
                format!("{e}; local file left untouched"),
            );
        }

        // Promote the merged file. From here on the local copy IS the merge
        // result, deliberately kept even if the republish below fails, so
        // the operator can inspect it.
        if let Err(e) = std::fs::rename(&merged_tmp, local) {
            discard(&remote_tmp);
            discard(&merged_tmp);
            return SyncReport::failure(
                SyncOutcome::ConflictUnresolved,
                conflict_status,
                format!("could not promote the merged store file: {e}"),
            );
        }
        discard(&remote_tmp);
        debug!("merged store promoted over the local file");

        let bytes = match std::fs::read(local) {
            Ok(bytes) => bytes,
            Err(e) => {
                return SyncReport::failure(
                    SyncOutcome::ConflictUnresolved,
                    conflict_status,
                    format!("could not read the merged store file: {e}"),
                );
            }
        };

        // RePublishing, preconditioned on the revision we just downloaded.
        let message = format!("{message} (merge automático)");
        match self
            .client
            .publish(&bytes, Some(&fresh_revision), &message)
            .await
        {
            Ok(Publish::Published { revision, status }) => {
                info!(revision = %revision, "merge republished");
                SyncReport {
                    outcome: SyncOutcome::Merged,
                    revision: Some(revision),
                    status,
                    detail: "upload after merge OK".to_string(),
                }
            }
            Ok(Publish::Conflict { status, detail }) => {
                warn!("second conflict in one attempt; a third writer raced both publishes");
                SyncReport::failure(
                    SyncOutcome::ConflictUnresolved,
                    status,
                    format!(
                        "republish after merge conflicted again: {detail}; \
                         local file holds the merged copy"
                    ),
                )
            }
            Ok(Publish::Rejected { status, detail }) => SyncReport::failure(
                SyncOutcome::Rejected,
                status,
                format!("host rejected the republish after merge: {detail}"),
            ),
            Err(SyncError::Transport(e)) => {
                self.resolve_lost_publish(Some(&fresh_revision), &e).await
            }
            Err(e) => SyncReport::failure(SyncOutcome::TransportFailed, 0, e.to_string()),
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn discard(path: &Path) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
}
