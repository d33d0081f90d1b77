//! Blob-host replica synchronization for Plantão.
//!
//! Independent clients each hold a full copy of one SQLite store file and
//! coordinate exclusively through a version-controlled blob host, using
//! optimistic revision tokens:
//!
//! 1. checkpoint the local store so its raw bytes are complete
//! 2. publish, preconditioned on the last known revision token
//! 3. on conflict: download the remote copy, merge the local rows into it
//!    (see [`plantao_store::reconcile`]), and republish with the fresh
//!    token, exactly once
//!
//! # Example
//!
//! ```no_run
//! use plantao_sync::{GitHubClient, GitHubConfig, SyncOrchestrator};
//!
//! # async fn run() {
//! let client = GitHubClient::new(GitHubConfig {
//!     owner: "clinica".to_string(),
//!     repo: "plantao-dados".to_string(),
//!     ..Default::default()
//! });
//! let orchestrator = SyncOrchestrator::new(client, "data/plantao.db");
//! let report = orchestrator.sync(None, "Atualização do plantão").await;
//! println!("{report}");
//! # }
//! ```

pub mod auth;
mod error;
mod github;
mod orchestrator;

pub use error::{SyncError, SyncResult};
pub use github::{GitHubClient, GitHubConfig, Publish, RemoteSnapshot};
pub use orchestrator::{SyncOrchestrator, SyncOutcome, SyncReport};
