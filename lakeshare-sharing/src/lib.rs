//! Share orchestration for lakeshare.
//!
//! The engine that turns approved or revoked shares into catalog grants
//! and storage policies:
//! - `state`: the share and share-item state machines
//! - `managers`: table (catalog) and prefix (access point) share managers
//! - `processor`: per-kind item loops with per-item failure isolation
//! - `orchestrator`: `approve_share`, `revoke_share`, `refresh_shares`
//! - `workflow`: the requester/approver side of the share lifecycle
//! - `worker`: the task queue consumer that invokes the orchestrator
//!
//! Nothing here holds process-wide state. Every entry point takes a
//! `SharingContext` owned by the caller.

pub mod alarms;
pub mod config;
pub mod context;
pub mod error;
pub mod managers;
pub mod orchestrator;
pub mod processor;
pub mod state;
pub mod worker;
pub mod workflow;

pub use config::SharingConfig;
pub use context::SharingContext;
pub use error::{ShareError, ShareResult};
pub use orchestrator::{RefreshSummary, approve_share, refresh_shares, revoke_share};
pub use state::{SHARE_ITEM_SM, SHARE_OBJECT_SM, StateMachine, StateTransitionError};
pub use worker::{TaskWorker, TaskWorkerHandle, WorkerCommand, create_task_worker};
pub use workflow::{SharePrincipal, ShareWorkflow};
