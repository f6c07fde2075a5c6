//! Remote-call boundary for lakeshare.
//!
//! Provides:
//! - `PolicyClient`, the narrow facade the sharing engine talks to
//! - `AwsPolicyClient`, its AWS SDK implementation, assuming a pivot role per account
//! - `RetryPolicy`, the single retry/backoff policy injected into every remote call
//! - `AlarmSink`, best-effort failure notifications (SNS or log-only)

pub mod alarm;
pub mod aws;
pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod session;
pub mod types;

pub use alarm::{Alarm, AlarmSink, LogAlarmSink, SnsAlarmSink};
pub use aws::AwsPolicyClient;
pub use client::PolicyClient;
pub use config::CloudConfig;
pub use error::{CloudError, CloudResult};
pub use retry::RetryPolicy;
pub use session::SessionManager;
pub use types::*;
