//! Best-effort failure notifications.
//!
//! Publishing never fails from the caller's point of view: delivery errors
//! are logged and swallowed.

use async_trait::async_trait;
use aws_config::SdkConfig;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// SNS rejects subjects longer than this.
const MAX_SUBJECT_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub subject: String,
    pub message: String,
}

impl Alarm {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        let mut subject: String = subject.into();
        if subject.len() > MAX_SUBJECT_LEN {
            let mut cut = MAX_SUBJECT_LEN;
            while !subject.is_char_boundary(cut) {
                cut -= 1;
            }
            subject.truncate(cut);
        }
        Self {
            subject,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait AlarmSink: Send + Sync {
    async fn publish(&self, alarm: Alarm);
}

/// Writes alarms to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogAlarmSink;

#[async_trait]
impl AlarmSink for LogAlarmSink {
    async fn publish(&self, alarm: Alarm) {
        error!(subject = %alarm.subject, "{}", alarm.message);
    }
}

/// Publishes alarms to an SNS topic.
pub struct SnsAlarmSink {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsAlarmSink {
    pub fn new(config: &SdkConfig, topic_arn: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_sns::Client::new(config),
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl AlarmSink for SnsAlarmSink {
    async fn publish(&self, alarm: Alarm) {
        error!(subject = %alarm.subject, "publishing alarm");
        if let Err(e) = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(&alarm.subject)
            .message(&alarm.message)
            .send()
            .await
        {
            warn!(
                "failed to publish alarm to {}: {}",
                self.topic_arn,
                aws_smithy_types::error::display::DisplayErrorContext(&e)
            );
        }
    }
}
