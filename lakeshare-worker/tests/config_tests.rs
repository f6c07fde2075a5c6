use lakeshare_worker::{ConfigError, WorkerConfig};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn defaults() {
    let config = WorkerConfig::default();
    assert_eq!(config.store_path, PathBuf::from("lakeshare.duckdb"));
    assert_eq!(config.poll_interval(), Duration::from_secs(10));
    assert_eq!(config.batch_size, 10);
    assert_eq!(config.cloud.pivot_role_name, "lakesharePivotRole");
    assert_eq!(
        config.sharing.iam_policy_name,
        "targetDatasetAccessControlPolicy"
    );
}

#[test]
fn empty_file_is_all_defaults() {
    assert_eq!(WorkerConfig::parse("").unwrap(), WorkerConfig::default());
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = WorkerConfig::parse(
        r#"
store_path = "/var/lib/lakeshare/shares.duckdb"
poll_interval_secs = 2

[cloud]
region = "us-east-2"
alarms_topic_arn = "arn:aws:sns:us-east-2:999999999999:lakeshare-alarms"

[cloud.retry]
max_attempts = 6

[sharing]
invitation_retry_delay_ms = 250
"#,
    )
    .unwrap();

    assert_eq!(config.store_path, PathBuf::from("/var/lib/lakeshare/shares.duckdb"));
    assert_eq!(config.poll_interval(), Duration::from_secs(2));
    assert_eq!(config.batch_size, 10);
    assert_eq!(config.cloud.region, "us-east-2");
    assert_eq!(
        config.cloud.alarms_topic_arn.as_deref(),
        Some("arn:aws:sns:us-east-2:999999999999:lakeshare-alarms")
    );
    assert_eq!(config.cloud.retry.max_attempts, 6);
    assert_eq!(config.cloud.retry.initial_backoff_ms, 500);
    assert_eq!(config.cloud.envname, "local");
    assert_eq!(config.sharing.invitation_retry_delay_ms, 250);
    assert_eq!(config.sharing.access_point_poll.max_attempts, 5);
}

#[test]
fn zero_poll_interval_is_clamped() {
    let config = WorkerConfig::parse("poll_interval_secs = 0").unwrap();
    assert_eq!(config.poll_interval(), Duration::from_secs(1));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let err = WorkerConfig::parse("batch_size = \"many\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn resolve_prefers_the_argument_over_the_environment() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "batch_size = 3").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let config =
        WorkerConfig::resolve(Some(path), Some("/does/not/exist.toml".to_string())).unwrap();
    assert_eq!(config.batch_size, 3);

    let err = WorkerConfig::resolve(None, Some("/does/not/exist.toml".to_string())).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));

    assert_eq!(
        WorkerConfig::resolve(None, None).unwrap(),
        WorkerConfig::default()
    );
}
