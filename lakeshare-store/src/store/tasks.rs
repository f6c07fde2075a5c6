//! Task queue: enqueue, claim, complete, fail.

use super::ShareStore;
use super::helpers::{now_millis, optional};
use crate::error::{StoreError, StoreResult};
use duckdb::params;
use lakeshare_types::{Task, TaskStatus, TaskUri};
use tracing::{debug, info};

const TASK_COLUMNS: &str =
    "uri, target_uri, action, payload, status, response, error, created_at, updated_at";

type TaskRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

fn read_task_row(row: &duckdb::Row<'_>) -> duckdb::Result<TaskRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn task_from_row(raw: TaskRow) -> StoreResult<Task> {
    let (uri, target_uri, action, payload, status, response, error, created_at, updated_at) = raw;
    let status = TaskStatus::from_str_value(&status).ok_or_else(|| {
        StoreError::InvalidValue(lakeshare_types::ParseError {
            kind: "task status",
            value: status.clone(),
        })
    })?;
    Ok(Task {
        uri: TaskUri(uri),
        target_uri,
        action,
        payload: serde_json::from_str(&payload)?,
        status,
        response: response.as_deref().map(serde_json::from_str).transpose()?,
        error: error.as_deref().map(serde_json::from_str).transpose()?,
        created_at,
        updated_at,
    })
}

impl ShareStore {
    pub fn enqueue_task(
        &self,
        target_uri: &str,
        action: &str,
        payload: serde_json::Value,
    ) -> StoreResult<Task> {
        let now = now_millis();
        let task = Task {
            uri: TaskUri::new(),
            target_uri: target_uri.to_string(),
            action: action.to_string(),
            payload,
            status: TaskStatus::Pending,
            response: None,
            error: None,
            created_at: now,
            updated_at: now,
        };

        let conn = self.lock_conn();
        conn.execute(
            &format!("INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?, NULL, NULL, ?, ?)"),
            params![
                task.uri.as_str(),
                task.target_uri,
                task.action,
                serde_json::to_string(&task.payload)?,
                task.status.as_str(),
                now,
                now,
            ],
        )?;

        info!(task_uri = %task.uri, action, target_uri, "Task enqueued");
        Ok(task)
    }

    pub fn get_task(&self, uri: &TaskUri) -> StoreResult<Task> {
        let raw = {
            let conn = self.lock_conn();
            optional(conn.query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE uri = ?"),
                params![uri.as_str()],
                read_task_row,
            ))?
        };
        raw.map(task_from_row)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("task", uri))
    }

    /// Move the oldest pending task to `InProgress` and return it.
    pub fn claim_next_task(&self) -> StoreResult<Option<Task>> {
        let raw = {
            let conn = self.lock_conn();
            let raw = optional(conn.query_row(
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE status = ? ORDER BY created_at, uri LIMIT 1"
                ),
                params![TaskStatus::Pending.as_str()],
                read_task_row,
            ))?;
            if let Some(ref row) = raw {
                conn.execute(
                    "UPDATE tasks SET status = ?, updated_at = ? WHERE uri = ?",
                    params![TaskStatus::InProgress.as_str(), now_millis(), row.0],
                )?;
            }
            raw
        };

        let Some(raw) = raw else {
            return Ok(None);
        };
        let mut task = task_from_row(raw)?;
        task.status = TaskStatus::InProgress;
        debug!(task_uri = %task.uri, action = %task.action, "Task claimed");
        Ok(Some(task))
    }

    pub fn complete_task(&self, uri: &TaskUri, response: serde_json::Value) -> StoreResult<()> {
        self.finish_task(uri, TaskStatus::Completed, "response", response)
    }

    pub fn fail_task(&self, uri: &TaskUri, error: serde_json::Value) -> StoreResult<()> {
        self.finish_task(uri, TaskStatus::Failed, "error", error)
    }

    fn finish_task(
        &self,
        uri: &TaskUri,
        status: TaskStatus,
        column: &str,
        value: serde_json::Value,
    ) -> StoreResult<()> {
        let conn = self.lock_conn();
        let changed = conn.execute(
            &format!("UPDATE tasks SET status = ?, {column} = ?, updated_at = ? WHERE uri = ?"),
            params![
                status.as_str(),
                serde_json::to_string(&value)?,
                now_millis(),
                uri.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("task", uri));
        }
        info!(task_uri = %uri, status = status.as_str(), "Task finished");
        Ok(())
    }

    pub fn list_tasks(&self, status: TaskStatus) -> StoreResult<Vec<Task>> {
        let rows = {
            let conn = self.lock_conn();
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE status = ? ORDER BY created_at, uri"
            ))?;
            let rows = stmt
                .query_map(params![status.as_str()], read_task_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(task_from_row).collect()
    }
}
