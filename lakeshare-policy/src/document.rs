//! Whole policy documents.

use crate::error::PolicyResult;
use crate::statement::Statement;
use serde::{Deserialize, Deserializer, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";

fn default_version() -> String {
    POLICY_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version", default = "default_version")]
    pub version: String,

    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Statement", default, deserialize_with = "one_or_many_statements")]
    pub statements: Vec<Statement>,
}

/// Outcome of `PolicyDocument::upsert_statement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Merged,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyDocument {
    /// An empty document with the current policy language version.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            id: None,
            statements: Vec::new(),
        }
    }

    pub fn parse(json: &str) -> PolicyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> PolicyResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn has_statement(&self, sid: &str) -> bool {
        self.statement(sid).is_some()
    }

    pub fn statement(&self, sid: &str) -> Option<&Statement> {
        self.statements.iter().find(|s| s.sid() == Some(sid))
    }

    pub fn statement_mut(&mut self, sid: &str) -> Option<&mut Statement> {
        self.statements.iter_mut().find(|s| s.sid() == Some(sid))
    }

    pub fn sids(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().filter_map(Statement::sid)
    }

    /// Inserts `fresh()` under `sid` if no statement carries that sid,
    /// otherwise applies `merge` to the existing one.
    pub fn upsert_statement<F, M>(&mut self, sid: &str, fresh: F, merge: M) -> Upsert
    where
        F: FnOnce() -> Statement,
        M: FnOnce(&mut Statement),
    {
        if let Some(existing) = self.statement_mut(sid) {
            merge(existing);
            return Upsert::Merged;
        }
        let mut statement = fresh();
        statement.sid = Some(sid.to_string());
        self.statements.push(statement);
        Upsert::Inserted
    }

    /// Inserts the statement only if its sid is not present yet.
    pub fn ensure_statement(&mut self, statement: Statement) -> Upsert {
        let Some(sid) = statement.sid.clone() else {
            self.statements.push(statement);
            return Upsert::Inserted;
        };
        self.upsert_statement(&sid, || statement, |_| {})
    }

    pub fn remove_statement(&mut self, sid: &str) -> Option<Statement> {
        let index = self.statements.iter().position(|s| s.sid() == Some(sid))?;
        Some(self.statements.remove(index))
    }

    /// Removes the statement under `sid` if it no longer grants anything.
    /// Returns true if a statement was removed.
    pub fn remove_statement_if_empty(&mut self, sid: &str) -> bool {
        match self.statement(sid) {
            Some(statement) if statement.is_empty() => self.remove_statement(sid).is_some(),
            _ => false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrManyStatements {
    One(Box<Statement>),
    Many(Vec<Statement>),
}

fn one_or_many_statements<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Statement>, D::Error> {
    Ok(match OneOrManyStatements::deserialize(deserializer)? {
        OneOrManyStatements::One(statement) => vec![*statement],
        OneOrManyStatements::Many(statements) => statements,
    })
}
