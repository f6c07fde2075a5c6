//! Policy statements and their parts.

use crate::error::PolicyError;
use crate::value::ValueList;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// `"Principal": "*"` or `"Principal": {"AWS": [...], "Service": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Any,
    Map(BTreeMap<String, ValueList>),
}

impl Principal {
    pub const AWS: &'static str = "AWS";

    /// `{"AWS": [arns...]}`.
    pub fn aws<I, S>(arns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        map.insert(Self::AWS.to_string(), arns.into_iter().collect());
        Principal::Map(map)
    }

    /// Values listed under `key`. Empty for `Principal::Any`.
    pub fn values(&self, key: &str) -> &[String] {
        match self {
            Principal::Any => &[],
            Principal::Map(map) => map.get(key).map(ValueList::as_slice).unwrap_or(&[]),
        }
    }

    /// Adds a value under `key`. Returns true if the principal changed.
    pub fn add(&mut self, key: &str, value: impl Into<String>) -> Result<bool, PolicyError> {
        match self {
            Principal::Any => Err(PolicyError::InvalidPrincipal(
                "cannot add to a wildcard principal".to_string(),
            )),
            Principal::Map(map) => Ok(map.entry(key.to_string()).or_default().push_unique(value)),
        }
    }

    /// Removes a value under `key`, dropping the key once it is empty.
    pub fn remove(&mut self, key: &str, value: &str) -> bool {
        let Principal::Map(map) = self else {
            return false;
        };
        let Some(list) = map.get_mut(key) else {
            return false;
        };
        let removed = list.remove(value);
        if list.is_empty() {
            map.remove(key);
        }
        removed
    }

    /// True when a map principal lists nobody.
    pub fn is_empty(&self) -> bool {
        match self {
            Principal::Any => false,
            Principal::Map(map) => map.values().all(ValueList::is_empty),
        }
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Principal::Any => serializer.serialize_str("*"),
            Principal::Map(map) => map.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrincipal {
    Wildcard(String),
    Map(BTreeMap<String, ValueList>),
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawPrincipal::deserialize(deserializer)? {
            RawPrincipal::Wildcard(s) if s == "*" => Ok(Principal::Any),
            RawPrincipal::Wildcard(other) => Err(serde::de::Error::custom(format!(
                "principal string must be \"*\", got {other:?}"
            ))),
            RawPrincipal::Map(map) => Ok(Principal::Map(map)),
        }
    }
}

/// `{"StringLike": {"s3:prefix": [...]}}`: operator -> condition key -> values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(BTreeMap<String, BTreeMap<String, ValueList>>);

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self, operator: &str, key: &str) -> Option<&ValueList> {
        self.0.get(operator).and_then(|keys| keys.get(key))
    }

    /// Mutable access to a value list, creating it if needed.
    pub fn entry(&mut self, operator: &str, key: &str) -> &mut ValueList {
        self.0
            .entry(operator.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
    }

    pub fn set(&mut self, operator: &str, key: &str, values: ValueList) {
        *self.entry(operator, key) = values;
    }

    /// Removes one value from a condition list. The emptied list is kept so
    /// callers can see the statement no longer matches anything.
    pub fn remove_value(&mut self, operator: &str, key: &str, value: &str) -> bool {
        self.0
            .get_mut(operator)
            .and_then(|keys| keys.get_mut(key))
            .is_some_and(|list| list.remove(value))
    }

    /// True if any condition key has no values left.
    pub fn has_empty_list(&self) -> bool {
        self.0
            .values()
            .any(|keys| keys.is_empty() || keys.values().any(ValueList::is_empty))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    #[serde(rename = "Effect")]
    pub effect: Effect,

    #[serde(rename = "Principal", default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,

    #[serde(rename = "Action", default, skip_serializing_if = "ValueList::is_empty")]
    pub action: ValueList,

    #[serde(rename = "Resource", default, skip_serializing_if = "ValueList::is_empty")]
    pub resource: ValueList,

    #[serde(rename = "Condition", default, skip_serializing_if = "Condition::is_empty")]
    pub condition: Condition,

    /// Keys this model does not interpret, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Statement {
    /// An `Allow` statement with the given sid and nothing else.
    pub fn allow(sid: impl Into<String>) -> Self {
        Self {
            sid: Some(sid.into()),
            effect: Effect::Allow,
            principal: None,
            action: ValueList::new(),
            resource: ValueList::new(),
            condition: Condition::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action.extend(actions);
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource.extend(resources);
        self
    }

    pub fn with_condition<I, S>(mut self, operator: &str, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition.entry(operator, key).extend(values);
        self
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// A statement grants nothing once its principal, resources, or any
    /// condition list has been emptied.
    pub fn is_empty(&self) -> bool {
        if self.principal.as_ref().is_some_and(Principal::is_empty) {
            return true;
        }
        if self.resource.is_empty() && !self.extra.contains_key("NotResource") {
            return true;
        }
        self.condition.has_empty_list()
    }
}
