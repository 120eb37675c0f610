//! Access-scope claims restricting the token holder's message-bus permissions
//!
//! The omission rule is strict: an empty list, an empty permission object or
//! an empty permission set is never serialized. A policy with nothing
//! configured yields no `accessScope` claim at all.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reserved claim key for access-scope claims
pub const ACCESS_SCOPE_CLAIM_KEY: &str = "accessScope";

/// Subject pattern granted to invitees by default
pub const DEFAULT_PUBLISH_SUBJECT: &str = "baseline.>";

/// Allow/deny subject patterns for publish or subscribe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPermission {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

impl SubjectPermission {
    fn from_lists(allow: &[String], deny: &[String]) -> Option<Self> {
        if allow.is_empty() && deny.is_empty() {
            return None;
        }
        Some(Self {
            allow: allow.to_vec(),
            deny: deny.to_vec(),
        })
    }
}

/// Quota on responses the holder may send to requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,

    /// Encoded as integer nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration_nanos")]
    pub ttl: Option<Duration>,
}

/// Publish/subscribe/response permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<SubjectPermission>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<SubjectPermission>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<ResponsePermission>,
}

/// Claims placed under `accessScope`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessScopeClaims {
    pub permissions: Permissions,
}

/// Configured message-bus permissions for invitees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessScopePolicy {
    pub publish_allow: Vec<String>,
    pub publish_deny: Vec<String>,
    pub subscribe_allow: Vec<String>,
    pub subscribe_deny: Vec<String>,
    pub responses_max: Option<u64>,
    pub responses_ttl: Option<Duration>,
}

impl Default for AccessScopePolicy {
    /// Publish on `baseline.>`; no subscribe permissions, no response quota.
    fn default() -> Self {
        Self::none().allow_publish(DEFAULT_PUBLISH_SUBJECT)
    }
}

impl AccessScopePolicy {
    /// A policy granting nothing; produces no access-scope claim
    pub fn none() -> Self {
        Self {
            publish_allow: Vec::new(),
            publish_deny: Vec::new(),
            subscribe_allow: Vec::new(),
            subscribe_deny: Vec::new(),
            responses_max: None,
            responses_ttl: None,
        }
    }

    /// Allow publishing on a subject pattern
    pub fn allow_publish(mut self, subject: impl Into<String>) -> Self {
        self.publish_allow.push(subject.into());
        self
    }

    /// Deny publishing on a subject pattern
    pub fn deny_publish(mut self, subject: impl Into<String>) -> Self {
        self.publish_deny.push(subject.into());
        self
    }

    /// Allow subscribing to a subject pattern
    pub fn allow_subscribe(mut self, subject: impl Into<String>) -> Self {
        self.subscribe_allow.push(subject.into());
        self
    }

    /// Deny subscribing to a subject pattern
    pub fn deny_subscribe(mut self, subject: impl Into<String>) -> Self {
        self.subscribe_deny.push(subject.into());
        self
    }

    /// Limit the number of responses
    pub fn responses_max(mut self, max: u64) -> Self {
        self.responses_max = Some(max);
        self
    }

    /// Limit how long the holder may respond
    pub fn responses_ttl(mut self, ttl: Duration) -> Self {
        self.responses_ttl = Some(ttl);
        self
    }

    /// Whether this policy grants or denies anything
    pub fn is_empty(&self) -> bool {
        self.to_claims().is_none()
    }

    /// Build the access-scope claims, or `None` if nothing is configured
    pub fn to_claims(&self) -> Option<AccessScopeClaims> {
        let publish = SubjectPermission::from_lists(&self.publish_allow, &self.publish_deny);
        let subscribe = SubjectPermission::from_lists(&self.subscribe_allow, &self.subscribe_deny);

        let responses = if self.responses_max.is_some() || self.responses_ttl.is_some() {
            Some(ResponsePermission {
                max: self.responses_max,
                ttl: self.responses_ttl,
            })
        } else {
            None
        };

        if publish.is_none() && subscribe.is_none() && responses.is_none() {
            return None;
        }

        Some(AccessScopeClaims {
            permissions: Permissions {
                publish,
                subscribe,
                responses,
            },
        })
    }
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ttl) => serializer.serialize_u64(ttl.as_nanos().min(u64::MAX as u128) as u64),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = Option::<u64>::deserialize(deserializer)?;
        Ok(nanos.map(Duration::from_nanos))
    }
}
