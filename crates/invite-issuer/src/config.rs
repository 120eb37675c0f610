//! Issuer configuration
//!
//! Read once at startup from `INVITE_*` environment variables. List-valued
//! variables are comma-separated; an empty value means "none".

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use invite_connectors::RetryPolicy;
use invite_core::{AccessScopePolicy, KeySpec, SelectionPolicy};

/// Delay before the first lookup retry; later retries back off linearly
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Issuer service configuration
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Port of the issuer HTTP API
    pub port: u16,

    pub vault_url: String,
    pub registry_url: String,
    pub ident_url: String,

    /// Bearer token for vault and organization lookups
    pub organization_token: String,
    /// Bearer token for registry listing and invitation creation
    pub application_token: String,

    /// Timeout of each outbound request
    pub request_timeout: Duration,
    /// Bound on one whole invitation run
    pub pipeline_deadline: Duration,
    /// Retry applied to transient lookup failures
    pub retry: RetryPolicy,

    /// Spec of the key that signs invitation tokens
    pub signing_spec: KeySpec,
    pub selection_policy: SelectionPolicy,
    pub access_scope: AccessScopePolicy,
}

impl IssuerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let port = parse("INVITE_PORT", &get("INVITE_PORT", "8080"))?;
        let request_timeout = seconds(
            "INVITE_REQUEST_TIMEOUT_SECS",
            &get("INVITE_REQUEST_TIMEOUT_SECS", "10"),
        )?;
        let pipeline_deadline = seconds(
            "INVITE_PIPELINE_DEADLINE_SECS",
            &get("INVITE_PIPELINE_DEADLINE_SECS", "30"),
        )?;
        let retry_attempts: u32 =
            parse("INVITE_RETRY_ATTEMPTS", &get("INVITE_RETRY_ATTEMPTS", "2"))?;

        let signing_spec = KeySpec::from(get("INVITE_SIGNING_SPEC", "RSA-4096").trim());
        let selection_policy =
            parse("INVITE_SELECTION_POLICY", &get("INVITE_SELECTION_POLICY", "earliest"))?;

        let mut access_scope = AccessScopePolicy::none();
        for subject in list(&get("INVITE_PUBLISH_ALLOW", "baseline.>")) {
            access_scope = access_scope.allow_publish(subject);
        }
        for subject in list(&get("INVITE_PUBLISH_DENY", "")) {
            access_scope = access_scope.deny_publish(subject);
        }
        for subject in list(&get("INVITE_SUBSCRIBE_ALLOW", "")) {
            access_scope = access_scope.allow_subscribe(subject);
        }
        for subject in list(&get("INVITE_SUBSCRIBE_DENY", "")) {
            access_scope = access_scope.deny_subscribe(subject);
        }
        if let Some(max) = lookup("INVITE_RESPONSES_MAX") {
            access_scope = access_scope.responses_max(parse("INVITE_RESPONSES_MAX", &max)?);
        }
        if let Some(ttl) = lookup("INVITE_RESPONSES_TTL_SECS") {
            access_scope = access_scope
                .responses_ttl(Duration::from_secs(parse("INVITE_RESPONSES_TTL_SECS", &ttl)?));
        }

        Ok(Self {
            port,
            vault_url: get("INVITE_VAULT_URL", "http://localhost:8082"),
            registry_url: get("INVITE_REGISTRY_URL", "http://localhost:8080"),
            ident_url: get("INVITE_IDENT_URL", "http://localhost:8081"),
            organization_token: required("INVITE_ORGANIZATION_TOKEN")?,
            application_token: required("INVITE_APPLICATION_TOKEN")?,
            request_timeout,
            pipeline_deadline,
            retry: RetryPolicy::new(retry_attempts, RETRY_BACKOFF),
            signing_spec,
            selection_policy,
            access_scope,
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// A non-zero number of seconds; a zero timeout would fail every request
fn seconds(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match parse::<u64>(var, value)? {
        0 => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<IssuerConfig, ConfigError> {
        let mut env: HashMap<String, String> = HashMap::from([
            ("INVITE_ORGANIZATION_TOKEN".to_string(), "org-token".to_string()),
            ("INVITE_APPLICATION_TOKEN".to_string(), "app-token".to_string()),
        ]);
        for (k, v) in vars {
            env.insert(k.to_string(), v.to_string());
        }
        IssuerConfig::from_lookup(|var| env.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.vault_url, "http://localhost:8082");
        assert_eq!(config.registry_url, "http://localhost:8080");
        assert_eq!(config.ident_url, "http://localhost:8081");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.pipeline_deadline, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.signing_spec, KeySpec::Rsa(4096));
        assert_eq!(config.selection_policy, SelectionPolicy::EarliestCreated);
        assert_eq!(config.access_scope, AccessScopePolicy::default());
    }

    #[test]
    fn test_tokens_are_required() {
        let err = IssuerConfig::from_lookup(|_| None).unwrap_err();
        assert_eq!(err, ConfigError::Missing("INVITE_ORGANIZATION_TOKEN"));

        let err = load(&[("INVITE_APPLICATION_TOKEN", "  ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("INVITE_APPLICATION_TOKEN"));
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[("INVITE_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "INVITE_PORT", .. }));
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        for var in ["INVITE_REQUEST_TIMEOUT_SECS", "INVITE_PIPELINE_DEADLINE_SECS"] {
            let err = load(&[(var, "0")]).unwrap_err();
            assert_eq!(
                err,
                ConfigError::Invalid {
                    var,
                    value: "0".into(),
                    reason: "must be greater than zero".into(),
                }
            );
        }

        let config = load(&[
            ("INVITE_REQUEST_TIMEOUT_SECS", "1"),
            ("INVITE_PIPELINE_DEADLINE_SECS", " 5 "),
        ])
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.pipeline_deadline, Duration::from_secs(5));
    }

    #[test]
    fn test_access_scope_lists() {
        let config = load(&[
            ("INVITE_PUBLISH_ALLOW", "baseline.>, audit.>"),
            ("INVITE_SUBSCRIBE_DENY", "private.>"),
            ("INVITE_RESPONSES_MAX", "5"),
            ("INVITE_RESPONSES_TTL_SECS", "60"),
        ])
        .unwrap();

        let expected = AccessScopePolicy::none()
            .allow_publish("baseline.>")
            .allow_publish("audit.>")
            .deny_subscribe("private.>")
            .responses_max(5)
            .responses_ttl(Duration::from_secs(60));
        assert_eq!(config.access_scope, expected);
    }

    #[test]
    fn test_empty_publish_allow_disables_scope() {
        let config = load(&[("INVITE_PUBLISH_ALLOW", "")]).unwrap();
        assert!(config.access_scope.is_empty());
    }

    #[test]
    fn test_signing_spec_and_policy() {
        let config = load(&[
            ("INVITE_SIGNING_SPEC", "Ed25519"),
            ("INVITE_SELECTION_POLICY", "latest"),
        ])
        .unwrap();
        assert_eq!(config.signing_spec, KeySpec::Ed25519);
        assert_eq!(config.selection_policy, SelectionPolicy::LatestCreated);

        let err = load(&[("INVITE_SELECTION_POLICY", "random")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "INVITE_SELECTION_POLICY", .. }));
    }
}
