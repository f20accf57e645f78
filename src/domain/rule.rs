//! Routing rules and the keys exchanges are indexed under
//!
//! Rule matching itself happens upstream in the gateway. The store only needs
//! a rule's key, which must be hashable and stable for the lifetime of the rule.

use derive_more::Display;
use nutype::nutype;
use serde::{Deserialize, Serialize};

/// Matches any host or any method
pub const WILDCARD: &str = "*";

/// Port a rule listens on
#[nutype(
    validate(greater = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        AsRef
    )
)]
pub struct ListenPort(u16);

/// Human readable rule name, as shown on dashboards
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 256),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        AsRef
    )
)]
pub struct RuleName(String);

/// Identity of a routing rule
///
/// Two rules with equal keys share one bucket in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{method} {host}:{port}{}", path.as_deref().unwrap_or(""))]
pub struct RuleKey {
    host: String,
    method: String,
    path: Option<String>,
    port: ListenPort,
}

impl RuleKey {
    pub fn new(
        host: impl Into<String>,
        method: impl Into<String>,
        path: Option<String>,
        port: ListenPort,
    ) -> Self {
        Self {
            host: host.into(),
            method: method.into().to_ascii_uppercase(),
            path,
            port,
        }
    }

    /// Key matching every host and method on `port`
    pub fn any(port: ListenPort) -> Self {
        Self::new(WILDCARD, WILDCARD, None, port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn port(&self) -> ListenPort {
        self.port
    }

    pub fn is_host_wildcard(&self) -> bool {
        self.host == WILDCARD
    }

    pub fn is_method_wildcard(&self) -> bool {
        self.method == WILDCARD
    }
}

/// Routing rule an exchange was produced by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    name: RuleName,
    key: RuleKey,
}

impl Rule {
    pub fn new(name: RuleName, key: RuleKey) -> Self {
        Self { name, key }
    }

    pub fn name(&self) -> &RuleName {
        &self.name
    }

    pub fn key(&self) -> &RuleKey {
        &self.key
    }
}
