//! Authenticated identity for one request.
//!
//! Built by the token validator from a verified JWT payload, inserted into the
//! request extensions, and dropped with the request.

use serde_json::{Map, Value};

/// Claim names whose string value is a space-separated scope list.
const SCOPE_CLAIMS: [&str; 2] = ["scp", "scope"];

/// Normalized key for scope claims.
pub const SCOPE: &str = "scope";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub key: String,
    pub value: String,
}

impl Claim {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Principal {
    pub issuer: String,
    pub subject: String,
    // Keys may repeat (one entry per scope, per role, ...).
    claims: Vec<Claim>,
}

impl Principal {
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            claims,
        }
    }

    /// Flatten a verified JWT payload into claims.
    ///
    /// - strings become one claim
    /// - arrays become one claim per scalar element, in order
    /// - numbers / booleans are rendered as strings
    /// - `scp` / `scope` strings are split on whitespace into repeated `scope` claims
    /// - nested objects are skipped
    pub fn from_payload(issuer: &str, subject: &str, payload: &Map<String, Value>) -> Self {
        let mut claims = Vec::new();

        for (key, value) in payload {
            if SCOPE_CLAIMS.contains(&key.as_str()) {
                push_scopes(&mut claims, value);
                continue;
            }
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = scalar(item) {
                            claims.push(Claim::new(key.as_str(), v));
                        }
                    }
                }
                other => {
                    if let Some(v) = scalar(other) {
                        claims.push(Claim::new(key.as_str(), v));
                    }
                }
            }
        }

        Self::new(issuer, subject, claims)
    }

    /// Every value of `key`, in issue order.
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.key == key)
            .map(|c| c.value.as_str())
    }

    pub fn has_claim(&self, key: &str, value: &str) -> bool {
        self.values(key).any(|v| v == value)
    }

    pub fn scopes(&self) -> Vec<&str> {
        self.values(SCOPE).collect()
    }
}

fn push_scopes(claims: &mut Vec<Claim>, value: &Value) {
    match value {
        Value::String(s) => {
            for scope in s.split_whitespace() {
                claims.push(Claim::new(SCOPE, scope));
            }
        }
        Value::Array(items) => {
            for scope in items.iter().filter_map(Value::as_str) {
                claims.push(Claim::new(SCOPE, scope));
            }
        }
        _ => {}
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn scp_is_split_into_repeated_scope_claims() {
        let p = Principal::from_payload(
            "https://issuer.example",
            "user-1",
            &payload(json!({ "scp": "openid profile  patient.access" })),
        );

        assert_eq!(p.scopes(), vec!["openid", "profile", "patient.access"]);
        assert!(p.has_claim("scope", "patient.access"));
        assert!(!p.has_claim("scp", "patient.access"));
    }

    #[test]
    fn arrays_keep_order_and_skip_objects() {
        let p = Principal::from_payload(
            "iss",
            "sub",
            &payload(json!({
                "roles": ["reader", "writer"],
                "exp": 1700000000,
                "email_verified": true,
                "cnf": { "jkt": "abc" },
            })),
        );

        assert_eq!(p.values("roles").collect::<Vec<_>>(), vec!["reader", "writer"]);
        assert!(p.has_claim("exp", "1700000000"));
        assert!(p.has_claim("email_verified", "true"));
        assert_eq!(p.values("cnf").count(), 0);
    }

    #[test]
    fn exact_match_only() {
        let p = Principal::new("iss", "sub", vec![Claim::new("scope", "patient.access.read")]);
        assert!(!p.has_claim("scope", "patient.access"));
        assert!(!p.has_claim("Scope", "patient.access.read"));
    }
}
