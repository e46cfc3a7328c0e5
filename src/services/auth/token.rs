use std::sync::Arc;

use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::services::auth::keys::{KeyError, SigningKeys};
use crate::services::auth::principal::Principal;

// Reasons a bearer token is rejected. Logged, never sent to the client.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("malformed authorization header")]
    MalformedHeader,
    #[error("token algorithm not accepted: {0:?}")]
    AlgorithmNotAccepted(Algorithm),
    #[error(transparent)]
    Keys(#[from] KeyError),
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
}

/// What a token must satisfy to be accepted.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub audiences: Vec<String>,
    pub leeway_seconds: u64,
    pub algorithms: Vec<Algorithm>,
}

/// Verifies bearer tokens and turns them into a `Principal`.
#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<dyn SigningKeys>,
    validation: Validation,
    algorithms: Vec<Algorithm>,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenValidator")
            .field("validation", &self.validation)
            .field("algorithms", &self.algorithms)
            .finish()
    }
}

impl TokenValidator {
    pub fn new(keys: Arc<dyn SigningKeys>, settings: TokenSettings) -> Self {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(settings.audiences.as_slice());
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = settings.leeway_seconds;

        Self {
            keys,
            validation,
            algorithms: settings.algorithms,
        }
    }

    /// Extract the token from `Authorization: Bearer <token>`.
    ///
    /// The scheme is matched case-insensitively; an empty token is malformed.
    pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(TokenError::MissingHeader)?
            .to_str()
            .map_err(|_| TokenError::MalformedHeader)?;

        let (scheme, token) = value
            .split_once(' ')
            .ok_or(TokenError::MalformedHeader)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(TokenError::MalformedHeader);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::MalformedHeader);
        }
        Ok(token)
    }

    /// Header extraction + `validate`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, TokenError> {
        let token = Self::bearer_token(headers)?;
        self.validate(token).await
    }

    /// Verify signature, `exp`/`nbf`, `iss` and `aud`, then build the principal.
    ///
    /// The header algorithm is checked against the accepted list before any
    /// key is resolved.
    pub async fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        let header = jsonwebtoken::decode_header(token)?;
        if !self.algorithms.contains(&header.alg) {
            return Err(TokenError::AlgorithmNotAccepted(header.alg));
        }

        let key = self.keys.decoding_key(&header).await?;

        // Pin the algorithm to the one this key is used with.
        let mut validation = self.validation.clone();
        validation.algorithms = vec![header.alg];

        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation)?;
        let payload = data.claims;

        let issuer = non_empty(&payload, "iss")?;
        let subject = non_empty(&payload, "sub")?;

        Ok(Principal::from_payload(issuer, subject, &payload))
    }
}

fn non_empty<'a>(payload: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, TokenError> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(TokenError::EmptyClaim(name))
}
