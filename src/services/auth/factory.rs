/// Factory: build `TokenValidator` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, KeySource};
use crate::services::auth::{KeyError, StaticKeys, TokenSettings, TokenValidator};

pub fn build_token_validator(config: &Config) -> Result<Arc<TokenValidator>, KeyError> {
    let keys = match &config.signing_keys {
        KeySource::Ed25519Pem(pem) => StaticKeys::from_ed_pem(pem)?,
        KeySource::Jwks(json) => StaticKeys::from_jwks(json)?,
    };

    let settings = TokenSettings {
        issuer: config.auth_issuer.clone(),
        audiences: config.auth_audiences.clone(),
        leeway_seconds: config.access_token_leeway_seconds,
        algorithms: config.auth_algorithms.clone(),
    };

    Ok(Arc::new(TokenValidator::new(Arc::new(keys), settings)))
}
