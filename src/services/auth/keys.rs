//! Signing keys used to verify access tokens.
//!
//! The identity provider owns the keys; this module only resolves a
//! `DecodingKey` for a token header. Fetching, caching and rotating a remote
//! key set belongs to whoever implements `SigningKeys` for that source.

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Header, jwk::JwkSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid ed25519 public key pem: {0}")]
    InvalidPem(jsonwebtoken::errors::Error),
    #[error("invalid jwk set: {0}")]
    InvalidJwkSet(String),
    #[error("token header has no 'kid'")]
    MissingKid,
    #[error("no signing key for kid '{0}'")]
    UnknownKid(String),
}

#[async_trait]
pub trait SigningKeys: Send + Sync {
    /// Resolve the key that must have signed a token with this header.
    async fn decoding_key(&self, header: &Header) -> Result<DecodingKey, KeyError>;
}

/// Keys fixed at startup.
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub enum StaticKeys {
    // A single key; `kid` is ignored.
    Single(DecodingKey),
    // Key set; tokens must name their key with `kid`.
    Set(Vec<(String, DecodingKey)>),
}

impl std::fmt::Debug for StaticKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaticKeys::Single(_) => f.write_str("StaticKeys::Single"),
            StaticKeys::Set(keys) => f
                .debug_list()
                .entries(keys.iter().map(|(kid, _)| kid))
                .finish(),
        }
    }
}

impl StaticKeys {
    pub fn from_ed_pem(pem: &str) -> Result<Self, KeyError> {
        let key = DecodingKey::from_ed_pem(pem.as_bytes()).map_err(KeyError::InvalidPem)?;
        Ok(Self::Single(key))
    }

    /// Build from a JWK set document (`{"keys": [...]}`).
    ///
    /// Keys without `kid` cannot be selected and are rejected.
    pub fn from_jwks(json: &str) -> Result<Self, KeyError> {
        let set: JwkSet =
            serde_json::from_str(json).map_err(|e| KeyError::InvalidJwkSet(e.to_string()))?;

        let mut keys = Vec::with_capacity(set.keys.len());
        for jwk in &set.keys {
            let kid = jwk
                .common
                .key_id
                .clone()
                .ok_or_else(|| KeyError::InvalidJwkSet("jwk without 'kid'".to_string()))?;
            let key = DecodingKey::from_jwk(jwk)
                .map_err(|e| KeyError::InvalidJwkSet(format!("kid '{kid}': {e}")))?;
            keys.push((kid, key));
        }

        if keys.is_empty() {
            return Err(KeyError::InvalidJwkSet("no keys".to_string()));
        }

        Ok(Self::Set(keys))
    }
}

#[async_trait]
impl SigningKeys for StaticKeys {
    async fn decoding_key(&self, header: &Header) -> Result<DecodingKey, KeyError> {
        match self {
            StaticKeys::Single(key) => Ok(key.clone()),
            StaticKeys::Set(keys) => {
                let kid = header.kid.as_deref().ok_or(KeyError::MissingKid)?;
                keys.iter()
                    .find(|(k, _)| k == kid)
                    .map(|(_, key)| key.clone())
                    .ok_or_else(|| KeyError::UnknownKid(kid.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    const JWKS: &str = r#"{"keys":[{"kty":"OKP","crv":"Ed25519","kid":"k1","x":"bV6yfwQxXlNbfYA-czX6u-eZxYwtWhYkIlF6fay0IxM"}]}"#;

    #[tokio::test]
    async fn key_set_selects_by_kid() {
        let keys = StaticKeys::from_jwks(JWKS).unwrap();

        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some("k1".to_string());
        assert!(keys.decoding_key(&header).await.is_ok());

        header.kid = Some("k2".to_string());
        assert!(matches!(
            keys.decoding_key(&header).await,
            Err(KeyError::UnknownKid(kid)) if kid == "k2"
        ));

        header.kid = None;
        assert!(matches!(
            keys.decoding_key(&header).await,
            Err(KeyError::MissingKid)
        ));
    }

    #[test]
    fn empty_or_kidless_sets_are_rejected() {
        assert!(StaticKeys::from_jwks(r#"{"keys":[]}"#).is_err());
        assert!(StaticKeys::from_jwks(
            r#"{"keys":[{"kty":"OKP","crv":"Ed25519","x":"bV6yfwQxXlNbfYA-czX6u-eZxYwtWhYkIlF6fay0IxM"}]}"#
        )
        .is_err());
        assert!(StaticKeys::from_jwks("not json").is_err());
    }

    #[test]
    fn garbage_pem_is_rejected() {
        assert!(matches!(
            StaticKeys::from_ed_pem("not a pem document"),
            Err(KeyError::InvalidPem(_))
        ));
    }
}
