#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use patient_api::app::build_router;
use patient_api::config::HttpLimits;
use patient_api::services::auth::{StaticKeys, TokenSettings, TokenValidator};
use patient_api::services::policy::PolicyRegistry;
use patient_api::services::telemetry::TelemetrySink;
use patient_api::state::AppState;

pub const TRUSTED_PRIVATE: &str = include_str!("../fixtures/trusted_private.pem");
pub const TRUSTED_PUBLIC: &str = include_str!("../fixtures/trusted_public.pem");
pub const UNTRUSTED_PRIVATE: &str = include_str!("../fixtures/untrusted_private.pem");

pub const ISSUER: &str = "https://cloudpharmacy.b2clogin.com/tenant-id/v2.0/";
pub const AUDIENCE: &str = "patient-api";

pub fn state(telemetry: Arc<dyn TelemetrySink>) -> AppState {
    let keys = StaticKeys::from_ed_pem(TRUSTED_PUBLIC).unwrap();
    let validator = TokenValidator::new(
        Arc::new(keys),
        TokenSettings {
            issuer: ISSUER.to_string(),
            audiences: vec![AUDIENCE.to_string()],
            leeway_seconds: 0,
            algorithms: vec![Algorithm::EdDSA],
        },
    );

    AppState::new(
        Arc::new(validator),
        Arc::new(PolicyRegistry::defaults().unwrap()),
        telemetry,
    )
}

pub fn app(state: AppState, operations: Router<AppState>) -> Router {
    build_router(state, operations, HttpLimits::default())
}

pub fn claims(scp: &str) -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "0b7d9c4e-5a1f-4c53-9a55-2f0c8f1b7e11",
        "exp": chrono::Utc::now().timestamp() + 600,
        "scp": scp,
    })
}

pub fn sign(private_pem: &str, claims: &Value) -> String {
    let key = EncodingKey::from_ed_pem(private_pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &key).unwrap()
}

pub fn patient_token() -> String {
    sign(
        TRUSTED_PRIVATE,
        &claims("openid profile offline_access patient.access"),
    )
}

pub fn request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
