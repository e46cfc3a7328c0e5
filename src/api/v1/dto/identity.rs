use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub issuer: String,
    pub subject: String,
    pub scopes: Vec<String>,
}
