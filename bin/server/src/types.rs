//! JSON bodies returned by the server.

use serde::Serialize;

/// Name reported by the landing endpoint.
pub const SERVICE_NAME: &str = "authentication-service";

/// Body of `GET /`.
#[derive(Clone, Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
}

/// Body of `GET /login`: the login methods currently offered.
#[derive(Clone, Debug, Serialize)]
pub struct LoginOptions {
    pub form: FormLoginOption,
    /// Token every form post must echo back.
    pub csrf: CsrfOption,
    /// Empty when no provider is registered.
    pub providers: Vec<ProviderOption>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FormLoginOption {
    pub action: &'static str,
    pub method: &'static str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfOption {
    pub parameter_name: &'static str,
    pub token: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOption {
    pub id: String,
    pub name: String,
    pub authorization_url: String,
}
