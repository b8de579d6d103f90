use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

static REPO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\b[\w\-.]+\b/)?\b[\w\-.]{1,96}\b$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error(
        "Invalid repo id '{model_id}': use 'name' or 'namespace/name' made of letters, digits, '-', '_' and '.'"
    )]
    InvalidRepoId { model_id: String },

    /// Unknown or gated repository.
    #[error("Repository not found: {model_id}")]
    RepositoryNotFound { model_id: String },

    #[error("Hub request for {model_id} failed with status {status}: {body}")]
    Status {
        model_id: String,
        status: u16,
        body: String,
    },

    #[error("Hub request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid hub response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Subset of `/api/models/{id}` used for classification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub config: Option<ModelConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub model_type: Option<String>,
    #[serde(default)]
    pub diffusers: Option<DiffusersConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept any JSON value; non-strings are kept in their JSON form so a
/// malformed config is classified instead of failing the request.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl ModelConfig {
    pub fn is_empty(&self) -> bool {
        self.model_type.is_none() && self.diffusers.is_none() && self.extra.is_empty()
    }

    pub fn diffusion_class_name(&self) -> Option<&str> {
        self.diffusers.as_ref()?.class_name.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffusersConfig {
    #[serde(rename = "_class_name", default, deserialize_with = "lenient_string")]
    pub class_name: Option<String>,
}

pub trait ModelHub {
    fn model_info(
        &self,
        model_id: &str,
    ) -> impl Future<Output = Result<ModelInfo, HubError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpHub {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpHub {
    pub fn new(config: &HubConfig) -> Result<Self, HubError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("optimum-support/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpHub {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn model_url(&self, model_id: &str) -> String {
        format!("{}/api/models/{}", self.endpoint, model_id)
    }
}

/// Repository id check of `huggingface_hub`: an optional `namespace/` then
/// a name of at most 96 characters; no `--` or `..`, and no leading or
/// trailing `-` or `.`.
pub fn validate_repo_id(model_id: &str) -> Result<(), HubError> {
    if REPO_ID_RE.is_match(model_id) && !model_id.contains("--") && !model_id.contains("..") {
        Ok(())
    } else {
        Err(HubError::InvalidRepoId {
            model_id: model_id.to_string(),
        })
    }
}

/// The hub answers 401 for unknown repositories when the caller is
/// anonymous, and tags gated repositories with `X-Error-Code: GatedRepo`.
pub fn is_not_found(status: StatusCode, error_code: Option<&str>) -> bool {
    match error_code {
        Some("RepoNotFound") | Some("GatedRepo") => true,
        Some(_) => status == StatusCode::NOT_FOUND,
        None => status == StatusCode::NOT_FOUND || status == StatusCode::UNAUTHORIZED,
    }
}

impl ModelHub for HttpHub {
    async fn model_info(&self, model_id: &str) -> Result<ModelInfo, HubError> {
        validate_repo_id(model_id)?;
        let mut request = self.client.get(self.model_url(model_id));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let status = resp.status();
        let error_code = resp
            .headers()
            .get("x-error-code")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if is_not_found(status, error_code.as_deref()) {
            return Err(HubError::RepositoryNotFound {
                model_id: model_id.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HubError::Status {
                model_id: model_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
