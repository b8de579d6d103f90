use crate::hub::{HubError, ModelHub};
use crate::snapshot::CompatibilitySnapshot;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

const INTEGRATION: &str = "optimum-intel[openvino]";

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// Outcome of a support check. Rendered with [`fmt::Display`] as the
/// markdown message shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    SupportedModelType { model_id: String, model_type: String },
    SupportedDiffusionClass { model_id: String, class_name: String },
    /// No config on the hub to classify against.
    NoConfig { model_id: String },
    UnlistedModelType { model_id: String, model_type: String },
    UnlistedDiffusion {
        model_id: String,
        class_name: Option<String>,
    },
    NotFound { model_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    Supported,
    NotSupported,
    LikelyNotSupported,
    NotFound,
}

impl SupportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportStatus::Supported => "supported",
            SupportStatus::NotSupported => "not_supported",
            SupportStatus::LikelyNotSupported => "likely_not_supported",
            SupportStatus::NotFound => "not_found",
        }
    }
}

impl Classification {
    pub fn status(&self) -> SupportStatus {
        match self {
            Classification::SupportedModelType { .. }
            | Classification::SupportedDiffusionClass { .. } => SupportStatus::Supported,
            Classification::NoConfig { .. } => SupportStatus::NotSupported,
            Classification::UnlistedModelType { .. } | Classification::UnlistedDiffusion { .. } => {
                SupportStatus::LikelyNotSupported
            }
            Classification::NotFound { .. } => SupportStatus::NotFound,
        }
    }

    pub fn model_id(&self) -> &str {
        match self {
            Classification::SupportedModelType { model_id, .. }
            | Classification::SupportedDiffusionClass { model_id, .. }
            | Classification::NoConfig { model_id }
            | Classification::UnlistedModelType { model_id, .. }
            | Classification::UnlistedDiffusion { model_id, .. }
            | Classification::NotFound { model_id } => model_id,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::SupportedModelType {
                model_id,
                model_type,
            } => write!(
                f,
                "`{model_id}` with model type `{model_type}` is **supported** by {INTEGRATION}."
            ),
            Classification::SupportedDiffusionClass {
                model_id,
                class_name,
            } => write!(
                f,
                "`{model_id}` with diffusion class `{class_name}` is **supported** by {INTEGRATION}."
            ),
            Classification::NoConfig { model_id } => {
                write!(f, "`{model_id}` is **not supported** by {INTEGRATION}.")
            }
            Classification::UnlistedModelType {
                model_id,
                model_type,
            } => write!(
                f,
                "`{model_id}` with model type `{model_type}` is not in the list of supported architectures by {INTEGRATION}. It is **likely not supported**, but it is wise to doublecheck"
            ),
            Classification::UnlistedDiffusion { model_id, .. } => write!(
                f,
                "`{model_id}` is not in the list of supported architectures by {INTEGRATION}. It is **likely not supported**, but it is wise to doublecheck"
            ),
            Classification::NotFound { model_id } => write!(
                f,
                "Model {model_id} was not found on the Hugging Face hub. Make sure you entered the correct model_id. If the model requires authentication, use `hf auth login` or a token to authenticate."
            ),
        }
    }
}

pub struct ModelSupportChecker<H> {
    hub: H,
    snapshot: Arc<CompatibilitySnapshot>,
}

impl<H: ModelHub> ModelSupportChecker<H> {
    pub fn new(hub: H, snapshot: Arc<CompatibilitySnapshot>) -> Self {
        ModelSupportChecker { hub, snapshot }
    }

    pub fn snapshot(&self) -> &CompatibilitySnapshot {
        &self.snapshot
    }

    pub async fn check(&self, model_id: &str) -> Result<Classification, CheckError> {
        log::info!("Checking {}...", model_id);
        let aggregate = self.snapshot.aggregate();

        let classification = match self.hub.model_info(model_id).await {
            Err(HubError::RepositoryNotFound { .. }) => Classification::NotFound {
                model_id: model_id.to_string(),
            },
            Err(e) => return Err(e.into()),
            Ok(info) => {
                let model_id = model_id.to_string();
                match info.config.filter(|c| !c.is_empty()) {
                    None => Classification::NoConfig { model_id },
                    Some(config) => match config.model_type.clone() {
                        Some(model_type) if aggregate.architectures.contains(&model_type) => {
                            Classification::SupportedModelType {
                                model_id,
                                model_type,
                            }
                        }
                        Some(model_type) => Classification::UnlistedModelType {
                            model_id,
                            model_type,
                        },
                        None => {
                            let class_name = config.diffusion_class_name().map(str::to_string);
                            match class_name {
                                Some(class_name)
                                    if self.snapshot.diffusion_classes().contains(&class_name) =>
                                {
                                    Classification::SupportedDiffusionClass {
                                        model_id,
                                        class_name,
                                    }
                                }
                                class_name => Classification::UnlistedDiffusion {
                                    model_id,
                                    class_name,
                                },
                            }
                        }
                    },
                }
            }
        };

        let versions = aggregate
            .versions
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        log::info!(
            "Using transformers: [{}]. Total number of supported architectures: {}",
            versions.join(", "),
            aggregate.architectures.len()
        );
        log::info!("{}", classification);
        Ok(classification)
    }
}
