#![allow(dead_code)]

use optimum_support_rs::hub::{HubError, ModelHub, ModelInfo, validate_repo_id};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// In-memory hub: malformed ids are rejected like the real client does,
/// known ids return their metadata, unknown ids are not found, and ids
/// marked failing answer with a rate-limit error.
#[derive(Debug, Clone, Default)]
pub struct FakeHub {
    models: HashMap<String, Value>,
    failing: HashSet<String>,
}

impl FakeHub {
    pub fn with_model(mut self, model_id: &str, config: Option<Value>) -> Self {
        let mut info = json!({ "id": model_id });
        if let Some(config) = config {
            info["config"] = config;
        }
        self.models.insert(model_id.to_string(), info);
        self
    }

    pub fn with_model_type(self, model_id: &str, model_type: &str) -> Self {
        self.with_model(model_id, Some(json!({ "model_type": model_type })))
    }

    pub fn with_diffusers(self, model_id: &str, class_name: &str) -> Self {
        self.with_model(
            model_id,
            Some(json!({ "diffusers": { "_class_name": class_name } })),
        )
    }

    pub fn with_failure(mut self, model_id: &str) -> Self {
        self.failing.insert(model_id.to_string());
        self
    }
}

impl ModelHub for FakeHub {
    async fn model_info(&self, model_id: &str) -> Result<ModelInfo, HubError> {
        validate_repo_id(model_id)?;
        if self.failing.contains(model_id) {
            return Err(HubError::Status {
                model_id: model_id.to_string(),
                status: 429,
                body: "Too Many Requests".to_string(),
            });
        }
        match self.models.get(model_id) {
            Some(info) => Ok(serde_json::from_value(info.clone())?),
            None => Err(HubError::RepositoryNotFound {
                model_id: model_id.to_string(),
            }),
        }
    }
}

/// Hub metadata of the models used as end-to-end fixtures, as the hub
/// reports it.
pub fn fixture_hub() -> FakeHub {
    FakeHub::default()
        .with_model_type("openai/whisper-small", "whisper")
        .with_model("Ultralytics/YOLO11", None)
        .with_model_type("openai/gpt-oss-20b", "gpt_oss")
        .with_model_type("ibm-granite/granite-3.1-8b-instruct", "granite")
        .with_diffusers(
            "stabilityai/stable-diffusion-xl-base-1.0",
            "StableDiffusionXLPipeline",
        )
        .with_model_type("microsoft/Phi-4-multimodal-instruct", "phi4mm")
        .with_model_type("google-bert/bert-base-uncased", "bert")
        .with_model_type("rednote-hilab/dots.ocr", "dots_ocr")
        .with_model_type("LiquidAI/LFM2-350M", "lfm2")
        .with_model_type("google/mobilenet_v2_1.0_224", "mobilenet_v2")
        .with_diffusers(
            "stabilityai/stable-diffusion-3.5-large",
            "StableDiffusion3Pipeline",
        )
        .with_model("stabilityai/sp4d", Some(json!({})))
        .with_diffusers(
            "SimianLuo/LCM_Dreamshaper_v7",
            "LatentConsistencyModelPipeline",
        )
        .with_diffusers(
            "stabilityai/sd-x2-latent-upscaler",
            "StableDiffusionLatentUpscalePipeline",
        )
        .with_model_type("openbmb/MiniCPM3-4B", "minicpm3")
        .with_model("Efficient-Large-Model/SANA-Video_2B_480p", None)
        .with_diffusers(
            "optimum-intel-internal-testing/tiny-random-sana-sprint",
            "SanaSprintPipeline",
        )
}

/// (model id, expected substring of the result message)
pub const FIXTURES: [(&str, &str); 18] = [
    ("openai/whisper-small", "is **supported**"),
    ("Ultralytics/YOLO11", "is **not supported**"),
    ("test/non-existing", "was not found on the Hugging Face hub"),
    ("openai/gpt-oss-20b", "is **supported**"),
    ("ibm-granite/granite-3.1-8b-instruct", "is **supported**"),
    ("stabilityai/stable-diffusion-xl-base-1.0", "is **supported**"),
    ("microsoft/Phi-4-multimodal-instruct", "is **supported**"),
    ("google-bert/bert-base-uncased", "is **supported**"),
    (
        "rednote-hilab/dots.ocr",
        "is not in the list of supported architectures",
    ),
    ("LiquidAI/LFM2-350M", "is **supported**"),
    ("google/mobilenet_v2_1.0_224", "is **supported**"),
    ("stabilityai/stable-diffusion-3.5-large", "is **supported**"),
    ("stabilityai/sp4d", "is **not supported**"),
    ("SimianLuo/LCM_Dreamshaper_v7", "is **supported**"),
    ("stabilityai/sd-x2-latent-upscaler", "is not in the list"),
    ("openbmb/MiniCPM3-4B", "is **supported**"),
    ("Efficient-Large-Model/SANA-Video_2B_480p", "is **not supported**"),
    (
        "optimum-intel-internal-testing/tiny-random-sana-sprint",
        "is **supported**",
    ),
];

pub const DECODER_TESTS: &str = r#"
import unittest

from transformers import AutoModelForCausalLM
from optimum.intel.utils.import_utils import is_transformers_version


class OVModelForCausalLMIntegrationTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = (
        "gpt2",
        "llama",  # remote code variants are covered elsewhere
    )

    if is_transformers_version(">=", "4.46.0"):
        SUPPORTED_ARCHITECTURES += ("glm", "granite")

    if is_transformers_version(">=", "4.54.0"):
        SUPPORTED_ARCHITECTURES += ("lfm2",)

    if is_transformers_version("<", "4.47.0"):
        SUPPORTED_ARCHITECTURES += ("qwen",)

    def test_compare_to_transformers(self):
        """Docstring mentioning SUPPORTED_ARCHITECTURES = ("fake",)"""
        pass
"#;

pub const SEQ2SEQ_TESTS: &str = r#"
class OVModelForSpeechSeq2SeqIntegrationTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = ("whisper",)
"#;

pub const MODELING_TESTS: &str = r#"
class OVModelForSequenceClassificationIntegrationTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = (
        "bert",
        "distilbert",
    )


class OVModelForMaskedLMIntegrationTest(OVModelForSequenceClassificationIntegrationTest):
    pass
"#;

pub const DIFFUSION_TESTS: &str = r#"
class OVPipelineForText2ImageTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = ["stable-diffusion", "stable-diffusion-xl"]
"#;

pub const MODELING_DIFFUSION: &str = r#"
class OVDiffusionPipeline(OVBaseModel, DiffusionPipeline):
    auto_model_class = None


class OVStableDiffusionPipeline(OVDiffusionPipeline, StableDiffusionPipeline):
    auto_model_class = StableDiffusionPipeline


class OVStableDiffusionXLPipeline(OVDiffusionPipeline, StableDiffusionXLPipeline):
    auto_model_class = StableDiffusionXLPipeline


SUPPORTED_OV_PIPELINES = [
    OVStableDiffusionPipeline,
    OVStableDiffusionXLPipeline,
]
"#;

pub const SETUP: &str = r#"
INSTALL_REQUIRE = [
    "torch>=1.11",
    "transformers<4.57,>=4.45",
    "setuptools",
]
"#;

pub const VERSION: &str = "__version__ = \"1.26.0.dev0\"\n";

/// Lay out the files of a minimal optimum-intel checkout under `root`.
pub fn write_checkout(root: &Path) {
    let files = [
        ("tests/openvino/test_decoder.py", DECODER_TESTS),
        ("tests/openvino/test_seq2seq.py", SEQ2SEQ_TESTS),
        ("tests/openvino/test_modeling.py", MODELING_TESTS),
        ("tests/openvino/test_diffusion.py", DIFFUSION_TESTS),
        ("optimum/intel/openvino/modeling_diffusion.py", MODELING_DIFFUSION),
        ("setup.py", SETUP),
        ("optimum/intel/version.py", VERSION),
    ];
    for (path, content) in files {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}
