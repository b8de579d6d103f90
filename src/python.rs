use crate::classifier::ModelSupportChecker;
use crate::hub::{HttpHub, HubConfig};
use crate::snapshot::CompatibilitySnapshot;
use pyo3::{exceptions::PyRuntimeError, prelude::*};
use std::sync::Arc;

/// Check a model against the vendored compatibility table and return the
/// result message.
#[pyfunction]
#[pyo3(signature = (model_id, token=None))]
fn show_is_supported(py: Python<'_>, model_id: String, token: Option<String>) -> PyResult<String> {
    py.allow_threads(move || {
        let snapshot = CompatibilitySnapshot::vendored()
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to load snapshot: {}", e)))?;
        let hub = HttpHub::new(&HubConfig {
            token: token.or_else(|| std::env::var("HF_TOKEN").ok()),
            ..HubConfig::default()
        })
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        let checker = ModelSupportChecker::new(hub, Arc::new(snapshot));
        actix_web::rt::System::new()
            .block_on(checker.check(&model_id))
            .map(|c| c.to_string())
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    })
}

#[pymodule]
fn _rust(_py: Python, m: &Bound<PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(show_is_supported, m)?)?;
    Ok(())
}
