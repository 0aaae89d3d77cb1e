// Model fetching for the diarization API
//
// This module resolves the pretrained ONNX model files through the Hugging
// Face hub at startup, authenticated with the HF_TOKEN credential. The hub
// client caches downloads, so repeated startups reuse local files.

use hf_hub::api::sync::{ApiBuilder, ApiError};
use hf_hub::{Repo, RepoType};
use log::info;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::PipelineConfig;

const HF_TOKEN_VAR: &str = "HF_TOKEN";

/// Local paths of the fetched model files
#[derive(Debug, Clone)]
pub struct ModelFiles {
    /// pyannote segmentation model
    pub segmentation: PathBuf,
    /// Speaker embedding model
    pub embedding: PathBuf,
}

/// Model fetch error types
#[derive(Error, Debug)]
pub enum FetchError {
    /// The required hub credential is absent: fatal at startup
    #[error("HF_TOKEN environment variable is required")]
    MissingToken,
    /// The hub client failed to build or download
    #[error("Model hub error: {0}")]
    Hub(#[from] ApiError),
}

/// Read the required hub credential from the environment.
pub fn hub_token() -> Result<String, FetchError> {
    env::var(HF_TOKEN_VAR)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(FetchError::MissingToken)
}

/// Fetch the segmentation and embedding models named in the configuration.
///
/// Fails before the HTTP listener binds when the credential is missing or the
/// download cannot complete.
pub fn fetch_models(config: &PipelineConfig) -> Result<ModelFiles, FetchError> {
    let token = hub_token()?;

    let api = ApiBuilder::new().with_token(Some(token)).build()?;
    let repo = api.repo(Repo::new(config.model_repo.clone(), RepoType::Model));

    info!("Fetching diarization models from {}", config.model_repo);
    let segmentation = repo.get(&config.segmentation_file)?;
    let embedding = repo.get(&config.embedding_file)?;

    info!(
        "Models ready: segmentation={} embedding={}",
        segmentation.display(),
        embedding.display()
    );

    Ok(ModelFiles {
        segmentation,
        embedding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_fatal() {
        env::remove_var(HF_TOKEN_VAR);
        let err = hub_token().unwrap_err();
        assert!(matches!(err, FetchError::MissingToken));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        env::set_var(HF_TOKEN_VAR, "   ");
        let err = hub_token().unwrap_err();
        assert!(matches!(err, FetchError::MissingToken));
        env::remove_var(HF_TOKEN_VAR);
    }
}
