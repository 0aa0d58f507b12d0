use std::path::{Path, PathBuf};
use std::time::Duration;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sdb_core::error::{Error, Result};
use sdb_core::pixels::{self, BgrImage, MaskImage};
use sdb_core::{Engine, GenerationRequest, GenerationResult, GeneratorHandle, SchedulerSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Base URL of the inference service, without a trailing `/generate`
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    tokenizer: &'a str,
    mode: &'a str,
    prompt: &'a str,
    init_image: Option<&'a BgrImage>,
    mask: Option<&'a MaskImage>,
    strength: f64,
    num_inference_steps: u32,
    guidance_scale: f64,
    eta: f64,
    scheduler: &'a SchedulerSpec,
    noise_seed: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    status: String,
    output_path: Option<String>,
    error: Option<String>,
}

/// Engine backed by a local inference service speaking JSON over HTTP.
///
/// The service writes the finished image to disk and answers with its path.
pub struct ServiceEngine {
    client: reqwest::blocking::Client,
    config: ServiceConfig,
}

impl ServiceEngine {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Engine(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/generate", self.config.base_url.trim_end_matches('/'))
    }
}

impl Engine for ServiceEngine {
    fn name(&self) -> &str {
        "inference service"
    }

    fn invoke(
        &mut self,
        request: GenerationRequest,
        generator: &mut GeneratorHandle,
    ) -> Result<GenerationResult> {
        let mode = request.mode();
        let body = GenerateRequest {
            model: &request.model,
            tokenizer: &request.tokenizer,
            mode: mode.id(),
            prompt: &request.prompt,
            init_image: request.init_image.as_ref(),
            mask: request.mask.as_ref(),
            strength: request.strength,
            num_inference_steps: request.num_inference_steps,
            guidance_scale: request.guidance_scale,
            eta: request.eta,
            scheduler: &request.scheduler,
            noise_seed: generator.r#gen(),
        };

        let url = self.endpoint();
        info!("Sending {} request to {}", mode.id(), url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| Error::Engine(format!(
                "Failed to connect to inference service at {}: {}",
                url, e
            )))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(Error::Engine(format!("HTTP {}: {}", status, text)));
        }

        let result: GenerateResponse = response
            .json()
            .map_err(|e| Error::Engine(format!("Failed to parse response: {}", e)))?;

        let output_path = interpret_response(result)?;
        debug!("Service wrote {}", output_path.display());
        load_result(&output_path)
    }
}

fn interpret_response(result: GenerateResponse) -> Result<PathBuf> {
    match result.status.as_str() {
        "success" => result
            .output_path
            .map(PathBuf::from)
            .ok_or_else(|| Error::Engine("No output path returned".to_string())),
        "error" => {
            let error_msg = result.error.unwrap_or_else(|| "Unknown error".to_string());
            Err(Error::Engine(format!("Service error: {}", error_msg)))
        }
        other => Err(Error::Engine(format!("Unexpected status: {}", other))),
    }
}

fn load_result(path: &Path) -> Result<GenerationResult> {
    if !path.exists() {
        return Err(Error::Engine(format!(
            "Generated file not found at: {}",
            path.display()
        )));
    }
    let image = pixels::decode_bgr(path)
        .map_err(|e| Error::Engine(format!("Unreadable engine output: {}", e)))?;
    GenerationResult::new(image)
}
