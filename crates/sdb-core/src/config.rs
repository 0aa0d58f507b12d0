use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// Generation mode, derived from which inputs a run was given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Text2Img,
    Img2Img,
    Inpaint,
}

impl Mode {
    /// Mode name for logs
    pub fn name(&self) -> &str {
        match self {
            Self::Text2Img => "Text to image",
            Self::Img2Img => "Image to image",
            Self::Inpaint => "Inpainting",
        }
    }

    /// Mode ID for engine communication
    pub fn id(&self) -> &str {
        match self {
            Self::Text2Img => "text2img",
            Self::Img2Img => "img2img",
            Self::Inpaint => "inpaint",
        }
    }

    /// Whether the run starts from an injected initial image
    pub fn has_init_image(&self) -> bool {
        matches!(self, Self::Img2Img | Self::Inpaint)
    }
}

/// What a batch does when one of its runs fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole batch at the first failing run
    #[default]
    AbortOnFirstFailure,
    /// Record the failure and keep going, then report every failed run
    ContinueAndReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub model: String,
    pub tokenizer: String,
    pub prompt: String,
    pub seed: Option<i64>,
    pub beta_start: f64,
    pub beta_end: f64,
    pub beta_schedule: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub eta: f64,
    pub init_image: Option<PathBuf>,
    pub mask: Option<PathBuf>,
    pub strength: f64,
    pub output: PathBuf,
    pub batch: i64,
    pub failure_policy: FailurePolicy,
}

impl RunConfig {
    /// Recomputed on every call so it can never drift from the input fields.
    pub fn mode(&self) -> Mode {
        match (&self.init_image, &self.mask) {
            (None, _) => Mode::Text2Img,
            (Some(_), None) => Mode::Img2Img,
            (Some(_), Some(_)) => Mode::Inpaint,
        }
    }

    /// Number of runs the batch performs; anything below 2 is a single run.
    pub fn run_count(&self) -> u32 {
        self.batch.clamp(1, u32::MAX as i64) as u32
    }

    pub fn validate(&self) -> Result<()> {
        // Strength only matters once there is an init image to blend with
        if self.mode().has_init_image() && !(0.0..=1.0).contains(&self.strength) {
            return Err(Error::Configuration(format!(
                "strength must be within [0.0, 1.0], got {}",
                self.strength
            )));
        }
        if self.num_inference_steps == 0 {
            return Err(Error::Configuration(
                "num-inference-steps must be at least 1".to_string(),
            ));
        }
        if !self.guidance_scale.is_finite() || !self.eta.is_finite() {
            return Err(Error::Configuration(
                "guidance-scale and eta must be finite numbers".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "bes-dev/stable-diffusion-v1-4-openvino".to_string(),
            tokenizer: "openai/clip-vit-large-patch14".to_string(),
            prompt: "Street-art painting of Emilia Clarke in style of Banksy, photorealism".to_string(),
            seed: None,
            beta_start: 0.00085,
            beta_end: 0.012,
            beta_schedule: "scaled_linear".to_string(),
            num_inference_steps: 32,
            guidance_scale: 7.5,
            eta: 0.0,
            init_image: None,
            mask: None,
            strength: 0.5,
            output: PathBuf::from("output.png"),
            batch: 1,
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_detection() {
        let mut config = RunConfig::default();
        assert_eq!(config.mode(), Mode::Text2Img);

        config.mask = Some(PathBuf::from("mask.png"));
        assert_eq!(config.mode(), Mode::Text2Img);

        config.init_image = Some(PathBuf::from("photo.png"));
        assert_eq!(config.mode(), Mode::Inpaint);

        config.mask = None;
        assert_eq!(config.mode(), Mode::Img2Img);
    }

    #[test]
    fn test_mode_ids() {
        assert_eq!(Mode::Text2Img.id(), "text2img");
        assert_eq!(Mode::Inpaint.id(), "inpaint");
        assert!(Mode::Img2Img.has_init_image());
        assert!(!Mode::Text2Img.has_init_image());
    }

    #[test]
    fn test_run_count() {
        let mut config = RunConfig::default();
        config.batch = 0;
        assert_eq!(config.run_count(), 1);
        config.batch = -1;
        assert_eq!(config.run_count(), 1);
        config.batch = 3;
        assert_eq!(config.run_count(), 3);
    }

    #[test]
    fn test_validate_strength() {
        let mut config = RunConfig {
            init_image: Some(PathBuf::from("photo.png")),
            ..RunConfig::default()
        };
        assert!(config.validate().is_ok());

        config.strength = 1.5;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_text2img_ignores_strength() {
        let config = RunConfig { strength: 1.5, ..RunConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_steps() {
        let config = RunConfig { num_inference_steps: 0, ..RunConfig::default() };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
