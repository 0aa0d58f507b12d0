use std::path::PathBuf;
use clap::{Parser, ValueEnum};
use sdb_core::{FailurePolicy, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "sdbatch")]
#[command(about = "Batch text2img / img2img / inpainting runs with embedded provenance")]
#[command(version)]
pub struct Args {
    /// Model name
    #[arg(long, default_value = "bes-dev/stable-diffusion-v1-4-openvino")]
    pub model: String,

    /// Random seed for generating consistent images per prompt
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Scheduler beta_start
    #[arg(long, default_value_t = 0.00085)]
    pub beta_start: f64,

    /// Scheduler beta_end
    #[arg(long, default_value_t = 0.012)]
    pub beta_end: f64,

    /// Scheduler beta_schedule (linear, scaled_linear, squaredcos_cap_v2)
    #[arg(long, default_value = "scaled_linear")]
    pub beta_schedule: String,

    /// Number of inference steps
    #[arg(long, default_value_t = 32)]
    pub num_inference_steps: u32,

    /// Guidance scale
    #[arg(long, default_value_t = 7.5)]
    pub guidance_scale: f64,

    /// Eta
    #[arg(long, default_value_t = 0.0)]
    pub eta: f64,

    /// Tokenizer
    #[arg(long, default_value = "openai/clip-vit-large-patch14")]
    pub tokenizer: String,

    /// Prompt
    #[arg(
        long,
        default_value = "Street-art painting of Emilia Clarke in style of Banksy, photorealism"
    )]
    pub prompt: String,

    /// Path to initial image
    #[arg(long, value_name = "FILE")]
    pub init_image: Option<PathBuf>,

    /// How strong the initial image should be noised [0.0, 1.0]
    #[arg(long, default_value_t = 0.5)]
    pub strength: f64,

    /// Mask of the region to inpaint on the initial image
    #[arg(long, value_name = "FILE")]
    pub mask: Option<PathBuf>,

    /// Output image name
    #[arg(long, value_name = "FILE", default_value = "output.png")]
    pub output: PathBuf,

    /// Run prompts in batch N times
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub batch: i64,

    /// What to do when a run in a batch fails
    #[arg(long, value_enum, default_value = "abort")]
    pub on_failure: OnFailure,

    /// Engine backend
    #[arg(long, value_enum, default_value = "service")]
    pub engine: EngineKind,

    /// Inference service URL, overrides SDB_ENGINE_URL
    #[arg(long)]
    pub engine_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnFailure {
    Abort,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Local inference service over HTTP
    Service,
    /// Offline synthetic renderer
    Placeholder,
}

impl Args {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            model: self.model.clone(),
            tokenizer: self.tokenizer.clone(),
            prompt: self.prompt.clone(),
            seed: self.seed,
            beta_start: self.beta_start,
            beta_end: self.beta_end,
            beta_schedule: self.beta_schedule.clone(),
            num_inference_steps: self.num_inference_steps,
            guidance_scale: self.guidance_scale,
            eta: self.eta,
            init_image: self.init_image.clone(),
            mask: self.mask.clone(),
            strength: self.strength,
            output: self.output.clone(),
            batch: self.batch,
            failure_policy: match self.on_failure {
                OnFailure::Abort => FailurePolicy::AbortOnFirstFailure,
                OnFailure::Continue => FailurePolicy::ContinueAndReport,
            },
        }
    }
}
