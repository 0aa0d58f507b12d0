use log::{info, warn};
use crate::config::{Mode, RunConfig};
use crate::error::Result;
use crate::pixels::{self, BgrImage, MaskImage};
use crate::scheduler::SchedulerSpec;

/// Everything the engine needs for one image synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub tokenizer: String,
    pub prompt: String,
    pub init_image: Option<BgrImage>,
    pub mask: Option<MaskImage>,
    pub strength: f64,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub eta: f64,
    pub scheduler: SchedulerSpec,
}

impl GenerationRequest {
    /// Decodes the init image and mask, if any. Strength and mask are
    /// passed through untouched; interpreting them is up to the engine.
    pub fn build(config: &RunConfig, scheduler: SchedulerSpec) -> Result<Self> {
        let init_image = config
            .init_image
            .as_deref()
            .map(pixels::decode_bgr)
            .transpose()?;
        let mask = config
            .mask
            .as_deref()
            .map(pixels::decode_mask)
            .transpose()?;

        let mode = config.mode();
        if mask.is_some() && mode == Mode::Text2Img {
            warn!("Mask given without an init image; text2img ignores it");
        }
        info!("{} request with {}", mode.name(), scheduler.kind.name());

        Ok(Self {
            model: config.model.clone(),
            tokenizer: config.tokenizer.clone(),
            prompt: config.prompt.clone(),
            init_image,
            mask,
            strength: config.strength,
            num_inference_steps: config.num_inference_steps,
            guidance_scale: config.guidance_scale,
            eta: config.eta,
            scheduler,
        })
    }

    pub fn mode(&self) -> Mode {
        match (&self.init_image, &self.mask) {
            (None, _) => Mode::Text2Img,
            (Some(_), None) => Mode::Img2Img,
            (Some(_), Some(_)) => Mode::Inpaint,
        }
    }
}
