use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use log::info;
use rand::Rng;
use sdb_core::error::{Error, Result};
use sdb_core::pixels::{BgrImage, MaskImage, OUTPUT_SIZE};
use sdb_core::{Engine, GenerationRequest, GenerationResult, GeneratorHandle};

/// Offline engine that renders a synthetic scene instead of running a model.
///
/// Output depends only on the request and the generator, so a seeded run
/// always produces the same pixels. Useful for dry runs of a batch setup
/// without an inference service.
#[derive(Debug, Default)]
pub struct PlaceholderEngine;

impl PlaceholderEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for PlaceholderEngine {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn invoke(
        &mut self,
        request: GenerationRequest,
        generator: &mut GeneratorHandle,
    ) -> Result<GenerationResult> {
        info!(
            "Rendering placeholder for '{}' ({} steps, guidance {})",
            request.prompt, request.num_inference_steps, request.guidance_scale
        );

        let base_color = extract_color_from_prompt(&request.prompt);
        let mut rendered = render_scene(base_color, generator);
        add_grain(&mut rendered, request.eta, generator);

        if let Some(init) = &request.init_image {
            let init = fit_to_output(init)?;
            let mask = request.mask.as_ref().map(fit_mask).transpose()?;
            blend_with_init(&mut rendered, &init, mask.as_ref(), request.strength);
        }

        GenerationResult::new(BgrImage::new(OUTPUT_SIZE, OUTPUT_SIZE, rendered.into_raw())?)
    }
}

/// Color hint from the prompt, in BGR order
fn extract_color_from_prompt(prompt: &str) -> [u8; 3] {
    let prompt_lower = prompt.to_lowercase();

    if prompt_lower.contains("red") {
        [100, 100, 255]
    } else if prompt_lower.contains("blue") {
        [255, 100, 100]
    } else if prompt_lower.contains("green") {
        [100, 255, 100]
    } else if prompt_lower.contains("yellow") {
        [100, 255, 255]
    } else if prompt_lower.contains("purple") {
        [255, 100, 200]
    } else {
        [180, 150, 150]
    }
}

/// Lit sphere over a gradient; the light direction comes from the generator.
/// The buffer is an `RgbImage` only for its layout, channels are BGR.
fn render_scene(base_color: [u8; 3], generator: &mut GeneratorHandle) -> RgbImage {
    let size = OUTPUT_SIZE;
    let center = size as f32 / 2.0;
    let radius = 150.0;
    let light_angle: f32 = generator.gen_range(0.0..std::f32::consts::TAU);

    RgbImage::from_fn(size, size, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist < radius {
            let depth = (1.0 - (dist / radius).powi(2)).sqrt();
            let brightness = depth * 0.7 + 0.3;

            let light_dx = dx - light_angle.cos() * 100.0;
            let light_dy = dy - light_angle.sin() * 100.0;
            let light_dist = (light_dx * light_dx + light_dy * light_dy).sqrt();
            let light_factor = (1.0 - (light_dist / 300.0).min(1.0)) * 0.3 + 0.7;

            let shade = brightness * light_factor;
            image::Rgb(base_color.map(|c| (c as f32 * shade) as u8))
        } else {
            let bg = 0.2 + (y as f32 / size as f32) * 0.1;
            image::Rgb([(60.0 * bg) as u8, (50.0 * bg) as u8, (50.0 * bg) as u8])
        }
    })
}

/// Per-pixel noise, stronger with higher eta
fn add_grain(img: &mut RgbImage, eta: f64, generator: &mut GeneratorHandle) {
    let amplitude = 4 + (eta.clamp(0.0, 1.0) * 12.0) as i16;
    for value in img.iter_mut() {
        let offset = generator.gen_range(-amplitude..=amplitude);
        *value = (*value as i16 + offset).clamp(0, 255) as u8;
    }
}

fn fit_to_output(init: &BgrImage) -> Result<RgbImage> {
    let buf = RgbImage::from_raw(init.width, init.height, init.data.clone())
        .ok_or_else(|| Error::Engine("init image buffer does not match its size".to_string()))?;
    Ok(imageops::resize(&buf, OUTPUT_SIZE, OUTPUT_SIZE, FilterType::Triangle))
}

fn fit_mask(mask: &MaskImage) -> Result<GrayImage> {
    let buf = GrayImage::from_raw(mask.width, mask.height, mask.data.clone())
        .ok_or_else(|| Error::Engine("mask buffer does not match its size".to_string()))?;
    Ok(imageops::resize(&buf, OUTPUT_SIZE, OUTPUT_SIZE, FilterType::Nearest))
}

/// Keep `1 - strength` of the init image; with a mask, dark pixels keep
/// the init image untouched.
fn blend_with_init(rendered: &mut RgbImage, init: &RgbImage, mask: Option<&GrayImage>, strength: f64) {
    let strength = strength.clamp(0.0, 1.0) as f32;

    for (x, y, pixel) in rendered.enumerate_pixels_mut() {
        let keep_init = mask.is_some_and(|m| m.get_pixel(x, y)[0] < 128);
        let source = init.get_pixel(x, y);
        for c in 0..3 {
            pixel[c] = if keep_init {
                source[c]
            } else {
                (source[c] as f32 * (1.0 - strength) + pixel[c] as f32 * strength).round() as u8
            };
        }
    }
}
