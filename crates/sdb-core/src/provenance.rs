use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use chrono::{DateTime, Local};
use log::info;
use crate::config::RunConfig;
use crate::engine::GenerationResult;
use crate::error::{Error, Result};

pub const TOOL_ID: &str = "stable diffusion openvino 1.4";
pub const DIMENSION_LABEL: &str = "512x512";
/// Written in place of a seed when the run was unseeded
pub const NO_SEED: &str = "None";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Ordered key/value text embedded in every output image
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceRecord {
    entries: Vec<(String, String)>,
}

impl ProvenanceRecord {
    pub fn new(config: &RunConfig, timestamp: DateTime<Local>) -> Self {
        let seed = config
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| NO_SEED.to_string());

        let entries = vec![
            ("prompt", config.prompt.clone()),
            ("timestamp", timestamp.format(TIMESTAMP_FORMAT).to_string()),
            ("tool", TOOL_ID.to_string()),
            ("dimension", DIMENSION_LABEL.to_string()),
            ("seed", seed),
            ("num-inference-steps", config.num_inference_steps.to_string()),
            ("strength", format_float(config.strength)),
            ("guidancescale", format_float(config.guidance_scale)),
        ];

        Self {
            entries: entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Whole numbers keep a trailing `.0` so `1` reads back as a float.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| (c as u32) < 0x100)
}

pub struct MetadataWriter;

impl MetadataWriter {
    /// Convert to RGB, embed provenance and write a PNG, replacing any
    /// existing file at `output`.
    pub fn embed_and_save(result: GenerationResult, config: &RunConfig, output: &Path) -> Result<()> {
        Self::embed_and_save_at(result, config, output, Local::now())
    }

    pub fn embed_and_save_at(
        result: GenerationResult,
        config: &RunConfig,
        output: &Path,
        timestamp: DateTime<Local>,
    ) -> Result<()> {
        let record = ProvenanceRecord::new(config, timestamp);
        let rgb = result.image().to_rgb()?;

        let file = File::create(output).map_err(|e| Error::io(output, e))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), rgb.width(), rgb.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        for (key, value) in record.entries() {
            let added = if is_latin1(value) {
                encoder.add_text_chunk(key.clone(), value.clone())
            } else {
                encoder.add_itxt_chunk(key.clone(), value.clone())
            };
            added.map_err(|e| encoding_error(output, e))?;
        }

        let mut writer = encoder.write_header().map_err(|e| encoding_error(output, e))?;
        writer
            .write_image_data(rgb.as_raw())
            .map_err(|e| encoding_error(output, e))?;
        writer.finish().map_err(|e| encoding_error(output, e))?;

        info!("Saved {} with {} metadata fields", output.display(), record.entries().len());
        Ok(())
    }
}

fn encoding_error(path: &Path, err: png::EncodingError) -> Error {
    match err {
        png::EncodingError::IoError(e) => Error::io(path, e),
        other => Error::io(path, std::io::Error::other(other)),
    }
}
