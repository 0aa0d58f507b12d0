use crate::error::{Error, Result};
use crate::pixels::{BgrImage, OUTPUT_SIZE};
use crate::request::GenerationRequest;
use crate::seed::GeneratorHandle;

/// Finished image straight out of the engine, still in BGR order
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    image: BgrImage,
}

impl GenerationResult {
    /// Only full-size buffers whose length matches their dimensions pass.
    pub fn new(image: BgrImage) -> Result<Self> {
        if image.width != OUTPUT_SIZE || image.height != OUTPUT_SIZE {
            return Err(Error::Engine(format!(
                "engine returned a {}x{} image, expected {}x{}",
                image.width, image.height, OUTPUT_SIZE, OUTPUT_SIZE
            )));
        }
        let image = BgrImage::new(image.width, image.height, image.data)?;
        Ok(Self { image })
    }

    pub fn image(&self) -> &BgrImage {
        &self.image
    }
}

/// Boundary to the synthesis backend.
///
/// One call runs the full denoising loop for `num_inference_steps` and may
/// block for minutes. Failures are never retried.
pub trait Engine {
    /// Short backend name for logs
    fn name(&self) -> &str;

    fn invoke(
        &mut self,
        request: GenerationRequest,
        generator: &mut GeneratorHandle,
    ) -> Result<GenerationResult>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(
        &mut self,
        request: GenerationRequest,
        generator: &mut GeneratorHandle,
    ) -> Result<GenerationResult> {
        (**self).invoke(request, generator)
    }
}
