#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to decode input image: {0}")]
    Decode(image::ImageError),

    #[error("Failed to encode canvas: {0}")]
    Encode(image::ImageError),
}
