/// An error type for the camera module.
#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    /// Error when the lens profile file cannot be read.
    #[error("Failed to read the lens profile file")]
    ProfileIo(#[from] std::io::Error),

    /// Error when the lens profile file cannot be parsed.
    #[error("Failed to parse the lens profile file")]
    ProfileParse(#[from] serde_json::Error),
}
