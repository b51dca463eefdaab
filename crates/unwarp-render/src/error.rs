/// An error type for the render module.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Error when a render target cannot be allocated.
    #[error("Invalid render target size ({0}x{1})")]
    InvalidTargetSize(u32, u32),

    /// Error when a remap program fails to compile.
    #[error("Failed to compile the remap program: {0}")]
    ProgramCompile(String),

    /// Error when frame data does not match the frame size.
    #[error("Frame data length ({0}) does not match the frame size ({1})")]
    InvalidFrameData(usize, usize),
}
