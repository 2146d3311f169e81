/// Errors raised while building or validating lighting state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LightingError {
    #[error("invalid keyframe table: {0}")]
    InvalidKeyframes(String),

    #[error("invalid fill coefficients: {0}")]
    InvalidCoefficients(String),

    #[error("a light named '{0}' is already registered in the rig")]
    DuplicateLight(String),

    #[error("no light named '{0}' in the rig")]
    UnknownLight(String),

    #[error("environment bake resolution {width}x{height} is invalid")]
    InvalidBakeResolution { width: u32, height: u32 },
}
