use crate::uniform::UniformKind;

/// Errors raised while building materials and the pass chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("post-processing backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("material '{material}' does not declare uniform '{uniform}'")]
    MissingUniform { material: String, uniform: String },

    #[error("uniform '{uniform}' of material '{material}' is {expected:?}, not {found:?}")]
    UniformTypeMismatch {
        material: String,
        uniform: String,
        expected: UniformKind,
        found: UniformKind,
    },

    #[error("outline targets were already assigned")]
    OutlineTargetsAlreadyAssigned,

    #[error("no live glare material with id {0}")]
    UnknownGlareMaterial(u64),
}
