use lumen_core::ObjectId;
use lumen_light::LightingError;
use lumen_render::RenderError;

/// Errors raised while assembling a scene
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Lighting(#[from] LightingError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("no prop with id {0:?} in the scene")]
    UnknownProp(ObjectId),
}
