//! Lumen Scene - Frame orchestration for the lighting engine
//!
//! [`SceneEngine`] owns the lighting context, the day/night cycle, the hint
//! scheduler and the compositor, and runs them in a fixed order each frame.

mod error;

pub mod camera;
pub mod context;
pub mod engine;
pub mod hint;

pub use camera::SceneCamera;
pub use context::{LightingContext, Prop, PropFactory};
pub use engine::{FrameStats, SceneConfig, SceneEngine};
pub use error::SceneError;
pub use hint::{HintPhase, HintScheduler, HintSettings};
