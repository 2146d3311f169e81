//! Lumen Light - The persistent light rig and everything that feeds it
//!
//! Provides the session-long [`LightRig`], the one-shot [`EnvironmentMapBaker`]
//! and the wall-clock driven [`DayNightCycle`] that retints the sun each frame.

mod config;
mod error;

pub mod day_night;
pub mod environment;
pub mod rig;

pub use config::{EnvironmentSettings, LightingConfig, SecondaryCoefficients};
pub use day_night::{DayNightCycle, Keyframe, KeyframeTable, SunIntensitySink, SunSample};
pub use environment::{
    AuxiliaryLight, AuxiliaryScene, EnvironmentBinding, EnvironmentMap, EnvironmentMapBaker,
};
pub use error::LightingError;
pub use rig::{
    names, DeviceClass, Falloff, Light, LightKind, LightRig, RoomBounds, ShadowConfig,
    ShadowFrustum,
};
