//! Lumen Core - Shared types and utilities for the Lumen lighting engine
//!
//! This crate provides the foundational types used throughout the engine:
//! - Mathematical primitives (re-exported from glam)
//! - Colors, scene object ids and viewport extents
//! - Wall-clock access and the cancellable idle timer
//! - Time-based tweens with easing curves

pub mod time;
pub mod tween;
pub mod types;

pub use glam::{Mat4, Vec3, Vec4};
pub use time::{ClockTime, DeferredTimer, FixedClock, SystemClock, TimerHandle, WallClock};
pub use tween::{Easing, Tween};
pub use types::{Color, Extent, ObjectId};
