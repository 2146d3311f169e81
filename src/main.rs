//! Lumen - Light-driven scene preview
//!
//! Runs the lighting and compositing engine headlessly against a recording
//! backend, driving it with a scripted interaction timeline.

mod props;
mod settings;

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec3;
use lumen_core::{Extent, FixedClock, ObjectId, SystemClock, WallClock};
use lumen_render::{BackendCaps, RecordingBackend};
use lumen_scene::SceneEngine;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use props::{DeskLamp, Room, Screen};
use settings::Settings;

/// Interaction the preview replays
#[derive(Debug, Clone, Copy)]
enum ScriptEvent {
    Select(ObjectId),
    CameraReset,
    Resize(Extent),
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    info!("Starting Lumen preview...");

    let settings = Settings::load();
    let caps = if settings.video.post_processing {
        BackendCaps::FULL
    } else {
        BackendCaps::DIRECT_ONLY
    };
    let mut backend = RecordingBackend::new(caps, settings.video.resolution());

    let mut engine =
        SceneEngine::new(&settings.scene(), &mut backend).context("Failed to build scene")?;

    engine.add_prop(&Room).context("Failed to build room")?;
    engine
        .add_prop(&DeskLamp {
            bulb_position: Vec3::new(-0.55, 1.3, -0.3),
        })
        .context("Failed to build desk lamp")?;
    let monitor = engine
        .add_prop(&Screen::monitor())
        .context("Failed to build monitor")?;
    engine
        .add_prop(&Screen::laptop())
        .context("Failed to build laptop")?;
    engine.wire(Duration::ZERO).context("Failed to wire scene")?;

    let clock: Box<dyn WallClock> = match settings.preview.pinned_clock()? {
        Some(time) => Box::new(FixedClock(time)),
        None => Box::new(SystemClock),
    };
    info!("Wall clock reads {}", clock.now().formatted());

    let mut script: VecDeque<(Duration, ScriptEvent)> = VecDeque::from([
        (Duration::from_millis(7500), ScriptEvent::Select(monitor)),
        (
            Duration::from_millis(9000),
            ScriptEvent::Resize(Extent::new(1600, 900)),
        ),
        (Duration::from_millis(10_000), ScriptEvent::CameraReset),
    ]);

    let frame_interval = Duration::from_millis(settings.preview.frame_ms.max(1));
    let mut recorded = 0usize;

    for index in 0..settings.preview.frames {
        let now = frame_interval * index;

        while let Some((_, event)) = script.front().filter(|(at, _)| *at <= now).copied() {
            script.pop_front();
            match event {
                ScriptEvent::Select(object) => {
                    let accepted = engine.on_selection(now, object);
                    info!("Selection at {:?} (accepted: {})", now, accepted);
                }
                ScriptEvent::CameraReset => {
                    info!("Camera reset at {:?}", now);
                    engine.on_camera_reset(now);
                }
                ScriptEvent::Resize(size) => engine.resize(&mut backend, size),
            }
        }

        engine.frame(now, clock.as_ref(), &mut backend);
        recorded += backend.take_commands().len();
    }

    let stats = engine.frame_stats();
    info!(
        "Rendered {} frames ({:?}), {} backend commands",
        stats.frames, stats.mode, recorded
    );
    info!(
        "Outline: {} upstream renders, {} composites, {} skipped",
        stats.outline.upstream_renders, stats.outline.composites, stats.outline.skipped_composites
    );
    if let Some(intensity) = stats.sun_intensity {
        info!("Sun intensity {:.3}, hint active: {}", intensity, stats.hint_active);
    }

    Ok(())
}
