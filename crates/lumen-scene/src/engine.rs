//! Per-frame orchestration of lighting and compositing

use std::sync::Arc;
use std::time::Duration;

use lumen_core::{Extent, ObjectId, WallClock};
use lumen_light::{
    AuxiliaryScene, DayNightCycle, DeviceClass, EnvironmentBinding, EnvironmentMapBaker,
    LightRig, LightingConfig, RoomBounds, SunSample,
};
use lumen_render::{
    BloomSettings, CompositeMode, Compositor, OutlineSettings, OutlineStats, RenderBackend,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::camera::SceneCamera;
use crate::context::{LightingContext, Prop, PropFactory};
use crate::error::SceneError;
use crate::hint::{HintScheduler, HintSettings};

/// Everything tunable about the scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub lighting: LightingConfig,
    pub bloom: BloomSettings,
    pub outline: OutlineSettings,
    pub hint: HintSettings,
}

/// Counters reported by [`SceneEngine::frame_stats`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub mode: CompositeMode,
    pub outline: OutlineStats,
    pub hint_active: bool,
    /// Sun intensity applied by the latest frame
    pub sun_intensity: Option<f32>,
}

pub struct SceneEngine {
    lighting: LightingContext,
    day_night: DayNightCycle,
    compositor: Compositor,
    hint: HintScheduler,
    camera: SceneCamera,
    props: Vec<Prop>,
    frames: u64,
    last_sun: Option<SunSample>,
}

impl SceneEngine {
    /// Build the rig, validate the day/night table, bake the environment and
    /// set up compositing for the backend's current framebuffer.
    ///
    /// A malformed keyframe table is an error. A failed bake degrades to flat
    /// environment shading, and a backend that cannot post-process degrades
    /// to direct rendering.
    pub fn new(config: &SceneConfig, backend: &mut dyn RenderBackend) -> Result<Self, SceneError> {
        let viewport = backend.framebuffer_size();
        let day_night =
            DayNightCycle::from_config(config.lighting.keyframes.clone(), config.lighting.secondary)?;

        let device_class = config
            .lighting
            .device_class
            .unwrap_or_else(|| DeviceClass::from_viewport(viewport));
        let rig = LightRig::new(&config.lighting, device_class, RoomBounds::default());

        let baker = EnvironmentMapBaker::new(config.lighting.environment);
        let environment = match baker.bake(&AuxiliaryScene::room()) {
            Ok(map) => EnvironmentBinding::Reflective {
                map: Arc::new(map),
                intensity: 1.0,
            },
            Err(e) => {
                warn!("Environment bake failed, using flat shading: {}", e);
                EnvironmentBinding::Flat
            }
        };

        let compositor = Compositor::new(backend, viewport, config.bloom, config.outline);
        let mut camera = SceneCamera::default();
        camera.set_viewport(viewport);

        info!(
            "Scene engine ready at {}x{} ({:?} compositing)",
            viewport.width,
            viewport.height,
            compositor.mode()
        );

        Ok(Self {
            lighting: LightingContext::new(rig, environment),
            day_night,
            compositor,
            hint: HintScheduler::new(config.hint),
            camera,
            props: Vec::new(),
            frames: 0,
            last_sun: None,
        })
    }

    pub fn lighting(&self) -> &LightingContext {
        &self.lighting
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn hint(&self) -> &HintScheduler {
        &self.hint
    }

    pub fn camera(&self) -> &SceneCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut SceneCamera {
        &mut self.camera
    }

    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Build a prop against the lighting context
    pub fn add_prop(&mut self, factory: &dyn PropFactory) -> Result<ObjectId, SceneError> {
        let prop = factory.build(&mut self.lighting)?;
        debug!(
            "Added prop '{}' from {} (interactive: {})",
            prop.name,
            factory.name(),
            prop.interactive
        );
        let id = prop.id;
        self.props.push(prop);
        Ok(id)
    }

    /// Dispose a prop. Its glare material is unregistered so frames stop
    /// writing to it; the wired outline target set is left as it was.
    pub fn remove_prop(&mut self, id: ObjectId) -> Result<Prop, SceneError> {
        let index = self
            .props
            .iter()
            .position(|prop| prop.id == id)
            .ok_or(SceneError::UnknownProp(id))?;
        if let Some(glare) = self.props[index].glare {
            self.lighting.dispose_glare(glare)?;
        }
        let prop = self.props.remove(index);
        debug!("Removed prop '{}'", prop.name);
        Ok(prop)
    }

    /// Hand the interactive props to the outline pass and arm the hint timer.
    /// Props added afterwards are not outlined.
    pub fn wire(&mut self, now: Duration) -> Result<(), SceneError> {
        let targets: Vec<ObjectId> = self
            .props
            .iter()
            .filter(|prop| prop.interactive)
            .map(|prop| prop.id)
            .collect();
        info!("Wiring {} interactive objects", targets.len());
        self.compositor.wire_outline_targets(targets)?;
        self.hint.wire(now);
        Ok(())
    }

    /// Produce one frame: hint tick, day/night update, glare camera refresh,
    /// then the composite render
    pub fn frame(
        &mut self,
        now: Duration,
        clock: &dyn WallClock,
        backend: &mut dyn RenderBackend,
    ) -> SunSample {
        self.hint.tick(now, &mut self.compositor);

        let (rig, glare) = self.lighting.rig_and_glare_mut();
        let sun = self.day_night.update(clock, rig, glare);

        self.lighting.refresh_camera(self.camera.position);
        self.compositor.render(backend, now);

        self.frames += 1;
        self.last_sun = Some(sun);
        sun
    }

    /// Viewport change: framebuffer, every pass and the camera aspect
    pub fn resize(&mut self, backend: &mut dyn RenderBackend, size: Extent) {
        self.camera.set_viewport(size);
        self.compositor.resize(backend, size);
    }

    /// Selection event from the interaction layer. Only interactive props are
    /// accepted; returns whether this one was.
    pub fn on_selection(&mut self, now: Duration, object: ObjectId) -> bool {
        let accepted = self
            .props
            .iter()
            .any(|prop| prop.id == object && prop.interactive);
        if accepted {
            self.hint.on_selection(now, &mut self.compositor);
        }
        accepted
    }

    pub fn on_camera_reset(&mut self, now: Duration) {
        self.hint.on_camera_reset(now);
    }

    pub fn frame_stats(&self) -> FrameStats {
        FrameStats {
            frames: self.frames,
            mode: self.compositor.mode(),
            outline: self.compositor.outline_stats(),
            hint_active: self.hint.is_active(),
            sun_intensity: self.last_sun.map(|sun| sun.intensity),
        }
    }
}
