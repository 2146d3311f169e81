//! Day/night cycle driven by the wall clock
//!
//! The sun's color and intensity come from a piecewise-linear keyframe table
//! indexed by hour of day. Ambient and hemisphere fill are derived from the
//! sun's intensity with fixed linear coefficients, so they need no tables of
//! their own.

use lumen_core::{Color, WallClock};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::SecondaryCoefficients;
use crate::error::LightingError;
use crate::rig::LightRig;

/// Hours in one day; also the hour of the closing sentinel keyframe
pub const HOURS_PER_DAY: f32 = 24.0;

/// A sun sample pinned to an hour of day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub hour: f32,
    pub color: Color,
    pub intensity: f32,
}

impl Keyframe {
    pub const fn new(hour: f32, color: Color, intensity: f32) -> Self {
        Self {
            hour,
            color,
            intensity,
        }
    }
}

/// Interpolated sun state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunSample {
    pub color: Color,
    pub intensity: f32,
}

/// A validated keyframe table.
///
/// Hours strictly increase, the first keyframe sits at hour 0 and the last is
/// a sentinel at hour 24 carrying the same values as hour 0, so every time of
/// day falls inside a non-empty interval.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTable {
    frames: Vec<Keyframe>,
}

impl KeyframeTable {
    pub fn new(frames: Vec<Keyframe>) -> Result<Self, LightingError> {
        let invalid = |reason: String| {
            error!("Rejecting keyframe table: {}", reason);
            Err(LightingError::InvalidKeyframes(reason))
        };

        if frames.len() < 2 {
            return invalid(format!("need at least 2 keyframes, got {}", frames.len()));
        }
        if let Some(bad) = frames
            .iter()
            .find(|k| !k.hour.is_finite() || !k.intensity.is_finite() || k.intensity < 0.0)
        {
            return invalid(format!("keyframe at hour {} has a non-finite or negative value", bad.hour));
        }

        let first = frames[0];
        let last = frames[frames.len() - 1];
        if first.hour != 0.0 {
            return invalid(format!("first keyframe must be at hour 0, found {}", first.hour));
        }
        if last.hour != HOURS_PER_DAY {
            return invalid(format!("last keyframe must be at hour 24, found {}", last.hour));
        }
        if let Some(pair) = frames.windows(2).find(|pair| pair[1].hour <= pair[0].hour) {
            return invalid(format!(
                "hours must strictly increase, found {} followed by {}",
                pair[0].hour, pair[1].hour
            ));
        }
        if last.color != first.color || last.intensity != first.intensity {
            return invalid("hour 24 sentinel must repeat the hour 0 values".to_string());
        }

        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Keyframe] {
        &self.frames
    }

    /// Interpolate the sun at `hours` since midnight (wrapped into [0, 24))
    pub fn sample(&self, hours: f32) -> SunSample {
        let t = hours.rem_euclid(HOURS_PER_DAY);

        let bracket = self
            .frames
            .windows(2)
            .find(|pair| pair[0].hour <= t && t < pair[1].hour);

        let Some([a, b]) = bracket.map(|pair| [pair[0], pair[1]]) else {
            // Only reachable for NaN input
            let first = self.frames[0];
            return SunSample {
                color: first.color,
                intensity: first.intensity,
            };
        };

        let f = (t - a.hour) / (b.hour - a.hour);
        SunSample {
            color: Color::lerp(&a.color, &b.color, f),
            intensity: a.intensity + (b.intensity - a.intensity) * f,
        }
    }
}

impl Default for KeyframeTable {
    fn default() -> Self {
        let midnight = Keyframe::new(0.0, Color::rgb(0.20, 0.25, 0.45), 0.15);
        Self {
            frames: vec![
                midnight,
                Keyframe::new(5.0, Color::rgb(0.55, 0.45, 0.55), 0.4),
                Keyframe::new(7.0, Color::rgb(1.0, 0.75, 0.55), 0.8),
                Keyframe::new(12.0, Color::rgb(1.0, 0.97, 0.90), 1.2),
                Keyframe::new(17.0, Color::rgb(1.0, 0.70, 0.45), 0.9),
                Keyframe::new(19.0, Color::rgb(0.60, 0.40, 0.55), 0.45),
                Keyframe::new(21.0, Color::rgb(0.25, 0.28, 0.50), 0.2),
                Keyframe {
                    hour: HOURS_PER_DAY,
                    ..midnight
                },
            ],
        }
    }
}

/// Receives the sun intensity each frame so screen glare tracks daylight
pub trait SunIntensitySink {
    fn set_sun_intensity(&mut self, intensity: f32);
}

/// Interpolates the sun from wall-clock time and writes it into the rig
#[derive(Debug, Clone)]
pub struct DayNightCycle {
    table: KeyframeTable,
    coefficients: SecondaryCoefficients,
}

impl DayNightCycle {
    pub fn new(table: KeyframeTable, coefficients: SecondaryCoefficients) -> Self {
        Self {
            table,
            coefficients,
        }
    }

    /// Build from an optional keyframe override, validating it along with
    /// the fill coefficients
    pub fn from_config(
        keyframes: Option<Vec<Keyframe>>,
        coefficients: SecondaryCoefficients,
    ) -> Result<Self, LightingError> {
        if let Err(e) = coefficients.validate() {
            error!("Rejected fill coefficients: {}", e);
            return Err(e);
        }
        let table = match keyframes {
            Some(frames) => KeyframeTable::new(frames)?,
            None => KeyframeTable::default(),
        };
        Ok(Self::new(table, coefficients))
    }

    pub fn table(&self) -> &KeyframeTable {
        &self.table
    }

    pub fn ambient_intensity(&self, sun_intensity: f32) -> f32 {
        self.coefficients.ambient_base + sun_intensity * self.coefficients.ambient_per_sun
    }

    pub fn hemisphere_intensity(&self, sun_intensity: f32) -> f32 {
        self.coefficients.hemisphere_base + sun_intensity * self.coefficients.hemisphere_per_sun
    }

    /// Per-frame update from the wall clock
    pub fn update(
        &self,
        clock: &dyn WallClock,
        rig: &mut LightRig,
        sink: &mut dyn SunIntensitySink,
    ) -> SunSample {
        self.update_at(clock.now().fractional_hours(), rig, sink)
    }

    /// Apply the sample for `hours` to the rig and the glare sink.
    ///
    /// Pure with respect to its inputs: repeated calls at the same time leave
    /// identical state behind.
    pub fn update_at(
        &self,
        hours: f32,
        rig: &mut LightRig,
        sink: &mut dyn SunIntensitySink,
    ) -> SunSample {
        let sun = self.table.sample(hours);
        rig.apply_daylight(
            sun.color,
            sun.intensity,
            self.ambient_intensity(sun.intensity),
            self.hemisphere_intensity(sun.intensity),
        );
        sink.set_sun_intensity(sun.intensity);
        sun
    }
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self::new(KeyframeTable::default(), SecondaryCoefficients::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightingConfig;
    use crate::rig::{DeviceClass, RoomBounds};
    use lumen_core::FixedClock;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[derive(Default)]
    struct RecordingSink(Vec<f32>);

    impl SunIntensitySink for RecordingSink {
        fn set_sun_intensity(&mut self, intensity: f32) {
            self.0.push(intensity);
        }
    }

    fn rig() -> LightRig {
        LightRig::new(
            &LightingConfig::default(),
            DeviceClass::Desktop,
            RoomBounds::default(),
        )
    }

    #[test]
    fn test_keyframe_boundaries_exact() {
        let table = KeyframeTable::default();
        for frame in &table.frames()[..table.frames().len() - 1] {
            let sample = table.sample(frame.hour);
            assert_eq!(sample.intensity, frame.intensity);
            assert_eq!(sample.color, frame.color);
        }
    }

    #[test]
    fn test_noon_on_keyframe() {
        let cycle = DayNightCycle::default();
        let mut rig = rig();
        let mut sink = RecordingSink::default();

        let sun = cycle.update(&FixedClock::at(12, 0), &mut rig, &mut sink);
        assert_eq!(sun.intensity, 1.2);
        assert_eq!(rig.sun().intensity, 1.2);
        assert_eq!(sink.0, vec![1.2]);
    }

    #[test]
    fn test_six_am_between_keyframes() {
        let cycle = DayNightCycle::default();
        let mut rig = rig();
        let mut sink = RecordingSink::default();

        cycle.update(&FixedClock::at(6, 0), &mut rig, &mut sink);
        assert!((rig.sun().intensity - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_continuity_approaching_keyframes() {
        let table = KeyframeTable::default();
        for frame in &table.frames()[1..] {
            let before = table.sample(frame.hour - 1e-3);
            let target = table.sample(frame.hour).intensity;
            assert!(
                (before.intensity - target).abs() < 1e-3,
                "jump at hour {}",
                frame.hour
            );
        }
    }

    #[test]
    fn test_wraps_past_midnight() {
        let table = KeyframeTable::default();
        assert_eq!(table.sample(24.0), table.sample(0.0));
        assert_eq!(table.sample(-1.0), table.sample(23.0));
        // 23:59 sits in the final interval toward the sentinel
        let late = table.sample(23.0 + 59.0 / 60.0);
        assert!((late.intensity - 0.15).abs() < 0.01);
    }

    #[test]
    fn test_update_is_idempotent() {
        let cycle = DayNightCycle::default();
        let mut rig = rig();
        let mut sink = RecordingSink::default();

        cycle.update_at(16.25, &mut rig, &mut sink);
        let snapshot: Vec<_> = rig.lights().map(|(n, l)| (n.to_string(), l.clone())).collect();
        cycle.update_at(16.25, &mut rig, &mut sink);
        let again: Vec<_> = rig.lights().map(|(n, l)| (n.to_string(), l.clone())).collect();

        assert_eq!(snapshot, again);
        assert_eq!(sink.0[0], sink.0[1]);
    }

    #[test]
    fn test_secondary_lights_track_sun() {
        let cycle = DayNightCycle::default();
        let mut rig = rig();
        let mut sink = RecordingSink::default();

        let sun = cycle.update_at(9.0, &mut rig, &mut sink);
        assert_eq!(rig.ambient().intensity, cycle.ambient_intensity(sun.intensity));
        assert_eq!(rig.hemisphere().intensity, cycle.hemisphere_intensity(sun.intensity));
    }

    #[test]
    fn test_secondary_intensities_non_decreasing() {
        let cycle = DayNightCycle::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let a: f32 = rng.gen_range(0.0..3.0);
            let b: f32 = rng.gen_range(0.0..3.0);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            assert!(cycle.ambient_intensity(lo) <= cycle.ambient_intensity(hi));
            assert!(cycle.hemisphere_intensity(lo) <= cycle.hemisphere_intensity(hi));
        }
    }

    #[test]
    fn test_rejects_malformed_tables() {
        let k = |hour, intensity| Keyframe::new(hour, Color::WHITE, intensity);

        let unsorted = vec![k(0.0, 0.1), k(12.0, 1.0), k(7.0, 0.8), k(24.0, 0.1)];
        assert!(matches!(
            KeyframeTable::new(unsorted),
            Err(LightingError::InvalidKeyframes(_))
        ));

        let duplicate = vec![k(0.0, 0.1), k(6.0, 0.5), k(6.0, 0.7), k(24.0, 0.1)];
        assert!(KeyframeTable::new(duplicate).is_err());

        let no_sentinel = vec![k(0.0, 0.1), k(12.0, 1.0)];
        assert!(KeyframeTable::new(no_sentinel).is_err());

        let late_start = vec![k(1.0, 0.1), k(24.0, 0.1)];
        assert!(KeyframeTable::new(late_start).is_err());

        let open_loop = vec![k(0.0, 0.1), k(12.0, 1.0), k(24.0, 0.3)];
        assert!(KeyframeTable::new(open_loop).is_err());

        let valid = vec![k(0.0, 0.1), k(12.0, 1.0), k(24.0, 0.1)];
        assert!(KeyframeTable::new(valid).is_ok());
    }

    #[test]
    fn test_from_config_validates_override() {
        let bad = vec![Keyframe::new(3.0, Color::WHITE, 1.0)];
        assert!(DayNightCycle::from_config(Some(bad), SecondaryCoefficients::default()).is_err());
        assert!(DayNightCycle::from_config(None, SecondaryCoefficients::default()).is_ok());
    }

    #[test]
    fn test_from_config_rejects_negative_slope() {
        let coefficients = SecondaryCoefficients {
            hemisphere_per_sun: -0.25,
            ..Default::default()
        };
        assert!(matches!(
            DayNightCycle::from_config(None, coefficients),
            Err(LightingError::InvalidCoefficients(_))
        ));
    }
}
