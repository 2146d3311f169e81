//! Idle hint glow
//!
//! After a stretch without interaction the outline pass is switched on and
//! its edge strength eased up to a target, nudging the user towards the
//! interactive objects. Selecting an object fades it back out.

use std::time::Duration;

use lumen_core::{DeferredTimer, Easing, Tween};
use lumen_render::OutlineControl;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hint timing, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintSettings {
    pub idle_delay_ms: u64,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    /// Edge strength the fade-in ends at
    pub target_strength: f32,
}

impl Default for HintSettings {
    fn default() -> Self {
        Self {
            idle_delay_ms: 5000,
            fade_in_ms: 2000,
            fade_out_ms: 1000,
            target_strength: 3.0,
        }
    }
}

impl HintSettings {
    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn fade_in(&self) -> Duration {
        Duration::from_millis(self.fade_in_ms)
    }

    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }
}

/// Where the hint glow is in its cycle. Exactly one phase holds at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HintPhase {
    /// Outline off; the idle timer may be pending
    Dormant,
    FadingIn(Tween),
    /// Outline on at full strength
    IdleActive,
    FadingOut(Tween),
}

/// Drives the outline pass from user activity
#[derive(Debug, Clone)]
pub struct HintScheduler {
    settings: HintSettings,
    timer: DeferredTimer,
    phase: HintPhase,
}

impl HintScheduler {
    pub fn new(settings: HintSettings) -> Self {
        Self {
            timer: DeferredTimer::new(settings.idle_delay()),
            settings,
            phase: HintPhase::Dormant,
        }
    }

    pub fn settings(&self) -> &HintSettings {
        &self.settings
    }

    pub fn phase(&self) -> HintPhase {
        self.phase
    }

    /// Whether the glow is on its way in or fully shown
    pub fn is_active(&self) -> bool {
        matches!(self.phase, HintPhase::FadingIn(_) | HintPhase::IdleActive)
    }

    /// When the pending idle timer fires, if any
    pub fn timer_deadline(&self) -> Option<Duration> {
        self.timer.deadline()
    }

    /// Start watching for idleness
    pub fn wire(&mut self, now: Duration) {
        self.timer.restart(now);
        debug!("Hint timer armed, fires at {:?}", self.timer.deadline());
    }

    /// Per-frame tick: fire the idle timer when due and advance any fade
    pub fn tick(&mut self, now: Duration, outline: &mut dyn OutlineControl) {
        if self.timer.poll(now).is_some() {
            self.begin_fade_in(now, outline);
        }

        match self.phase {
            HintPhase::FadingIn(tween) => {
                outline.set_edge_strength(tween.sample(now));
                if tween.is_finished(now) {
                    debug!("Hint glow fully shown");
                    self.phase = HintPhase::IdleActive;
                }
            }
            HintPhase::FadingOut(tween) => {
                outline.set_edge_strength(tween.sample(now));
                if tween.is_finished(now) {
                    outline.set_outline_enabled(false);
                    debug!("Hint glow hidden");
                    self.phase = HintPhase::Dormant;
                }
            }
            HintPhase::Dormant | HintPhase::IdleActive => {}
        }
    }

    /// An object was selected: fade out from the current strength if the glow
    /// is showing, and restart the idle timer from zero
    pub fn on_selection(&mut self, now: Duration, outline: &mut dyn OutlineControl) {
        if self.is_active() {
            let from = outline.edge_strength();
            debug!("Selection while hinting, fading out from {:.3}", from);
            self.phase = HintPhase::FadingOut(Tween::new(
                from,
                0.0,
                now,
                self.settings.fade_out(),
                Easing::CubicIn,
            ));
        }
        self.timer.restart(now);
    }

    /// The camera finished returning to its rest pose
    pub fn on_camera_reset(&mut self, now: Duration) {
        self.timer.restart(now);
    }

    fn begin_fade_in(&mut self, now: Duration, outline: &mut dyn OutlineControl) {
        if self.is_active() {
            return;
        }
        // an unfinished fade-out hands over its current value instead of jumping to 0
        let from = match self.phase {
            HintPhase::FadingOut(_) => outline.edge_strength(),
            _ => 0.0,
        };
        outline.set_outline_enabled(true);
        outline.set_edge_strength(from);
        debug!("Idle timeout, fading hint glow in");
        self.phase = HintPhase::FadingIn(Tween::new(
            from,
            self.settings.target_strength,
            now,
            self.settings.fade_in(),
            Easing::CubicOut,
        ));
    }
}

impl Default for HintScheduler {
    fn default() -> Self {
        Self::new(HintSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_render::OutlinePassState;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn wired() -> (HintScheduler, OutlinePassState) {
        let mut hint = HintScheduler::default();
        hint.wire(Duration::ZERO);
        (hint, OutlinePassState::new())
    }

    #[test]
    fn test_nothing_happens_before_idle_delay() {
        let (mut hint, mut outline) = wired();
        hint.tick(ms(4999), &mut outline);
        assert_eq!(hint.phase(), HintPhase::Dormant);
        assert!(!outline.enabled);
    }

    #[test]
    fn test_idle_timeout_fades_in_to_target() {
        let (mut hint, mut outline) = wired();
        hint.tick(ms(5000), &mut outline);
        assert!(outline.enabled);
        assert_eq!(outline.edge_strength, 0.0);
        assert!(matches!(hint.phase(), HintPhase::FadingIn(_)));

        hint.tick(ms(6000), &mut outline);
        assert!(outline.edge_strength > 1.5 && outline.edge_strength < 3.0);

        hint.tick(ms(7000), &mut outline);
        assert_eq!(outline.edge_strength, 3.0);
        assert_eq!(hint.phase(), HintPhase::IdleActive);
        assert!(hint.timer_deadline().is_none());
    }

    #[test]
    fn test_selection_mid_fade_in_fades_out_from_current_strength() {
        let (mut hint, mut outline) = wired();
        hint.tick(ms(5000), &mut outline);

        // cubic-out from 0 to 3 over 2 s passes 1.2 at about 313 ms
        let select_at = ms(5313);
        hint.tick(select_at, &mut outline);
        let strength = outline.edge_strength;
        assert!((strength - 1.2).abs() < 1e-2, "strength {}", strength);

        hint.on_selection(select_at, &mut outline);
        match hint.phase() {
            HintPhase::FadingOut(tween) => assert_eq!(tween.start_value(), strength),
            other => panic!("expected fade-out, got {:?}", other),
        }
        assert_eq!(hint.timer_deadline(), Some(select_at + ms(5000)));

        hint.tick(select_at, &mut outline);
        assert_eq!(outline.edge_strength, strength);
        assert!(outline.enabled);

        hint.tick(select_at + ms(500), &mut outline);
        assert!(outline.edge_strength > 0.0 && outline.edge_strength < strength);
        assert!(outline.enabled);

        hint.tick(select_at + ms(1000), &mut outline);
        assert_eq!(outline.edge_strength, 0.0);
        assert!(!outline.enabled);
        assert_eq!(hint.phase(), HintPhase::Dormant);
    }

    #[test]
    fn test_selection_while_dormant_only_restarts_timer() {
        let (mut hint, mut outline) = wired();
        hint.on_selection(ms(3000), &mut outline);
        assert_eq!(hint.phase(), HintPhase::Dormant);
        hint.tick(ms(5000), &mut outline);
        assert!(!outline.enabled);
        hint.tick(ms(8000), &mut outline);
        assert!(outline.enabled);
    }

    #[test]
    fn test_camera_reset_restarts_timer() {
        let (mut hint, mut outline) = wired();
        hint.on_camera_reset(ms(4000));
        assert_eq!(hint.timer_deadline(), Some(ms(9000)));
        hint.tick(ms(5000), &mut outline);
        assert_eq!(hint.phase(), HintPhase::Dormant);
    }

    #[test]
    fn test_timer_firing_while_shown_keeps_strength() {
        let (mut hint, mut outline) = wired();
        hint.tick(ms(5000), &mut outline);
        hint.tick(ms(7000), &mut outline);
        hint.on_camera_reset(ms(7000));
        hint.tick(ms(12_000), &mut outline);
        assert_eq!(hint.phase(), HintPhase::IdleActive);
        assert_eq!(outline.edge_strength, 3.0);
    }

    #[test]
    fn test_timer_during_fade_out_resumes_from_current_strength() {
        let mut hint = HintScheduler::new(HintSettings {
            idle_delay_ms: 500,
            ..Default::default()
        });
        let mut outline = OutlinePassState::new();
        hint.wire(Duration::ZERO);
        hint.tick(ms(500), &mut outline);
        hint.tick(ms(2500), &mut outline);
        assert_eq!(hint.phase(), HintPhase::IdleActive);

        // the fade-out outlasts the idle delay, so the timer fires mid fade
        hint.on_selection(ms(2500), &mut outline);
        hint.tick(ms(2900), &mut outline);
        let strength = outline.edge_strength;
        assert!(strength > 0.0 && strength < 3.0);

        hint.tick(ms(3000), &mut outline);
        match hint.phase() {
            HintPhase::FadingIn(tween) => assert_eq!(tween.start_value(), strength),
            other => panic!("expected fade-in, got {:?}", other),
        }
        assert_eq!(outline.edge_strength, strength);
        assert!(outline.enabled);

        hint.tick(ms(5000), &mut outline);
        assert_eq!(outline.edge_strength, 3.0);
        assert_eq!(hint.phase(), HintPhase::IdleActive);
    }

    #[test]
    fn test_unwired_scheduler_stays_dormant() {
        let mut hint = HintScheduler::default();
        let mut outline = OutlinePassState::new();
        hint.tick(ms(60_000), &mut outline);
        assert_eq!(hint.phase(), HintPhase::Dormant);
        assert!(!outline.enabled);
    }

    #[test]
    fn test_random_interaction_keeps_outline_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        let (mut hint, mut outline) = wired();
        let mut now = Duration::ZERO;

        for _ in 0..5000 {
            now += ms(rng.gen_range(1..400));
            match rng.gen_range(0..20) {
                0 => hint.on_selection(now, &mut outline),
                1 => hint.on_camera_reset(now),
                _ => hint.tick(now, &mut outline),
            }

            assert!((0.0..=3.0).contains(&outline.edge_strength));
            match hint.phase() {
                HintPhase::Dormant => assert!(!outline.enabled),
                HintPhase::FadingIn(_) | HintPhase::IdleActive | HintPhase::FadingOut(_) => {
                    assert!(outline.enabled)
                }
            }
        }
    }

    #[test]
    fn test_settings_parse_partially() {
        let settings: HintSettings = toml::from_str("idle_delay_ms = 8000").unwrap();
        assert_eq!(settings.idle_delay(), ms(8000));
        assert_eq!(settings.fade_out(), ms(1000));
    }
}
