use crate::config::PerformanceConfig;
use log::info;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityLevel {
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityLevel {
    pub fn step_down(self) -> Option<Self> {
        match self {
            QualityLevel::Ultra => Some(QualityLevel::High),
            QualityLevel::High => Some(QualityLevel::Medium),
            QualityLevel::Medium => Some(QualityLevel::Low),
            QualityLevel::Low => None,
        }
    }

    pub fn step_up(self) -> Option<Self> {
        match self {
            QualityLevel::Low => Some(QualityLevel::Medium),
            QualityLevel::Medium => Some(QualityLevel::High),
            QualityLevel::High => Some(QualityLevel::Ultra),
            QualityLevel::Ultra => None,
        }
    }

    pub fn texture_scale(self) -> f32 {
        match self {
            QualityLevel::Low => 0.25,
            QualityLevel::Medium => 0.5,
            QualityLevel::High => 0.75,
            QualityLevel::Ultra => 1.0,
        }
    }

    /// Aggressive mesh LOD swapping kicks in below High.
    pub fn lod_enabled(self) -> bool {
        matches!(self, QualityLevel::Low | QualityLevel::Medium)
    }
}

/// Shared render configuration the governor writes and the (external)
/// rendering surface reads every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub quality: QualityLevel,
    pub shadows: bool,
    pub level_of_detail: bool,
    pub texture_scale: f32,
    pub constrained_viewport: bool,
}

impl RenderSettings {
    fn for_level(level: QualityLevel) -> Self {
        Self {
            quality: level,
            shadows: true,
            level_of_detail: level.lod_enabled(),
            texture_scale: level.texture_scale(),
            constrained_viewport: false,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::for_level(QualityLevel::High)
    }
}

/// What a decision sample did, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityAction {
    Degraded(QualityLevel),
    ShadowsDisabled,
    Upgraded(QualityLevel),
}

/// Named countdown used for the degrade/upgrade hysteresis gates.
#[derive(Debug, Clone, Copy)]
struct Cooldown {
    remaining: f32,
}

impl Cooldown {
    fn started(secs: f32) -> Self {
        Self { remaining: secs.max(0.0) }
    }

    fn start(&mut self, secs: f32) {
        self.remaining = secs.max(0.0);
    }

    fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    fn ready(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// FPS-driven quality governor. Keeps a rolling frame-time window, counts
/// consecutive slow samples against 80% of the effective target, and moves
/// the quality level one step at a time behind two asymmetric cooldown gates
/// (3 s to degrade again, 10 s before any upgrade). At the floor it sheds
/// shadows instead of stepping.
#[derive(Debug)]
pub struct QualityGovernor {
    config: PerformanceConfig,
    settings: RenderSettings,
    frame_times: VecDeque<f32>,
    last_frame_dt: f32,
    sample_clock: f32,
    low_streak: u32,
    degrade_gate: Cooldown,
    upgrade_gate: Cooldown,
    notification_remaining: f32,
}

impl QualityGovernor {
    pub fn new(config: PerformanceConfig) -> Self {
        let degrade_gate = Cooldown::started(config.degrade_cooldown_secs);
        let upgrade_gate = Cooldown::started(config.upgrade_cooldown_secs);
        Self {
            frame_times: VecDeque::with_capacity(config.frame_window.min(1_024)),
            settings: RenderSettings::default(),
            last_frame_dt: 0.0,
            sample_clock: 0.0,
            low_streak: 0,
            degrade_gate,
            upgrade_gate,
            notification_remaining: 0.0,
            config,
        }
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    pub fn set_constrained_viewport(&mut self, constrained: bool) {
        self.settings.constrained_viewport = constrained;
    }

    pub fn low_streak(&self) -> u32 {
        self.low_streak
    }

    /// True while the transient "quality adjusted" notice should be visible.
    pub fn notification_active(&self) -> bool {
        self.notification_remaining > 0.0
    }

    pub fn average_fps(&self) -> Option<f32> {
        if self.frame_times.is_empty() {
            return None;
        }
        let total: f32 = self.frame_times.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(self.frame_times.len() as f32 / total)
    }

    pub fn effective_target_fps(&self) -> f32 {
        if self.settings.constrained_viewport {
            self.config.constrained_target_fps
        } else {
            self.config.target_fps
        }
    }

    /// Feed one rendered frame. Decisions happen at the sample cadence
    /// (nominally once per second); at most one action per sample.
    pub fn record_frame(&mut self, dt: f32) -> Option<QualityAction> {
        if dt <= 0.0 {
            return None;
        }
        if self.frame_times.len() == self.config.frame_window.max(1) {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt);
        self.last_frame_dt = dt;
        self.degrade_gate.tick(dt);
        self.upgrade_gate.tick(dt);
        self.notification_remaining = (self.notification_remaining - dt).max(0.0);
        self.sample_clock += dt;
        if self.sample_clock < self.config.sample_interval_secs {
            return None;
        }
        self.sample_clock = 0.0;
        self.sample()
    }

    fn sample(&mut self) -> Option<QualityAction> {
        let target = self.effective_target_fps();
        let instant_fps = 1.0 / self.last_frame_dt;
        if instant_fps < target * 0.8 {
            self.low_streak += 1;
        } else {
            self.low_streak = 0;
        }

        if self.low_streak >= self.config.degrade_streak && self.degrade_gate.ready() {
            return self.degrade();
        }

        if self.low_streak == 0 && self.upgrade_gate.ready() {
            if let Some(avg) = self.average_fps() {
                if avg > target * 1.2 {
                    return self.upgrade();
                }
            }
        }
        None
    }

    fn degrade(&mut self) -> Option<QualityAction> {
        let action = if let Some(next) = self.settings.quality.step_down() {
            self.apply_level(next);
            info!("quality degraded to {next:?}");
            QualityAction::Degraded(next)
        } else if self.settings.shadows {
            self.settings.shadows = false;
            info!("quality floor reached, shadows disabled");
            QualityAction::ShadowsDisabled
        } else {
            // Nothing left to shed.
            return None;
        };
        self.low_streak = 0;
        self.restart_gates();
        self.notification_remaining = self.config.notification_secs;
        Some(action)
    }

    fn upgrade(&mut self) -> Option<QualityAction> {
        let next = self.settings.quality.step_up()?;
        self.apply_level(next);
        if next >= QualityLevel::High {
            self.settings.shadows = true;
        }
        self.restart_gates();
        info!("quality upgraded to {next:?}");
        Some(QualityAction::Upgraded(next))
    }

    fn apply_level(&mut self, level: QualityLevel) {
        self.settings.quality = level;
        self.settings.texture_scale = level.texture_scale();
        self.settings.level_of_detail = level.lod_enabled();
    }

    fn restart_gates(&mut self) {
        self.degrade_gate.start(self.config.degrade_cooldown_secs);
        self.upgrade_gate.start(self.config.upgrade_cooldown_secs);
    }
}

impl Default for QualityGovernor {
    fn default() -> Self {
        Self::new(PerformanceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `secs` seconds of frames at a steady frame time.
    fn run_frames(governor: &mut QualityGovernor, frame_dt: f32, secs: f32) -> Vec<QualityAction> {
        let frames = (secs / frame_dt).round() as usize;
        let mut actions = Vec::new();
        for _ in 0..frames {
            if let Some(action) = governor.record_frame(frame_dt) {
                actions.push(action);
            }
        }
        actions
    }

    #[test]
    fn five_low_samples_step_down_one_level() {
        let mut governor = QualityGovernor::default();
        assert_eq!(governor.settings().quality, QualityLevel::High);
        let actions = run_frames(&mut governor, 0.05, 5.0);
        assert_eq!(actions, vec![QualityAction::Degraded(QualityLevel::Medium)]);
        assert_eq!(governor.settings().quality, QualityLevel::Medium);
        assert_eq!(governor.low_streak(), 0);
        assert!(governor.notification_active());
    }

    #[test]
    fn degrade_steps_never_skip_levels() {
        let mut governor = QualityGovernor::default();
        let actions = run_frames(&mut governor, 0.05, 30.0);
        assert_eq!(
            actions,
            vec![
                QualityAction::Degraded(QualityLevel::Medium),
                QualityAction::Degraded(QualityLevel::Low),
                QualityAction::ShadowsDisabled,
            ]
        );
        assert_eq!(governor.settings().quality, QualityLevel::Low);
        assert!(!governor.settings().shadows);
        // Nothing left to shed; further low samples change nothing.
        assert!(run_frames(&mut governor, 0.05, 10.0).is_empty());
    }

    #[test]
    fn upgrade_waits_for_the_long_gate() {
        let mut governor = QualityGovernor::default();
        let early = run_frames(&mut governor, 1.0 / 100.0, 9.0);
        assert!(early.is_empty());
        let later = run_frames(&mut governor, 1.0 / 100.0, 2.0);
        assert_eq!(later, vec![QualityAction::Upgraded(QualityLevel::Ultra)]);
        assert_eq!(governor.settings().quality, QualityLevel::Ultra);
        assert_eq!(governor.settings().texture_scale, 1.0);
    }

    #[test]
    fn low_streak_blocks_upgrades() {
        let mut governor = QualityGovernor::default();
        run_frames(&mut governor, 1.0 / 100.0, 10.5);
        assert_eq!(governor.settings().quality, QualityLevel::Ultra);
        // Alternate one slow sample into otherwise fast frames: the streak
        // never reaches the degrade threshold, but it is rarely zero either,
        // so no further action fires within the upgrade window.
        run_frames(&mut governor, 0.05, 1.0);
        assert_eq!(governor.settings().quality, QualityLevel::Ultra);
        assert!(governor.low_streak() > 0);
    }

    #[test]
    fn constrained_viewport_lowers_the_bar() {
        let mut governor = QualityGovernor::default();
        governor.set_constrained_viewport(true);
        assert_eq!(governor.effective_target_fps(), 30.0);
        // 35 FPS is low against a 60 FPS target but healthy against 30.
        let actions = run_frames(&mut governor, 1.0 / 35.0, 6.0);
        assert!(actions.is_empty());
        assert_eq!(governor.low_streak(), 0);
    }

    #[test]
    fn window_evicts_oldest_frames() {
        let mut governor = QualityGovernor::default();
        run_frames(&mut governor, 0.05, 2.9);
        run_frames(&mut governor, 1.0 / 120.0, 0.5);
        // 60-frame window now holds only the fast tail.
        let avg = governor.average_fps().expect("window populated");
        assert!(avg > 100.0, "average {avg} should reflect eviction");
    }
}
