use crate::config::EngagementConfig;

/// Which customization surface a signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementSignal {
    Color,
    Text,
    Font,
    ImageUpload,
    AiGeneration,
    Template,
}

/// Accumulates customization signals into a bounded score read by the UI
/// gating and drained alongside analytics. The score only moves up until an
/// explicit reset.
#[derive(Debug, Clone)]
pub struct EngagementTracker {
    config: EngagementConfig,
    color_customized: bool,
    text_customized: bool,
    font_customized: bool,
    image_uploaded: bool,
    ai_generated: bool,
    template_used: bool,
    interaction_count: u32,
    active_seconds: f32,
    score: f32,
}

impl EngagementTracker {
    pub fn new(config: EngagementConfig) -> Self {
        Self {
            config,
            color_customized: false,
            text_customized: false,
            font_customized: false,
            image_uploaded: false,
            ai_generated: false,
            template_used: false,
            interaction_count: 0,
            active_seconds: 0.0,
            score: 0.0,
        }
    }

    pub fn record(&mut self, signal: EngagementSignal) {
        match signal {
            EngagementSignal::Color => self.color_customized = true,
            EngagementSignal::Text => self.text_customized = true,
            EngagementSignal::Font => self.font_customized = true,
            EngagementSignal::ImageUpload => self.image_uploaded = true,
            EngagementSignal::AiGeneration => self.ai_generated = true,
            EngagementSignal::Template => self.template_used = true,
        }
        self.touch_interaction();
    }

    pub fn touch_interaction(&mut self) {
        self.interaction_count = self.interaction_count.saturating_add(1);
        self.recompute();
    }

    pub fn add_active_time(&mut self, dt: f32) {
        self.active_seconds += dt.max(0.0);
        self.recompute();
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    pub fn image_uploaded(&self) -> bool {
        self.image_uploaded
    }

    pub fn ai_generated(&self) -> bool {
        self.ai_generated
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn calculate_engagement_score(&self) -> f32 {
        let cfg = &self.config;
        let mut points = 0.0;
        if self.color_customized {
            points += cfg.color_weight;
        }
        if self.text_customized {
            points += cfg.text_weight;
        }
        if self.font_customized {
            points += cfg.font_weight;
        }
        if self.image_uploaded {
            points += cfg.image_weight;
        }
        if self.ai_generated {
            points += cfg.generation_weight;
        }
        if self.template_used {
            points += cfg.template_weight;
        }
        points += self.interaction_count.min(cfg.interaction_cap) as f32 * cfg.interaction_weight;
        points += (self.active_seconds / 60.0 * cfg.points_per_minute).min(cfg.time_cap_points);
        points.clamp(0.0, 100.0)
    }

    fn recompute(&mut self) {
        self.score = self.score.max(self.calculate_engagement_score());
    }
}

impl Default for EngagementTracker {
    fn default() -> Self {
        Self::new(EngagementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_stays_within_bounds() {
        let mut tracker = EngagementTracker::default();
        for signal in [
            EngagementSignal::Color,
            EngagementSignal::Text,
            EngagementSignal::Font,
            EngagementSignal::ImageUpload,
            EngagementSignal::AiGeneration,
            EngagementSignal::Template,
        ] {
            tracker.record(signal);
        }
        for _ in 0..100_000 {
            tracker.touch_interaction();
        }
        tracker.add_active_time(1_000_000.0);
        assert!(tracker.score() <= 100.0);
        assert!(tracker.score() >= 0.0);
    }

    #[test]
    fn score_never_decreases_without_reset() {
        let mut tracker = EngagementTracker::default();
        tracker.record(EngagementSignal::ImageUpload);
        tracker.record(EngagementSignal::AiGeneration);
        let mut previous = tracker.score();
        for _ in 0..200 {
            tracker.touch_interaction();
            tracker.add_active_time(0.5);
            assert!(tracker.score() >= previous);
            previous = tracker.score();
        }
        tracker.reset();
        assert_eq!(tracker.score(), 0.0);
        assert_eq!(tracker.interaction_count(), 0);
    }

    #[test]
    fn time_points_are_capped() {
        let mut tracker = EngagementTracker::default();
        tracker.add_active_time(3600.0);
        let capped = tracker.score();
        tracker.add_active_time(3600.0);
        assert_eq!(tracker.score(), capped);
    }
}
