use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_idle_delay_secs")]
    pub idle_delay_secs: f32,
    #[serde(default = "CameraConfig::default_return_duration_secs")]
    pub return_duration_secs: f32,
    #[serde(default = "CameraConfig::default_position")]
    pub default_position: [f32; 3],
    #[serde(default = "CameraConfig::default_target")]
    pub default_target: [f32; 3],
}

impl CameraConfig {
    fn default_idle_delay_secs() -> f32 {
        5.0
    }

    fn default_return_duration_secs() -> f32 {
        1.2
    }

    const fn default_position() -> [f32; 3] {
        [0.0, 1.4, 4.5]
    }

    const fn default_target() -> [f32; 3] {
        [0.0, 0.6, 0.0]
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            idle_delay_secs: Self::default_idle_delay_secs(),
            return_duration_secs: Self::default_return_duration_secs(),
            default_position: Self::default_position(),
            default_target: Self::default_target(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "PerformanceConfig::default_target_fps")]
    pub target_fps: f32,
    #[serde(default = "PerformanceConfig::default_constrained_target_fps")]
    pub constrained_target_fps: f32,
    #[serde(default = "PerformanceConfig::default_frame_window")]
    pub frame_window: usize,
    #[serde(default = "PerformanceConfig::default_sample_interval_secs")]
    pub sample_interval_secs: f32,
    #[serde(default = "PerformanceConfig::default_degrade_streak")]
    pub degrade_streak: u32,
    #[serde(default = "PerformanceConfig::default_degrade_cooldown_secs")]
    pub degrade_cooldown_secs: f32,
    #[serde(default = "PerformanceConfig::default_upgrade_cooldown_secs")]
    pub upgrade_cooldown_secs: f32,
    #[serde(default = "PerformanceConfig::default_notification_secs")]
    pub notification_secs: f32,
}

impl PerformanceConfig {
    fn default_target_fps() -> f32 {
        60.0
    }

    fn default_constrained_target_fps() -> f32 {
        30.0
    }

    const fn default_frame_window() -> usize {
        60
    }

    fn default_sample_interval_secs() -> f32 {
        1.0
    }

    const fn default_degrade_streak() -> u32 {
        5
    }

    fn default_degrade_cooldown_secs() -> f32 {
        3.0
    }

    fn default_upgrade_cooldown_secs() -> f32 {
        10.0
    }

    fn default_notification_secs() -> f32 {
        5.0
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            target_fps: Self::default_target_fps(),
            constrained_target_fps: Self::default_constrained_target_fps(),
            frame_window: Self::default_frame_window(),
            sample_interval_secs: Self::default_sample_interval_secs(),
            degrade_streak: Self::default_degrade_streak(),
            degrade_cooldown_secs: Self::default_degrade_cooldown_secs(),
            upgrade_cooldown_secs: Self::default_upgrade_cooldown_secs(),
            notification_secs: Self::default_notification_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "GenerationConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "GenerationConfig::default_session_limit")]
    pub session_limit: u32,
    #[serde(default = "GenerationConfig::default_client_limit")]
    pub client_limit: u32,
}

impl GenerationConfig {
    fn default_base_url() -> String {
        "https://api.mugforge.app".to_string()
    }

    const fn default_session_limit() -> u32 {
        5
    }

    const fn default_client_limit() -> u32 {
        15
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            session_limit: Self::default_session_limit(),
            client_limit: Self::default_client_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    #[serde(default = "EngagementConfig::default_color_weight")]
    pub color_weight: f32,
    #[serde(default = "EngagementConfig::default_text_weight")]
    pub text_weight: f32,
    #[serde(default = "EngagementConfig::default_font_weight")]
    pub font_weight: f32,
    #[serde(default = "EngagementConfig::default_image_weight")]
    pub image_weight: f32,
    #[serde(default = "EngagementConfig::default_generation_weight")]
    pub generation_weight: f32,
    #[serde(default = "EngagementConfig::default_template_weight")]
    pub template_weight: f32,
    #[serde(default = "EngagementConfig::default_interaction_weight")]
    pub interaction_weight: f32,
    #[serde(default = "EngagementConfig::default_interaction_cap")]
    pub interaction_cap: u32,
    #[serde(default = "EngagementConfig::default_points_per_minute")]
    pub points_per_minute: f32,
    #[serde(default = "EngagementConfig::default_time_cap_points")]
    pub time_cap_points: f32,
}

impl EngagementConfig {
    fn default_color_weight() -> f32 {
        10.0
    }

    fn default_text_weight() -> f32 {
        15.0
    }

    fn default_font_weight() -> f32 {
        5.0
    }

    fn default_image_weight() -> f32 {
        20.0
    }

    fn default_generation_weight() -> f32 {
        20.0
    }

    fn default_template_weight() -> f32 {
        5.0
    }

    fn default_interaction_weight() -> f32 {
        0.3
    }

    const fn default_interaction_cap() -> u32 {
        50
    }

    fn default_points_per_minute() -> f32 {
        2.0
    }

    fn default_time_cap_points() -> f32 {
        10.0
    }
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            color_weight: Self::default_color_weight(),
            text_weight: Self::default_text_weight(),
            font_weight: Self::default_font_weight(),
            image_weight: Self::default_image_weight(),
            generation_weight: Self::default_generation_weight(),
            template_weight: Self::default_template_weight(),
            interaction_weight: Self::default_interaction_weight(),
            interaction_cap: Self::default_interaction_cap(),
            points_per_minute: Self::default_points_per_minute(),
            time_cap_points: Self::default_time_cap_points(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub engagement: EngagementConfig,
}

impl StudioConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("config load error: {err:?}, falling back to defaults");
                Self::default()
            }
        }
    }
}
