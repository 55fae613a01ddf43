use chrono::{DateTime, Utc};
use glam::Vec3;
use uuid::Uuid;

/// Mug body palette offered by the configurator UI.
pub const MUG_COLORS: &[&str] = &["#ffffff", "#1f2937", "#b91c1c", "#1d4ed8", "#15803d", "#f59e0b"];

/// Fonts the text tool may pick from.
pub const TEXT_FONTS: &[&str] = &["Arial", "Georgia", "Courier New", "Brush Script MT", "Impact"];

pub const DEFAULT_MUG_COLOR: &str = "#ffffff";

pub fn is_preset_color(color: &str) -> bool {
    MUG_COLORS.contains(&color)
}

pub fn is_known_font(font: &str) -> bool {
    TEXT_FONTS.contains(&font)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Uploaded,
    Generated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub url: String,
    pub source: ImageSource,
}

impl ImageRef {
    pub fn uploaded(url: impl Into<String>) -> Self {
        Self { url: url.into(), source: ImageSource::Uploaded }
    }

    pub fn generated(url: impl Into<String>) -> Self {
        Self { url: url.into(), source: ImageSource::Generated }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub content: String,
    pub font: String,
    pub size: f32,
    pub color: String,
    pub position: Vec3,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            font: TEXT_FONTS[0].to_string(),
            size: 1.0,
            color: "#1f2937".to_string(),
            position: Vec3::new(0.0, 0.25, 0.0),
        }
    }
}

/// Partial field set for bulk updates; `None` fields keep their prior value.
#[derive(Debug, Clone, Default)]
pub struct DesignUpdate {
    pub color: Option<String>,
    pub text: Option<String>,
    pub font: Option<String>,
    pub text_size: Option<f32>,
    pub text_color: Option<String>,
    pub text_position: Option<Vec3>,
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone)]
pub struct DesignTemplate {
    pub name: String,
    pub update: DesignUpdate,
}

pub fn builtin_templates() -> Vec<DesignTemplate> {
    vec![
        DesignTemplate {
            name: "Monogram".to_string(),
            update: DesignUpdate {
                color: Some("#ffffff".to_string()),
                text: Some("A".to_string()),
                font: Some("Georgia".to_string()),
                text_size: Some(2.2),
                text_color: Some("#1f2937".to_string()),
                ..DesignUpdate::default()
            },
        },
        DesignTemplate {
            name: "Birthday".to_string(),
            update: DesignUpdate {
                color: Some("#f59e0b".to_string()),
                text: Some("Happy Birthday!".to_string()),
                font: Some("Brush Script MT".to_string()),
                text_color: Some("#ffffff".to_string()),
                ..DesignUpdate::default()
            },
        },
        DesignTemplate {
            name: "Team".to_string(),
            update: DesignUpdate {
                color: Some("#1d4ed8".to_string()),
                text: Some("TEAM".to_string()),
                font: Some("Impact".to_string()),
                text_size: Some(1.6),
                text_color: Some("#ffffff".to_string()),
                ..DesignUpdate::default()
            },
        },
    ]
}

/// The committed customization state. Every mutation refreshes the
/// modification stamp; identity changes only on a full reset.
#[derive(Debug, Clone)]
pub struct DesignRecord {
    id: Uuid,
    color: String,
    text: Option<TextBlock>,
    image: Option<ImageRef>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DesignRecord {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            color: DEFAULT_MUG_COLOR.to_string(),
            text: None,
            image: None,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn text(&self) -> Option<&TextBlock> {
        self.text.as_ref()
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
        self.touch();
    }

    pub fn set_text(&mut self, content: impl Into<String>) {
        self.text_block_mut().content = content.into();
        self.touch();
    }

    pub fn set_font(&mut self, font: impl Into<String>) {
        self.text_block_mut().font = font.into();
        self.touch();
    }

    pub fn set_text_size(&mut self, size: f32) {
        self.text_block_mut().size = size;
        self.touch();
    }

    pub fn set_text_color(&mut self, color: impl Into<String>) {
        self.text_block_mut().color = color.into();
        self.touch();
    }

    pub fn set_text_position(&mut self, position: Vec3) {
        self.text_block_mut().position = position;
        self.touch();
    }

    /// Returns true when the image reference transitioned absent → present,
    /// so the caller can fire the engagement signal exactly once.
    pub fn set_image(&mut self, image: ImageRef) -> bool {
        let introduced = self.image.is_none();
        self.image = Some(image);
        self.touch();
        introduced
    }

    pub fn mark_complete(&mut self) {
        self.completed = true;
        self.touch();
    }

    /// Non-destructive merge of a partial field set. Returns true when the
    /// update introduced an image reference.
    pub fn apply_update(&mut self, update: DesignUpdate) -> bool {
        let mut introduced = false;
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(text) = update.text {
            self.text_block_mut().content = text;
        }
        if let Some(font) = update.font {
            self.text_block_mut().font = font;
        }
        if let Some(size) = update.text_size {
            self.text_block_mut().size = size;
        }
        if let Some(color) = update.text_color {
            self.text_block_mut().color = color;
        }
        if let Some(position) = update.text_position {
            self.text_block_mut().position = position;
        }
        if let Some(image) = update.image {
            introduced = self.image.is_none();
            self.image = Some(image);
        }
        self.touch();
        introduced
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.touch();
    }

    pub fn reset_color(&mut self) {
        self.color = DEFAULT_MUG_COLOR.to_string();
        self.touch();
    }

    pub fn clear_text(&mut self) {
        self.text = None;
        self.touch();
    }

    /// Full reset: fresh identity, default field values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn text_block_mut(&mut self) -> &mut TextBlock {
        self.text.get_or_insert_with(TextBlock::default)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for DesignRecord {
    fn default() -> Self {
        Self::new()
    }
}
