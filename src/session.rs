use crate::api::{Api, DesignCreated, HttpApi};
use crate::camera::{CameraController, CameraPose, CameraSignal};
use crate::config::StudioConfig;
use crate::design::{DesignRecord, DesignTemplate, DesignUpdate, ImageRef};
use crate::engagement::{EngagementSignal, EngagementTracker};
use crate::error::GenerationError;
use crate::events::{EventBus, StudioEvent};
use crate::generation::{GenerationMode, GenerationSession};
use crate::interaction::InteractionState;
use crate::quality::{QualityGovernor, RenderSettings};
use crate::rate_limit::RateLimitState;
use glam::{Vec2, Vec3};

/// One customization session: the single owner of the design record, the
/// generation state, quota tracking, both viewport control loops and the
/// engagement score. Constructed per visitor; the rendering/UI layer holds a
/// reference and drives it from its event loop.
pub struct StudioSession<A> {
    api: A,
    design: DesignRecord,
    generation: GenerationSession,
    limits: RateLimitState,
    camera: CameraController,
    interaction: InteractionState,
    governor: QualityGovernor,
    engagement: EngagementTracker,
    events: EventBus,
}

impl StudioSession<HttpApi> {
    /// Production session against the configured HTTP endpoint.
    pub fn with_http(config: StudioConfig) -> Self {
        let api = HttpApi::new(config.generation.base_url.clone());
        Self::new(api, config)
    }
}

impl<A: Api> StudioSession<A> {
    pub fn new(api: A, config: StudioConfig) -> Self {
        let default_pose = CameraPose::new(
            Vec3::from_array(config.camera.default_position),
            Vec3::from_array(config.camera.default_target),
        );
        Self {
            api,
            design: DesignRecord::new(),
            generation: GenerationSession::new(),
            limits: RateLimitState::new(config.generation.session_limit, config.generation.client_limit),
            camera: CameraController::new(
                default_pose,
                config.camera.idle_delay_secs,
                config.camera.return_duration_secs,
            ),
            interaction: InteractionState::new(),
            governor: QualityGovernor::new(config.performance),
            engagement: EngagementTracker::new(config.engagement),
            events: EventBus::default(),
        }
    }

    /// Transport access, mostly for tests and diagnostics.
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn design(&self) -> &DesignRecord {
        &self.design
    }

    pub fn generation(&self) -> &GenerationSession {
        &self.generation
    }

    pub fn limits(&self) -> &RateLimitState {
        &self.limits
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn render_settings(&self) -> RenderSettings {
        self.governor.settings()
    }

    pub fn quality_notification_active(&self) -> bool {
        self.governor.notification_active()
    }

    pub fn engagement(&self) -> &EngagementTracker {
        &self.engagement
    }

    pub fn drain_events(&mut self) -> Vec<StudioEvent> {
        self.events.drain()
    }

    // ---- design mutation, feeding the engagement scorer ----

    pub fn set_mug_color(&mut self, color: impl Into<String>) {
        self.design.set_color(color);
        self.engagement.record(EngagementSignal::Color);
    }

    pub fn set_custom_text(&mut self, content: impl Into<String>) {
        self.design.set_text(content);
        self.engagement.record(EngagementSignal::Text);
    }

    pub fn set_text_font(&mut self, font: impl Into<String>) {
        self.design.set_font(font);
        self.engagement.record(EngagementSignal::Font);
    }

    pub fn set_text_size(&mut self, size: f32) {
        self.design.set_text_size(size);
        self.engagement.touch_interaction();
    }

    pub fn set_text_color(&mut self, color: impl Into<String>) {
        self.design.set_text_color(color);
        self.engagement.touch_interaction();
    }

    pub fn set_text_position(&mut self, position: Vec3) {
        self.design.set_text_position(position);
        self.engagement.touch_interaction();
    }

    /// Entry point for the upload collaborator.
    pub fn set_uploaded_image(&mut self, url: impl Into<String>) {
        if self.design.set_image(ImageRef::uploaded(url)) {
            self.engagement.record(EngagementSignal::ImageUpload);
        } else {
            self.engagement.touch_interaction();
        }
    }

    pub fn apply_design_update(&mut self, update: DesignUpdate) {
        if self.design.apply_update(update) {
            self.engagement.record(EngagementSignal::ImageUpload);
        } else {
            self.engagement.touch_interaction();
        }
    }

    pub fn apply_template(&mut self, template: &DesignTemplate) {
        if self.design.apply_update(template.update.clone()) {
            self.engagement.record(EngagementSignal::ImageUpload);
        }
        self.engagement.record(EngagementSignal::Template);
        self.events.push(StudioEvent::TemplateSelected { name: template.name.clone() });
    }

    pub fn clear_image(&mut self) {
        self.design.clear_image();
    }

    pub fn reset_color(&mut self) {
        self.design.reset_color();
    }

    pub fn clear_text(&mut self) {
        self.design.clear_text();
    }

    /// Full design reset: fresh identity and defaults. Engagement and quota
    /// state deliberately survive; they are session-scoped, not per design.
    pub fn reset_design(&mut self) {
        self.design.reset();
    }

    // ---- viewport wiring ----

    pub fn pointer_down(&mut self, position: Vec2) {
        self.interaction.pointer_down(position);
        self.camera.interaction_started();
        self.engagement.touch_interaction();
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.interaction.pointer_move(position);
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
        self.camera.arm();
    }

    pub fn wheel(&mut self, delta: f32) {
        self.interaction.wheel(delta);
        self.camera.arm();
        self.engagement.touch_interaction();
    }

    /// Orbit/zoom input writes the pose directly; the auto-return picks it
    /// up as the interpolation start if it ever fires.
    pub fn set_camera_pose(&mut self, pose: CameraPose) {
        self.camera.set_pose(pose);
    }

    pub fn set_constrained_viewport(&mut self, constrained: bool) {
        self.governor.set_constrained_viewport(constrained);
    }

    /// Per-frame tick from the render loop: advances the idle clock, the
    /// camera return and the quality governor, and turns their signals into
    /// domain events.
    pub fn frame(&mut self, dt: f32) {
        self.interaction.tick(dt);
        self.engagement.add_active_time(dt);
        if let Some(signal) = self.camera.tick(dt) {
            self.events.push(match signal {
                CameraSignal::ReturnStarted => StudioEvent::CameraReturnStarted,
                CameraSignal::ReturnCompleted => StudioEvent::CameraReturnCompleted,
            });
        }
        if self.governor.record_frame(dt).is_some() {
            let settings = self.governor.settings();
            self.events.push(StudioEvent::QualityChanged {
                level: settings.quality,
                shadows: settings.shadows,
            });
        }
    }

    /// Component teardown: drop any pending auto-return timer.
    pub fn teardown(&mut self) {
        self.camera.shutdown();
    }

    // ---- generation orchestration ----

    pub fn set_mode(&mut self, mode: GenerationMode) {
        self.generation.set_mode(mode, &mut self.events);
    }

    pub async fn generate_from_text(&mut self, prompt: &str) -> Result<(), GenerationError> {
        self.generation
            .generate_from_text(
                &self.api,
                &mut self.design,
                &mut self.limits,
                &mut self.engagement,
                &mut self.events,
                prompt,
            )
            .await
    }

    pub async fn generate_from_image(
        &mut self,
        base_image: &str,
        prompt: &str,
    ) -> Result<(), GenerationError> {
        self.generation
            .generate_from_image(
                &self.api,
                &mut self.design,
                &mut self.limits,
                &mut self.engagement,
                &mut self.events,
                base_image,
                prompt,
            )
            .await
    }

    pub fn apply_preview(&mut self) -> bool {
        self.generation.apply_preview(&mut self.design, &mut self.engagement, &mut self.events)
    }

    pub async fn generate_render(&mut self, prompt: &str) -> Result<(), GenerationError> {
        self.generation
            .generate_render(
                &self.api,
                &mut self.design,
                &mut self.limits,
                &mut self.engagement,
                &mut self.events,
                prompt,
            )
            .await
    }

    pub async fn regenerate_render(&mut self) -> Result<(), GenerationError> {
        self.generation
            .regenerate_render(
                &self.api,
                &mut self.design,
                &mut self.limits,
                &mut self.engagement,
                &mut self.events,
            )
            .await
    }

    pub fn adjust_render(&mut self) {
        self.generation.adjust_render();
    }

    pub fn accept_render(&mut self) -> bool {
        self.generation.accept_render(&mut self.design, &mut self.engagement, &mut self.events)
    }

    pub async fn generate_multi_view(&mut self) -> Result<(), GenerationError> {
        self.generation
            .generate_multi_view(&self.api, &self.design, &mut self.limits, &mut self.events)
            .await
    }

    pub async fn submit_design(
        &mut self,
        uploaded_image: Option<&[u8]>,
    ) -> Result<DesignCreated, GenerationError> {
        self.generation.submit_design(&self.api, &self.design, &mut self.events, uploaded_image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        ApiFailure, DesignSubmission, MultiViewRequest, MultiViewResponse, TextureRequest,
        TextureResponse,
    };
    use crate::design::builtin_templates;

    /// Transport stub for the synchronous wiring tests; the request paths
    /// themselves are covered by the integration suites.
    struct NullApi;

    impl Api for NullApi {
        async fn generate_texture(&self, _: &TextureRequest) -> Result<TextureResponse, ApiFailure> {
            Err(ApiFailure::Transport("unused".to_string()))
        }

        async fn generate_multi_view(
            &self,
            _: &MultiViewRequest,
        ) -> Result<MultiViewResponse, ApiFailure> {
            Err(ApiFailure::Transport("unused".to_string()))
        }

        async fn submit_design(&self, _: &DesignSubmission) -> Result<DesignCreated, ApiFailure> {
            Err(ApiFailure::Transport("unused".to_string()))
        }
    }

    fn session() -> StudioSession<NullApi> {
        StudioSession::new(NullApi, StudioConfig::default())
    }

    #[test]
    fn template_application_goes_through_bulk_update() {
        let mut studio = session();
        let template = &builtin_templates()[1];
        studio.apply_template(template);
        assert_eq!(studio.design().color(), "#f59e0b");
        assert_eq!(studio.design().text().map(|block| block.content.as_str()), Some("Happy Birthday!"));
        let events = studio.drain_events();
        assert!(events
            .iter()
            .any(|event| matches!(event, StudioEvent::TemplateSelected { name } if name == "Birthday")));
        assert!(studio.engagement().score() > 0.0);
    }

    #[test]
    fn upload_signal_fires_once_per_transition() {
        let mut studio = session();
        studio.set_uploaded_image("blob:art");
        let first = studio.engagement().score();
        studio.set_uploaded_image("blob:other");
        // Replacing an existing image adds interactions, not the image weight.
        assert!(studio.engagement().score() - first < 1.0);
    }

    #[test]
    fn pointer_release_arms_the_auto_return() {
        let mut studio = session();
        studio.pointer_down(Vec2::new(4.0, 2.0));
        assert!(!studio.camera().is_armed());
        studio.pointer_up();
        assert!(studio.camera().is_armed());
        studio.pointer_down(Vec2::new(5.0, 2.0));
        assert!(!studio.camera().is_armed());
    }

    #[test]
    fn frame_tick_surfaces_camera_events() {
        let mut studio = session();
        studio.set_camera_pose(CameraPose::new(Vec3::new(2.0, 2.0, 2.0), Vec3::ZERO));
        studio.pointer_up();
        studio.frame(5.1);
        for _ in 0..130 {
            studio.frame(0.01);
        }
        let events = studio.drain_events();
        assert!(events.iter().any(|event| matches!(event, StudioEvent::CameraReturnStarted)));
        assert!(events.iter().any(|event| matches!(event, StudioEvent::CameraReturnCompleted)));
        assert_eq!(studio.camera().pose(), studio.camera().default_pose());
    }
}
