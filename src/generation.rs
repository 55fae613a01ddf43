use crate::api::{
    Api, ApiFailure, DesignCreated, DesignSubmission, FailureBody, FailureCode, MultiViewRequest,
    MultiViewResponse, TextureRequest, TextureResponse, WireMode,
};
use crate::design::{DesignRecord, ImageRef};
use crate::engagement::{EngagementSignal, EngagementTracker};
use crate::error::{self, GenerationError, LimitScope};
use crate::events::{EventBus, StudioEvent};
use crate::rate_limit::RateLimitState;
use base64::Engine;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// The active generation strategy the UI has selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Manual,
    TextToImage,
    ImageToImage,
}

/// Which orchestrator operation a request or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    TextToImage,
    ImageToImage,
    FullRender,
    MultiView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewAngle {
    Front,
    Side,
    Handle,
}

#[derive(Debug, Clone)]
pub struct ViewEntry {
    pub angle: ViewAngle,
    pub url: String,
    pub generated_at: DateTime<Utc>,
}

/// Alternate-angle renders for one design. Either empty, or anchored by the
/// front view plus at most one entry per remaining angle.
#[derive(Debug, Clone, Default)]
pub struct MultiViewSet {
    entries: Vec<ViewEntry>,
}

impl MultiViewSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    pub fn get(&self, angle: ViewAngle) -> Option<&ViewEntry> {
        self.entries.iter().find(|entry| entry.angle == angle)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Anchor the front entry and fold in newly generated angles. Front
    /// entries arriving from the wire are ignored; repeated angles replace.
    fn merge_generated<I>(&mut self, front_url: &str, views: I)
    where
        I: IntoIterator<Item = (ViewAngle, String)>,
    {
        let now = Utc::now();
        self.upsert(ViewAngle::Front, front_url.to_string(), now);
        for (angle, url) in views {
            if angle == ViewAngle::Front {
                continue;
            }
            self.upsert(angle, url, now);
        }
    }

    fn upsert(&mut self, angle: ViewAngle, url: String, generated_at: DateTime<Utc>) {
        if let Some(existing) = self.entries.iter_mut().find(|entry| entry.angle == angle) {
            existing.url = url;
            existing.generated_at = generated_at;
        } else {
            self.entries.push(ViewEntry { angle, url, generated_at });
        }
    }
}

/// Full-mug render workflow state: the staged render, the prompt it came
/// from, how many attempts it took, and the alternate views hanging off it.
#[derive(Debug, Clone, Default)]
pub struct RenderFlow {
    image: Option<String>,
    prompt: String,
    attempts: u32,
    views: MultiViewSet,
}

impl RenderFlow {
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn views(&self) -> &MultiViewSet {
        &self.views
    }
}

/// Where a texture response lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextureTarget {
    DesignImage,
    Preview,
    Render,
}

impl TextureTarget {
    fn kind(self) -> GenerationKind {
        match self {
            TextureTarget::DesignImage => GenerationKind::TextToImage,
            TextureTarget::Preview => GenerationKind::ImageToImage,
            TextureTarget::Render => GenerationKind::FullRender,
        }
    }
}

/// An issued texture request: the wire payload plus the token that decides
/// whether its response is still the latest for its concern when it lands.
#[derive(Debug, Clone)]
pub struct PendingTexture {
    target: TextureTarget,
    token: u64,
    pub request: TextureRequest,
}

impl PendingTexture {
    pub fn kind(&self) -> GenerationKind {
        self.target.kind()
    }
}

#[derive(Debug, Clone)]
pub struct PendingMultiView {
    token: u64,
    pub request: MultiViewRequest,
}

/// Monotonic per-concern request tokens (see `PendingTexture`).
#[derive(Debug, Default)]
struct RequestTokens {
    design_image: u64,
    preview: u64,
    render: u64,
    multi_view: u64,
}

impl RequestTokens {
    fn issue(&mut self, target: TextureTarget) -> u64 {
        let slot = self.slot(target);
        *slot += 1;
        *slot
    }

    fn latest(&mut self, target: TextureTarget) -> u64 {
        *self.slot(target)
    }

    fn slot(&mut self, target: TextureTarget) -> &mut u64 {
        match target {
            TextureTarget::DesignImage => &mut self.design_image,
            TextureTarget::Preview => &mut self.preview,
            TextureTarget::Render => &mut self.render,
        }
    }
}

/// Ephemeral generation state plus the orchestration around the external
/// endpoint. Mode switches clear exactly the fields invalid for the new
/// mode; every request path clears the in-flight flag on its terminal
/// branch.
///
/// Requests are two-phase: `begin_*` validates, stamps a token and returns
/// the wire payload; `complete_*` applies the outcome unless a newer request
/// for the same concern has been issued in the meantime, in which case the
/// stale response is dropped without touching any state. The async methods
/// bundle both phases around a transport call.
#[derive(Debug)]
pub struct GenerationSession {
    mode: GenerationMode,
    prompt: String,
    base_image: Option<String>,
    preview: Option<String>,
    in_flight: bool,
    last_error: Option<String>,
    multi_view_error: Option<String>,
    render: RenderFlow,
    tokens: RequestTokens,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self {
            mode: GenerationMode::Manual,
            prompt: String::new(),
            base_image: None,
            preview: None,
            in_flight: false,
            last_error: None,
            multi_view_error: None,
            render: RenderFlow::default(),
            tokens: RequestTokens::default(),
        }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn base_image(&self) -> Option<&str> {
        self.base_image.as_deref()
    }

    pub fn set_base_image(&mut self, base_image: Option<String>) {
        self.base_image = base_image;
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn multi_view_error(&self) -> Option<&str> {
        self.multi_view_error.as_deref()
    }

    pub fn render(&self) -> &RenderFlow {
        &self.render
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn dismiss_multi_view_error(&mut self) {
        self.multi_view_error = None;
    }

    /// Switch strategy, clearing exactly the fields the new mode cannot use:
    /// manual drops both the base image and the staged preview, text-to-image
    /// drops the base image, image-to-image drops the preview.
    pub fn set_mode(&mut self, mode: GenerationMode, bus: &mut EventBus) {
        let from = self.mode;
        if from == mode {
            return;
        }
        match mode {
            GenerationMode::Manual => {
                self.base_image = None;
                self.preview = None;
            }
            GenerationMode::TextToImage => {
                self.base_image = None;
            }
            GenerationMode::ImageToImage => {
                self.preview = None;
            }
        }
        self.mode = mode;
        bus.push(StudioEvent::ModeChanged { from, to: mode });
    }

    // ---- request phase ----

    pub fn begin_text(
        &mut self,
        bus: &mut EventBus,
        prompt: &str,
    ) -> Result<PendingTexture, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.reject(GenerationKind::TextToImage, error::EMPTY_PROMPT, bus));
        }
        self.prompt = prompt.to_string();
        let request =
            TextureRequest { prompt: prompt.to_string(), mode: WireMode::TextToImage, base_image: None };
        Ok(self.issue(TextureTarget::DesignImage, request, bus))
    }

    /// An empty base image is rejected here, before any payload exists.
    pub fn begin_image(
        &mut self,
        bus: &mut EventBus,
        base_image: &str,
        prompt: &str,
    ) -> Result<PendingTexture, GenerationError> {
        if base_image.is_empty() {
            return Err(self.reject(GenerationKind::ImageToImage, error::MISSING_BASE_IMAGE, bus));
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.reject(GenerationKind::ImageToImage, error::EMPTY_PROMPT, bus));
        }
        self.prompt = prompt.to_string();
        self.base_image = Some(base_image.to_string());
        let request = TextureRequest {
            prompt: prompt.to_string(),
            mode: WireMode::ImageToImage,
            base_image: Some(base_image.to_string()),
        };
        Ok(self.issue(TextureTarget::Preview, request, bus))
    }

    pub fn begin_render(
        &mut self,
        bus: &mut EventBus,
        prompt: &str,
    ) -> Result<PendingTexture, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.reject(GenerationKind::FullRender, error::EMPTY_PROMPT, bus));
        }
        self.render.prompt = prompt.to_string();
        Ok(self.issue_render(bus))
    }

    /// Re-run the stored render prompt, bumping the attempt counter.
    pub fn begin_regenerate(&mut self, bus: &mut EventBus) -> Result<PendingTexture, GenerationError> {
        if self.render.image.is_none() || self.render.prompt.is_empty() {
            return Err(self.reject(GenerationKind::FullRender, error::MISSING_RENDER, bus));
        }
        Ok(self.issue_render(bus))
    }

    pub fn begin_multi_view(
        &mut self,
        design: &DesignRecord,
        bus: &mut EventBus,
    ) -> Result<PendingMultiView, GenerationError> {
        if self.render.image.is_none() || self.render.prompt.is_empty() {
            let err = GenerationError::Validation(error::MISSING_RENDER);
            self.multi_view_error = Some(err.to_string());
            bus.push(StudioEvent::GenerationFailed {
                kind: GenerationKind::MultiView,
                message: err.to_string(),
            });
            return Err(err);
        }
        self.multi_view_error = None;
        self.in_flight = true;
        self.tokens.multi_view += 1;
        debug!("generation request started: MultiView");
        bus.push(StudioEvent::GenerationStarted { kind: GenerationKind::MultiView });
        let request = MultiViewRequest {
            design_id: design.id().to_string(),
            base_prompt: self.render.prompt.clone(),
            view_angles: vec![ViewAngle::Side, ViewAngle::Handle],
        };
        Ok(PendingMultiView { token: self.tokens.multi_view, request })
    }

    // ---- completion phase ----

    /// Apply a texture outcome. A response that is no longer the latest for
    /// its concern is dropped whole: the winner's terminal branch owns the
    /// shared flags.
    pub fn complete_texture(
        &mut self,
        pending: &PendingTexture,
        outcome: Result<TextureResponse, ApiFailure>,
        design: &mut DesignRecord,
        limits: &mut RateLimitState,
        engagement: &mut EngagementTracker,
        bus: &mut EventBus,
    ) -> Result<(), GenerationError> {
        if pending.token != self.tokens.latest(pending.target) {
            debug!("dropping stale {:?} response", pending.kind());
            return Ok(());
        }
        self.in_flight = false;
        match outcome {
            Ok(response) => {
                limits.note_success();
                if let Some(quota) = response.quota {
                    limits.merge_quota(quota.remaining, quota.limit, quota.ip_used);
                }
                match pending.target {
                    TextureTarget::DesignImage => {
                        if design.set_image(ImageRef::generated(response.image_url)) {
                            engagement.record(EngagementSignal::ImageUpload);
                        }
                    }
                    TextureTarget::Preview => {
                        self.preview = Some(response.image_url);
                    }
                    TextureTarget::Render => {
                        self.render.image = Some(response.image_url);
                    }
                }
                engagement.record(EngagementSignal::AiGeneration);
                info!("{:?} generation applied", pending.kind());
                bus.push(StudioEvent::GenerationSucceeded { kind: pending.kind() });
                Ok(())
            }
            Err(failure) => Err(self.fail(pending.kind(), limits, bus, failure)),
        }
    }

    /// Merge a multi-view outcome. Partial success (fewer angles than asked
    /// for) is still success.
    pub fn complete_multi_view(
        &mut self,
        pending: &PendingMultiView,
        outcome: Result<MultiViewResponse, ApiFailure>,
        limits: &mut RateLimitState,
        bus: &mut EventBus,
    ) -> Result<(), GenerationError> {
        if pending.token != self.tokens.multi_view {
            debug!("dropping stale multi-view response");
            return Ok(());
        }
        self.in_flight = false;
        match outcome {
            Ok(response) => {
                let front = self.render.image.clone().unwrap_or_default();
                let returned = response.views.len();
                self.render
                    .views
                    .merge_generated(&front, response.views.into_iter().map(|view| (view.angle, view.url)));
                let partial = response.partial_success.unwrap_or(returned < 2);
                info!("multi-view merged: {} entries (partial={partial})", self.render.views.len());
                bus.push(StudioEvent::MultiViewReady { view_count: self.render.views.len(), partial });
                Ok(())
            }
            Err(failure) => {
                let err = classify(limits, failure);
                self.multi_view_error = Some(err.to_string());
                bus.push(StudioEvent::GenerationFailed {
                    kind: GenerationKind::MultiView,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    // ---- bundled async operations ----

    /// Text-to-image: a successful response lands directly in the design's
    /// image field.
    pub async fn generate_from_text<A: Api>(
        &mut self,
        api: &A,
        design: &mut DesignRecord,
        limits: &mut RateLimitState,
        engagement: &mut EngagementTracker,
        bus: &mut EventBus,
        prompt: &str,
    ) -> Result<(), GenerationError> {
        let pending = self.begin_text(bus, prompt)?;
        let outcome = api.generate_texture(&pending.request).await;
        self.complete_texture(&pending, outcome, design, limits, engagement, bus)
    }

    /// Image-to-image: results stage into the preview field; the caller
    /// commits them with `apply_preview`.
    pub async fn generate_from_image<A: Api>(
        &mut self,
        api: &A,
        design: &mut DesignRecord,
        limits: &mut RateLimitState,
        engagement: &mut EngagementTracker,
        bus: &mut EventBus,
        base_image: &str,
        prompt: &str,
    ) -> Result<(), GenerationError> {
        let pending = self.begin_image(bus, base_image, prompt)?;
        let outcome = api.generate_texture(&pending.request).await;
        self.complete_texture(&pending, outcome, design, limits, engagement, bus)
    }

    /// Full-mug render: stages into the render flow, not the design record.
    pub async fn generate_render<A: Api>(
        &mut self,
        api: &A,
        design: &mut DesignRecord,
        limits: &mut RateLimitState,
        engagement: &mut EngagementTracker,
        bus: &mut EventBus,
        prompt: &str,
    ) -> Result<(), GenerationError> {
        let pending = self.begin_render(bus, prompt)?;
        let outcome = api.generate_texture(&pending.request).await;
        self.complete_texture(&pending, outcome, design, limits, engagement, bus)
    }

    pub async fn regenerate_render<A: Api>(
        &mut self,
        api: &A,
        design: &mut DesignRecord,
        limits: &mut RateLimitState,
        engagement: &mut EngagementTracker,
        bus: &mut EventBus,
    ) -> Result<(), GenerationError> {
        let pending = self.begin_regenerate(bus)?;
        let outcome = api.generate_texture(&pending.request).await;
        self.complete_texture(&pending, outcome, design, limits, engagement, bus)
    }

    /// Alternate angles for an existing render.
    pub async fn generate_multi_view<A: Api>(
        &mut self,
        api: &A,
        design: &DesignRecord,
        limits: &mut RateLimitState,
        bus: &mut EventBus,
    ) -> Result<(), GenerationError> {
        let pending = self.begin_multi_view(design, bus)?;
        let outcome = api.generate_multi_view(&pending.request).await;
        self.complete_multi_view(&pending, outcome, limits, bus)
    }

    /// Commit the staged preview into the design record. Returns false when
    /// there was nothing staged.
    pub fn apply_preview(
        &mut self,
        design: &mut DesignRecord,
        engagement: &mut EngagementTracker,
        bus: &mut EventBus,
    ) -> bool {
        let Some(url) = self.preview.take() else {
            return false;
        };
        if design.set_image(ImageRef::generated(url)) {
            engagement.record(EngagementSignal::ImageUpload);
        }
        bus.push(StudioEvent::PreviewApplied);
        true
    }

    /// Accept the staged render: commit it and mark the design complete.
    pub fn accept_render(
        &mut self,
        design: &mut DesignRecord,
        engagement: &mut EngagementTracker,
        bus: &mut EventBus,
    ) -> bool {
        let Some(url) = self.render.image.clone() else {
            return false;
        };
        if design.set_image(ImageRef::generated(url)) {
            engagement.record(EngagementSignal::ImageUpload);
        }
        design.mark_complete();
        bus.push(StudioEvent::RenderAccepted { attempts: self.render.attempts });
        true
    }

    /// Back to prompt editing: drop the render and its views, keep the
    /// prompt text.
    pub fn adjust_render(&mut self) {
        self.render.image = None;
        self.render.views.clear();
    }

    /// Persist the committed design as a lead. `uploaded_image` carries the
    /// raw bytes handed over by the upload collaborator, if any.
    pub async fn submit_design<A: Api>(
        &mut self,
        api: &A,
        design: &DesignRecord,
        bus: &mut EventBus,
        uploaded_image: Option<&[u8]>,
    ) -> Result<DesignCreated, GenerationError> {
        let text = design.text();
        let request = DesignSubmission {
            mug_color: design.color().to_string(),
            uploaded_image_base64: uploaded_image
                .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
            custom_text: text.map(|block| block.content.clone()),
            text_font: text.map(|block| block.font.clone()),
            text_position: text.map(|block| block.position.to_array()),
            text_size: text.map(|block| block.size),
            text_color: text.map(|block| block.color.clone()),
        };
        match api.submit_design(&request).await {
            Ok(created) => {
                info!("design submitted, lead id {}", created.data.id);
                bus.push(StudioEvent::DesignSubmitted { lead_id: created.data.id.clone() });
                Ok(created)
            }
            Err(ApiFailure::Rejected(body)) => Err(GenerationError::Request(failure_message(&body))),
            Err(ApiFailure::Transport(message)) => {
                warn!("design submission failed: {message}");
                Err(GenerationError::Request(error::GENERIC_FAILURE.to_string()))
            }
        }
    }

    // ---- internals ----

    fn issue(
        &mut self,
        target: TextureTarget,
        request: TextureRequest,
        bus: &mut EventBus,
    ) -> PendingTexture {
        self.last_error = None;
        self.in_flight = true;
        let token = self.tokens.issue(target);
        debug!("generation request started: {:?}", target.kind());
        bus.push(StudioEvent::GenerationStarted { kind: target.kind() });
        PendingTexture { target, token, request }
    }

    fn issue_render(&mut self, bus: &mut EventBus) -> PendingTexture {
        self.render.attempts += 1;
        let request = TextureRequest {
            prompt: self.render.prompt.clone(),
            mode: WireMode::FullMugRender,
            base_image: None,
        };
        self.issue(TextureTarget::Render, request, bus)
    }

    fn reject(
        &mut self,
        kind: GenerationKind,
        message: &'static str,
        bus: &mut EventBus,
    ) -> GenerationError {
        let err = GenerationError::Validation(message);
        self.last_error = Some(message.to_string());
        bus.push(StudioEvent::GenerationFailed { kind, message: message.to_string() });
        err
    }

    fn fail(
        &mut self,
        kind: GenerationKind,
        limits: &mut RateLimitState,
        bus: &mut EventBus,
        failure: ApiFailure,
    ) -> GenerationError {
        let err = classify(limits, failure);
        self.last_error = Some(err.to_string());
        bus.push(StudioEvent::GenerationFailed { kind, message: err.to_string() });
        err
    }
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new()
    }
}

fn failure_message(body: &FailureBody) -> String {
    if body.error.is_empty() {
        error::GENERIC_FAILURE.to_string()
    } else {
        body.error.clone()
    }
}

/// Map a transport outcome onto the error taxonomy, updating the rate-limit
/// tiers for the two limit codes.
fn classify(limits: &mut RateLimitState, failure: ApiFailure) -> GenerationError {
    match failure {
        ApiFailure::Rejected(body) => match body.code {
            Some(FailureCode::GlobalLimitReached) => {
                limits.note_global_reached(body.retry_after);
                GenerationError::RateLimited {
                    scope: LimitScope::Global,
                    retry_after_secs: body.retry_after,
                    message: failure_message(&body),
                }
            }
            Some(FailureCode::IpLimitReached) => {
                limits.note_client_exhausted(body.limit, body.retry_after);
                GenerationError::RateLimited {
                    scope: LimitScope::PerClient,
                    retry_after_secs: body.retry_after,
                    message: failure_message(&body),
                }
            }
            None => GenerationError::Request(failure_message(&body)),
        },
        ApiFailure::Transport(message) => {
            warn!("generation transport failure: {message}");
            GenerationError::Request(error::GENERIC_FAILURE.to_string())
        }
    }
}
