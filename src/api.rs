use crate::generation::ViewAngle;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Generation strategy names as the endpoint spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMode {
    #[serde(rename = "text-to-image")]
    TextToImage,
    #[serde(rename = "image-to-image")]
    ImageToImage,
    #[serde(rename = "full-mug-render")]
    FullMugRender,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureRequest {
    pub prompt: String,
    pub mode: WireMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaBlock {
    pub remaining: u32,
    pub limit: u32,
    #[serde(default)]
    pub ip_used: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureResponse {
    pub image_url: String,
    #[serde(default)]
    pub quota: Option<QuotaBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FailureCode {
    #[serde(rename = "GLOBAL_LIMIT_REACHED")]
    GlobalLimitReached,
    #[serde(rename = "IP_LIMIT_REACHED")]
    IpLimitReached,
}

/// Failure payload shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub error: String,
    #[serde(default)]
    pub code: Option<FailureCode>,
    #[serde(default)]
    pub retry_after: Option<u64>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiViewRequest {
    pub design_id: String,
    pub base_prompt: String,
    pub view_angles: Vec<ViewAngle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireView {
    pub angle: ViewAngle,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiViewResponse {
    pub views: Vec<WireView>,
    #[serde(default)]
    pub partial_success: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSubmission {
    pub mug_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_position: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DesignCreated {
    pub success: bool,
    pub data: DesignLead,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DesignLead {
    pub id: String,
}

/// A call that didn't produce a success payload: either the endpoint
/// rejected it with the shared failure shape, or the request never
/// completed. The orchestrator classifies these; transport keeps no policy.
#[derive(Debug, Clone)]
pub enum ApiFailure {
    Rejected(FailureBody),
    Transport(String),
}

#[allow(async_fn_in_trait)]
pub trait Api {
    async fn generate_texture(&self, request: &TextureRequest) -> Result<TextureResponse, ApiFailure>;
    async fn generate_multi_view(
        &self,
        request: &MultiViewRequest,
    ) -> Result<MultiViewResponse, ApiFailure>;
    async fn submit_design(&self, request: &DesignSubmission) -> Result<DesignCreated, ApiFailure>;
}

/// Production transport: JSON POSTs against the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: reqwest::Client::new(), base_url }
    }

    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, ApiFailure>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(request)
            .send()
            .await
            .map_err(|err| ApiFailure::Transport(format!("request failed: {err}")))?;
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|err| ApiFailure::Transport(format!("unreadable response: {err}")))
        } else {
            match response.json::<FailureBody>().await {
                Ok(body) => Err(ApiFailure::Rejected(body)),
                Err(err) => Err(ApiFailure::Transport(format!("unreadable error response: {err}"))),
            }
        }
    }
}

impl Api for HttpApi {
    async fn generate_texture(&self, request: &TextureRequest) -> Result<TextureResponse, ApiFailure> {
        self.post_json("/generate-texture", request).await
    }

    async fn generate_multi_view(
        &self,
        request: &MultiViewRequest,
    ) -> Result<MultiViewResponse, ApiFailure> {
        self.post_json("/generate-multi-view", request).await
    }

    async fn submit_design(&self, request: &DesignSubmission) -> Result<DesignCreated, ApiFailure> {
        self.post_json("/designs", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_request_uses_wire_names() {
        let request = TextureRequest {
            prompt: "mountain sunrise".to_string(),
            mode: WireMode::FullMugRender,
            base_image: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["mode"], "full-mug-render");
        assert!(json.get("baseImage").is_none());

        let request = TextureRequest {
            prompt: "p".to_string(),
            mode: WireMode::ImageToImage,
            base_image: Some("data:image/png;base64,AAAA".to_string()),
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["mode"], "image-to-image");
        assert_eq!(json["baseImage"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn failure_body_parses_limit_codes() {
        let body: FailureBody = serde_json::from_str(
            r#"{"error":"Too many requests","code":"IP_LIMIT_REACHED","retryAfter":600,"limit":15}"#,
        )
        .expect("parse");
        assert_eq!(body.code, Some(FailureCode::IpLimitReached));
        assert_eq!(body.retry_after, Some(600));
        assert_eq!(body.limit, Some(15));

        let body: FailureBody =
            serde_json::from_str(r#"{"error":"boom"}"#).expect("parse bare failure");
        assert!(body.code.is_none());
    }

    #[test]
    fn multi_view_round_trip_names() {
        let request = MultiViewRequest {
            design_id: "d-1".to_string(),
            base_prompt: "alpine".to_string(),
            view_angles: vec![ViewAngle::Side, ViewAngle::Handle],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["viewAngles"][0], "side");
        assert_eq!(json["viewAngles"][1], "handle");

        let response: MultiViewResponse = serde_json::from_str(
            r#"{"views":[{"angle":"side","url":"https://cdn/side.png"}],"partialSuccess":true}"#,
        )
        .expect("parse");
        assert_eq!(response.views.len(), 1);
        assert_eq!(response.views[0].angle, ViewAngle::Side);
        assert_eq!(response.partial_success, Some(true));
    }
}
