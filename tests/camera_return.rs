use glam::{Vec2, Vec3};
use mugforge::api::{
    Api, ApiFailure, DesignCreated, DesignSubmission, MultiViewRequest, MultiViewResponse,
    TextureRequest, TextureResponse,
};
use mugforge::camera::CameraPose;
use mugforge::events::StudioEvent;
use mugforge::session::StudioSession;
use mugforge::StudioConfig;

struct OfflineApi;

impl Api for OfflineApi {
    async fn generate_texture(&self, _: &TextureRequest) -> Result<TextureResponse, ApiFailure> {
        Err(ApiFailure::Transport("offline".to_string()))
    }

    async fn generate_multi_view(&self, _: &MultiViewRequest) -> Result<MultiViewResponse, ApiFailure> {
        Err(ApiFailure::Transport("offline".to_string()))
    }

    async fn submit_design(&self, _: &DesignSubmission) -> Result<DesignCreated, ApiFailure> {
        Err(ApiFailure::Transport("offline".to_string()))
    }
}

fn studio() -> StudioSession<OfflineApi> {
    let _ = env_logger::builder().is_test(true).try_init();
    // Defaults: 5 s idle delay, 1.2 s return duration.
    StudioSession::new(OfflineApi, StudioConfig::default())
}

fn orbit_away(studio: &mut StudioSession<OfflineApi>) {
    studio.pointer_down(Vec2::new(100.0, 80.0));
    studio.set_camera_pose(CameraPose::new(Vec3::new(4.0, 0.2, 1.0), Vec3::new(0.4, 0.0, 0.0)));
    studio.pointer_up();
}

fn run_frames(studio: &mut StudioSession<OfflineApi>, dt: f32, secs: f32) {
    let frames = (secs / dt).round() as usize;
    for _ in 0..frames {
        studio.frame(dt);
    }
}

#[test]
fn camera_returns_to_default_after_idle_delay() {
    let mut studio = studio();
    orbit_away(&mut studio);
    assert!(studio.camera().is_armed());

    run_frames(&mut studio, 1.0 / 60.0, 4.5);
    assert!(studio.camera().is_armed(), "countdown still running");

    run_frames(&mut studio, 1.0 / 60.0, 3.0);
    assert_eq!(studio.camera().pose(), studio.camera().default_pose());
    assert!(!studio.camera().is_animating());

    let events = studio.drain_events();
    assert!(events.iter().any(|event| matches!(event, StudioEvent::CameraReturnStarted)));
    assert!(events.iter().any(|event| matches!(event, StudioEvent::CameraReturnCompleted)));
}

#[test]
fn drag_during_return_leaves_the_camera_where_it_was() {
    let mut studio = studio();
    orbit_away(&mut studio);
    run_frames(&mut studio, 1.0 / 60.0, 5.5);
    assert!(studio.camera().is_returning());
    let mid_return = studio.camera().pose();
    assert_ne!(mid_return, studio.camera().default_pose());

    studio.pointer_down(Vec2::new(10.0, 10.0));
    assert!(!studio.camera().is_returning());
    run_frames(&mut studio, 1.0 / 60.0, 3.0);
    assert_eq!(studio.camera().pose(), mid_return, "aborted return must not resume");

    let events = studio.drain_events();
    assert!(events.iter().any(|event| matches!(event, StudioEvent::CameraReturnStarted)));
    assert!(!events.iter().any(|event| matches!(event, StudioEvent::CameraReturnCompleted)));
}

#[test]
fn wheel_restarts_the_countdown() {
    let mut studio = studio();
    orbit_away(&mut studio);
    run_frames(&mut studio, 1.0 / 60.0, 4.0);
    studio.wheel(1.0);
    run_frames(&mut studio, 1.0 / 60.0, 4.0);
    // 8 s since the drag ended, but only 4 s since the wheel event.
    assert!(studio.camera().is_armed());
    assert!(!studio.camera().is_returning());
    run_frames(&mut studio, 1.0 / 60.0, 1.5);
    assert!(studio.camera().is_returning());
}

#[test]
fn teardown_cancels_the_pending_timer() {
    let mut studio = studio();
    orbit_away(&mut studio);
    assert!(studio.camera().is_armed());
    studio.teardown();
    run_frames(&mut studio, 1.0 / 60.0, 10.0);
    assert!(!studio.camera().is_returning());
    assert_ne!(studio.camera().pose(), studio.camera().default_pose());
}
