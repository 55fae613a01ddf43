use glam::Vec3;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Viewport camera pose: position plus look-at target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self { position, target }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self { position: self.position.lerp(other.position, t), target: self.target.lerp(other.target, t) }
    }
}

/// Cancellation token for one pending auto-return. Arming hands out a clone;
/// cancelling either side kills the countdown.
#[derive(Debug, Clone)]
pub struct ReturnTimer {
    cancelled: Arc<AtomicBool>,
}

impl ReturnTimer {
    fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
enum ReturnPhase {
    Idle,
    Armed { timer: ReturnTimer, remaining: f32 },
    Returning { from: CameraPose, elapsed: f32 },
}

/// Emitted by `tick` when the return transition starts or finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSignal {
    ReturnStarted,
    ReturnCompleted,
}

/// Idle-triggered camera return: Idle → Armed (countdown) → Returning (eased
/// interpolation) → Idle. Interaction while Armed or Returning drops straight
/// back to Idle; an interrupted return never resumes. Arming always cancels
/// the previous handle first, so at most one timer exists at any instant.
#[derive(Debug)]
pub struct CameraController {
    pose: CameraPose,
    default_pose: CameraPose,
    idle_delay: f32,
    return_duration: f32,
    phase: ReturnPhase,
    animating: bool,
}

impl CameraController {
    pub fn new(default_pose: CameraPose, idle_delay: f32, return_duration: f32) -> Self {
        Self {
            pose: default_pose,
            default_pose,
            idle_delay: idle_delay.max(0.0),
            return_duration: return_duration.max(f32::EPSILON),
            phase: ReturnPhase::Idle,
            animating: false,
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn default_pose(&self) -> CameraPose {
        self.default_pose
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, ReturnPhase::Armed { .. })
    }

    pub fn is_returning(&self) -> bool {
        matches!(self.phase, ReturnPhase::Returning { .. })
    }

    /// Direct pose write from the orbit/zoom input path.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
    }

    /// Start (or restart) the idle countdown. The previous handle, if any, is
    /// cancelled before the new timer exists.
    pub fn arm(&mut self) -> ReturnTimer {
        self.abort_pending();
        let timer = ReturnTimer::new();
        self.phase = ReturnPhase::Armed { timer: timer.clone(), remaining: self.idle_delay };
        timer
    }

    /// An interaction began: kill the countdown or abort the in-flight
    /// return. The camera stays wherever the interpolation left it.
    pub fn interaction_started(&mut self) {
        self.abort_pending();
    }

    /// Teardown hook; identical to an interaction, kept separate so call
    /// sites read correctly.
    pub fn shutdown(&mut self) {
        self.abort_pending();
    }

    pub fn tick(&mut self, dt: f32) -> Option<CameraSignal> {
        match std::mem::replace(&mut self.phase, ReturnPhase::Idle) {
            ReturnPhase::Idle => None,
            ReturnPhase::Armed { timer, mut remaining } => {
                if timer.is_cancelled() {
                    return None;
                }
                remaining -= dt;
                if remaining <= 0.0 {
                    self.animating = true;
                    self.phase = ReturnPhase::Returning { from: self.pose, elapsed: 0.0 };
                    Some(CameraSignal::ReturnStarted)
                } else {
                    self.phase = ReturnPhase::Armed { timer, remaining };
                    None
                }
            }
            ReturnPhase::Returning { from, elapsed } => {
                let elapsed = elapsed + dt;
                let progress = (elapsed / self.return_duration).clamp(0.0, 1.0);
                if progress >= 1.0 {
                    // Land exactly on the default; a lerp at t=1 can be off
                    // by an ulp.
                    self.pose = self.default_pose;
                    self.animating = false;
                    Some(CameraSignal::ReturnCompleted)
                } else {
                    self.pose = from.lerp(self.default_pose, ease_in_out_cubic(progress));
                    self.animating = true;
                    self.phase = ReturnPhase::Returning { from, elapsed };
                    None
                }
            }
        }
    }

    fn abort_pending(&mut self) {
        if let ReturnPhase::Armed { timer, .. } = &self.phase {
            timer.cancel();
        }
        self.phase = ReturnPhase::Idle;
        self.animating = false;
    }
}

/// Symmetric cubic ease: accelerate to the midpoint, decelerate after.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}
