use crate::generation::{GenerationKind, GenerationMode};
use crate::quality::QualityLevel;
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone)]
pub enum StudioEvent {
    ModeChanged { from: GenerationMode, to: GenerationMode },
    GenerationStarted { kind: GenerationKind },
    GenerationSucceeded { kind: GenerationKind },
    GenerationFailed { kind: GenerationKind, message: String },
    PreviewApplied,
    RenderAccepted { attempts: u32 },
    MultiViewReady { view_count: usize, partial: bool },
    TemplateSelected { name: String },
    QualityChanged { level: QualityLevel, shadows: bool },
    CameraReturnStarted,
    CameraReturnCompleted,
    DesignSubmitted { lead_id: String },
}

impl fmt::Display for StudioEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudioEvent::ModeChanged { from, to } => {
                write!(f, "ModeChanged from={from:?} to={to:?}")
            }
            StudioEvent::GenerationStarted { kind } => write!(f, "GenerationStarted kind={kind:?}"),
            StudioEvent::GenerationSucceeded { kind } => write!(f, "GenerationSucceeded kind={kind:?}"),
            StudioEvent::GenerationFailed { kind, message } => {
                write!(f, "GenerationFailed kind={kind:?} message={message}")
            }
            StudioEvent::PreviewApplied => write!(f, "PreviewApplied"),
            StudioEvent::RenderAccepted { attempts } => write!(f, "RenderAccepted attempts={attempts}"),
            StudioEvent::MultiViewReady { view_count, partial } => {
                write!(f, "MultiViewReady views={view_count} partial={partial}")
            }
            StudioEvent::TemplateSelected { name } => write!(f, "TemplateSelected name={name}"),
            StudioEvent::QualityChanged { level, shadows } => {
                write!(f, "QualityChanged level={level:?} shadows={shadows}")
            }
            StudioEvent::CameraReturnStarted => write!(f, "CameraReturnStarted"),
            StudioEvent::CameraReturnCompleted => write!(f, "CameraReturnCompleted"),
            StudioEvent::DesignSubmitted { lead_id } => write!(f, "DesignSubmitted lead_id={lead_id}"),
        }
    }
}

/// Bounded fire-and-forget event queue. The analytics sink drains it between
/// frames; the core never waits on delivery, and a slow consumer only loses
/// the oldest entries.
#[derive(Debug)]
pub struct EventBus {
    events: VecDeque<StudioEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self { events: VecDeque::with_capacity(capacity.min(1_024)), capacity: capacity.max(1) }
    }

    pub fn push(&mut self, event: StudioEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<StudioEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_emission_order() {
        let mut bus = EventBus::default();
        bus.push(StudioEvent::CameraReturnStarted);
        bus.push(StudioEvent::CameraReturnCompleted);
        let drained = bus.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], StudioEvent::CameraReturnStarted));
        assert!(matches!(drained[1], StudioEvent::CameraReturnCompleted));
        assert!(bus.is_empty());
    }

    #[test]
    fn bounded_backlog_drops_oldest() {
        let mut bus = EventBus::new(2);
        bus.push(StudioEvent::CameraReturnStarted);
        bus.push(StudioEvent::PreviewApplied);
        bus.push(StudioEvent::CameraReturnCompleted);
        let drained = bus.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], StudioEvent::PreviewApplied));
        assert!(matches!(drained[1], StudioEvent::CameraReturnCompleted));
    }
}
