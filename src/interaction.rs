use glam::Vec2;

/// Pointer/wheel activity observed by the viewport. Both controllers read
/// this to tell idle from active; the session feeds it on every event.
#[derive(Debug, Clone)]
pub struct InteractionState {
    dragging: bool,
    zooming: bool,
    last_pointer: Option<Vec2>,
    idle_seconds: f32,
    interaction_count: u64,
}

impl InteractionState {
    pub fn new() -> Self {
        Self { dragging: false, zooming: false, last_pointer: None, idle_seconds: 0.0, interaction_count: 0 }
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.dragging = true;
        self.last_pointer = Some(position);
        self.note_activity();
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.last_pointer = Some(position);
        if self.dragging {
            self.note_activity();
        }
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
        self.note_activity();
    }

    pub fn wheel(&mut self, _delta: f32) {
        self.zooming = true;
        self.note_activity();
    }

    /// Called once per frame; the zoom flag only lives for the frame the
    /// wheel event arrived in.
    pub fn tick(&mut self, dt: f32) {
        self.idle_seconds += dt.max(0.0);
        self.zooming = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_zooming(&self) -> bool {
        self.zooming
    }

    pub fn last_pointer(&self) -> Option<Vec2> {
        self.last_pointer
    }

    pub fn idle_seconds(&self) -> f32 {
        self.idle_seconds
    }

    pub fn interaction_count(&self) -> u64 {
        self.interaction_count
    }

    fn note_activity(&mut self) {
        self.idle_seconds = 0.0;
        self.interaction_count += 1;
    }
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_resets_idle_clock() {
        let mut state = InteractionState::new();
        state.tick(2.5);
        assert!(state.idle_seconds() >= 2.5);
        state.pointer_down(Vec2::new(10.0, 20.0));
        assert_eq!(state.idle_seconds(), 0.0);
        assert!(state.is_dragging());
        state.pointer_up();
        assert!(!state.is_dragging());
    }

    #[test]
    fn zoom_flag_lives_one_frame() {
        let mut state = InteractionState::new();
        state.wheel(1.0);
        assert!(state.is_zooming());
        state.tick(0.016);
        assert!(!state.is_zooming());
    }

    #[test]
    fn moves_only_count_while_dragging() {
        let mut state = InteractionState::new();
        state.pointer_move(Vec2::ZERO);
        assert_eq!(state.interaction_count(), 0);
        state.pointer_down(Vec2::ZERO);
        state.pointer_move(Vec2::new(1.0, 1.0));
        assert_eq!(state.interaction_count(), 2);
        assert_eq!(state.last_pointer(), Some(Vec2::new(1.0, 1.0)));
    }
}
