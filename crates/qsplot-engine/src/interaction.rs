//! Mouse interaction: orbit on left drag, zoom on right drag or wheel,
//! pick on a left click that did not move.

use glam::DVec2;

/// Presses released closer than this to where they started are clicks.
pub const CLICK_THRESHOLD_PX: f64 = 5.0;
pub const ORBIT_SENSITIVITY: f32 = 0.005;
pub const DRAG_ZOOM_SENSITIVITY: f32 = 0.05;
pub const SCROLL_ZOOM_SENSITIVITY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Orbiting,
    Zooming,
}

/// What the viewer should do in response to an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Orbit { dx: f32, dy: f32 },
    Zoom(f32),
    /// Run the picking pass at this cursor position (physical pixels).
    Pick(DVec2),
}

#[derive(Debug, Default)]
pub struct Interaction {
    state: DragState,
    press: Option<DVec2>,
    last: DVec2,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Handles a button transition. `consumed` is true when the overlay
    /// panel owns the pointer.
    pub fn button(&mut self, button: Button, pressed: bool, consumed: bool) -> Option<Action> {
        match (button, pressed) {
            (Button::Left, true) => {
                if consumed {
                    return None;
                }
                self.press = Some(self.last);
                self.state = DragState::Orbiting;
                None
            }
            (Button::Left, false) => {
                let press = self.press.take();
                if self.state == DragState::Orbiting {
                    self.state = DragState::Idle;
                }
                if consumed {
                    return None;
                }
                let start = press?;
                if start.distance(self.last) < CLICK_THRESHOLD_PX {
                    Some(Action::Pick(self.last))
                } else {
                    None
                }
            }
            (Button::Right, true) => {
                if !consumed {
                    self.state = DragState::Zooming;
                }
                None
            }
            (Button::Right, false) => {
                if self.state == DragState::Zooming {
                    self.state = DragState::Idle;
                }
                None
            }
        }
    }

    /// Handles cursor motion. The last position is always tracked so deltas
    /// do not jump when the pointer leaves the panel.
    pub fn cursor_moved(&mut self, position: DVec2, consumed: bool) -> Option<Action> {
        let delta = position - self.last;
        self.last = position;
        if consumed {
            return None;
        }
        match self.state {
            DragState::Idle => None,
            DragState::Orbiting => Some(Action::Orbit {
                dx: delta.x as f32 * ORBIT_SENSITIVITY,
                dy: delta.y as f32 * ORBIT_SENSITIVITY,
            }),
            DragState::Zooming => Some(Action::Zoom(delta.y as f32 * DRAG_ZOOM_SENSITIVITY)),
        }
    }

    /// Wheel zoom works in any drag state.
    pub fn scroll(&mut self, lines: f32, consumed: bool) -> Option<Action> {
        if consumed {
            return None;
        }
        Some(Action::Zoom(lines * SCROLL_ZOOM_SENSITIVITY))
    }
}

/// Applies a pick result: a miss keeps the existing selection.
pub fn apply_pick(selected: i32, picked: i32) -> i32 {
    if picked == -1 {
        selected
    } else {
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn small_motion_is_a_click() {
        let mut input = Interaction::new();
        input.cursor_moved(at(100.0, 100.0), false);
        input.button(Button::Left, true, false);
        input.cursor_moved(at(103.0, 102.0), false);
        let action = input.button(Button::Left, false, false);
        assert_eq!(action, Some(Action::Pick(at(103.0, 102.0))));
        assert_eq!(input.state(), DragState::Idle);
    }

    #[test]
    fn motion_at_threshold_is_a_drag() {
        let mut input = Interaction::new();
        input.cursor_moved(at(0.0, 0.0), false);
        input.button(Button::Left, true, false);
        input.cursor_moved(at(3.0, 4.0), false); // exactly 5 px
        assert_eq!(input.button(Button::Left, false, false), None);
    }

    #[test]
    fn left_drag_orbits_with_sensitivity() {
        let mut input = Interaction::new();
        input.cursor_moved(at(10.0, 10.0), false);
        input.button(Button::Left, true, false);
        let action = input.cursor_moved(at(30.0, 0.0), false);
        assert_eq!(
            action,
            Some(Action::Orbit {
                dx: 20.0 * ORBIT_SENSITIVITY,
                dy: -10.0 * ORBIT_SENSITIVITY
            })
        );
    }

    #[test]
    fn right_drag_zooms_from_vertical_delta() {
        let mut input = Interaction::new();
        input.button(Button::Right, true, false);
        assert_eq!(input.state(), DragState::Zooming);
        let action = input.cursor_moved(at(50.0, 20.0), false);
        assert_eq!(action, Some(Action::Zoom(20.0 * DRAG_ZOOM_SENSITIVITY)));
        input.button(Button::Right, false, false);
        assert_eq!(input.state(), DragState::Idle);
        assert_eq!(input.cursor_moved(at(0.0, 0.0), false), None);
    }

    #[test]
    fn scroll_zooms_in_any_state() {
        let mut input = Interaction::new();
        assert_eq!(input.scroll(2.0, false), Some(Action::Zoom(1.0)));
        input.button(Button::Left, true, false);
        assert_eq!(input.scroll(-1.0, false), Some(Action::Zoom(-0.5)));
    }

    #[test]
    fn panel_consumes_everything() {
        let mut input = Interaction::new();
        assert_eq!(input.scroll(1.0, true), None);
        input.button(Button::Left, true, true);
        assert_eq!(input.state(), DragState::Idle);
        assert_eq!(input.button(Button::Left, false, false), None);
    }

    #[test]
    fn release_over_panel_ends_drag_without_picking() {
        let mut input = Interaction::new();
        input.button(Button::Left, true, false);
        assert_eq!(input.button(Button::Left, false, true), None);
        assert_eq!(input.state(), DragState::Idle);
    }

    #[test]
    fn consumed_motion_still_tracks_cursor() {
        let mut input = Interaction::new();
        input.button(Button::Left, true, false);
        assert_eq!(input.cursor_moved(at(200.0, 0.0), true), None);
        // The next uncaptured move reports only its own delta.
        assert_eq!(
            input.cursor_moved(at(201.0, 0.0), false),
            Some(Action::Orbit { dx: ORBIT_SENSITIVITY, dy: 0.0 })
        );
    }

    #[test]
    fn miss_preserves_selection() {
        assert_eq!(apply_pick(7, -1), 7);
        assert_eq!(apply_pick(7, 3), 3);
        assert_eq!(apply_pick(-1, -1), -1);
    }
}
