//! Draggable/resizable window frame state.
//!
//! Pointer handling is a small state machine: `Idle`, `Dragging` (title bar grabbed) or
//! `Resizing` (corner handle grabbed). Only one mode can be active; pointer release returns to
//! `Idle`. Coordinates are desktop pixels with the origin at the top-left.

/// A position or pointer location.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Initial geometry and constraints for a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub position: Point,
    pub size: Size,
    pub min_size: Size,
    pub resizable: bool,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            position: Point::new(100.0, 100.0),
            size: Size::new(300.0, 400.0),
            min_size: Size::new(200.0, 150.0),
            resizable: true,
        }
    }
}

/// Where a pointer-down landed inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    TitleBar,
    ResizeHandle,
    Body,
    /// A button embedded in the frame (e.g. close): no drag, no focus.
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerMode {
    Idle,
    /// Pointer position minus window position at grab time.
    Dragging { offset: Point },
    /// Pointer position at the previous move; resize applies per-move deltas.
    Resizing { last: Point },
}

/// Live state of one open window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    position: Point,
    size: Size,
    min_size: Size,
    resizable: bool,
    mode: PointerMode,
}

impl WindowState {
    pub fn new(spec: WindowSpec) -> Self {
        Self {
            position: spec.position,
            size: Size::new(
                spec.size.width.max(spec.min_size.width),
                spec.size.height.max(spec.min_size.height),
            ),
            min_size: spec.min_size,
            resizable: spec.resizable,
            mode: PointerMode::Idle,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn mode(&self) -> PointerMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, PointerMode::Dragging { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.mode, PointerMode::Resizing { .. })
    }

    pub fn resizable(&self) -> bool {
        self.resizable
    }

    /// Pointer pressed on `target`. Starts a drag or resize where applicable and returns true
    /// when the owner should focus (raise) this window.
    pub fn pointer_down(&mut self, target: HitTarget, pointer: Point) -> bool {
        match target {
            HitTarget::TitleBar => {
                self.mode = PointerMode::Dragging {
                    offset: Point::new(pointer.x - self.position.x, pointer.y - self.position.y),
                };
                true
            }
            HitTarget::ResizeHandle => {
                if self.resizable {
                    self.mode = PointerMode::Resizing { last: pointer };
                }
                true
            }
            HitTarget::Body => true,
            HitTarget::Button => false,
        }
    }

    /// Pointer moved while possibly grabbed. No-op when idle.
    pub fn pointer_moved(&mut self, pointer: Point) {
        match self.mode {
            PointerMode::Idle => {}
            PointerMode::Dragging { offset } => {
                self.position = Point::new(pointer.x - offset.x, (pointer.y - offset.y).max(0.0));
            }
            PointerMode::Resizing { last } => {
                let dx = pointer.x - last.x;
                let dy = pointer.y - last.y;
                self.size = Size::new(
                    (self.size.width + dx).max(self.min_size.width),
                    (self.size.height + dy).max(self.min_size.height),
                );
                self.mode = PointerMode::Resizing { last: pointer };
            }
        }
    }

    /// Pointer released anywhere: ends any drag or resize.
    pub fn pointer_released(&mut self) {
        self.mode = PointerMode::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_at(x: f32, y: f32) -> WindowState {
        WindowState::new(WindowSpec {
            position: Point::new(x, y),
            ..WindowSpec::default()
        })
    }

    #[test]
    fn drag_moves_by_pointer_delta() {
        let mut w = window_at(100.0, 100.0);
        assert!(w.pointer_down(HitTarget::TitleBar, Point::new(120.0, 105.0)));
        assert!(w.is_dragging());
        w.pointer_moved(Point::new(170.0, 75.0));
        assert_eq!(w.position(), Point::new(150.0, 70.0));
        w.pointer_released();
        assert_eq!(w.mode(), PointerMode::Idle);
    }

    #[test]
    fn drag_clamps_top_edge_but_not_left() {
        let mut w = window_at(10.0, 10.0);
        w.pointer_down(HitTarget::TitleBar, Point::new(10.0, 10.0));
        w.pointer_moved(Point::new(-40.0, -200.0));
        assert_eq!(w.position(), Point::new(-40.0, 0.0));
    }

    #[test]
    fn resize_clamps_to_minimums() {
        let mut w = WindowState::new(WindowSpec::default());
        assert_eq!(w.size(), Size::new(300.0, 400.0));
        w.pointer_down(HitTarget::ResizeHandle, Point::new(400.0, 500.0));
        assert!(w.is_resizing());
        w.pointer_moved(Point::new(200.0, 500.0));
        w.pointer_moved(Point::new(50.0, 500.0));
        assert_eq!(w.size(), Size::new(200.0, 400.0));
        w.pointer_moved(Point::new(50.0, 100.0));
        assert_eq!(w.size().height, 150.0);
    }

    #[test]
    fn resize_grows_incrementally() {
        let mut w = WindowState::new(WindowSpec::default());
        w.pointer_down(HitTarget::ResizeHandle, Point::new(0.0, 0.0));
        w.pointer_moved(Point::new(10.0, 20.0));
        w.pointer_moved(Point::new(25.0, 20.0));
        assert_eq!(w.size(), Size::new(325.0, 420.0));
        assert_eq!(w.position(), Point::new(100.0, 100.0));
    }

    #[test]
    fn only_one_mode_at_a_time() {
        let mut w = WindowState::new(WindowSpec::default());
        w.pointer_down(HitTarget::TitleBar, Point::new(110.0, 110.0));
        w.pointer_down(HitTarget::ResizeHandle, Point::new(400.0, 500.0));
        assert!(w.is_resizing());
        assert!(!w.is_dragging());
    }

    #[test]
    fn non_resizable_window_ignores_handle_but_still_focuses() {
        let mut w = WindowState::new(WindowSpec {
            resizable: false,
            ..WindowSpec::default()
        });
        assert!(w.pointer_down(HitTarget::ResizeHandle, Point::new(400.0, 500.0)));
        w.pointer_moved(Point::new(900.0, 900.0));
        assert_eq!(w.size(), Size::new(300.0, 400.0));
        assert_eq!(w.mode(), PointerMode::Idle);
    }

    #[test]
    fn buttons_do_not_focus_or_grab() {
        let mut w = WindowState::new(WindowSpec::default());
        assert!(!w.pointer_down(HitTarget::Button, Point::new(380.0, 105.0)));
        assert!(w.pointer_down(HitTarget::Body, Point::new(150.0, 300.0)));
        assert_eq!(w.mode(), PointerMode::Idle);
    }
}
