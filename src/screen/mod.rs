//! Display queries and the host window surface the fitter drives.

use crate::geometry::{Dpi, Point, Rect, Size, WindowState};
use crate::properties::PropertyNode;

mod fit;

pub use fit::{ScreenFitter, SuspendedNotifications};

/// Live display configuration reported by the host.
pub trait DisplayEnvironment {
    fn dpi(&self) -> Dpi;

    /// Working area of each attached display, primary first.
    fn work_areas(&self) -> Vec<Rect>;

    /// Height reserved for a window caption when clamping the top edge.
    fn caption_height(&self) -> i32;
}

/// A top-level window as seen by placement: its geometry plus its control tree.
pub trait HostWindow: PropertyNode {
    fn bounds(&self) -> Rect;
    fn set_bounds(&mut self, bounds: Rect);

    /// Bounds the window returns to when leaving maximized or minimized state.
    fn restore_bounds(&self) -> Rect;
    fn set_restore_bounds(&mut self, bounds: Rect);

    fn window_state(&self) -> WindowState;
    fn set_window_state(&mut self, state: WindowState);

    fn minimum_size(&self) -> Size {
        Size::default()
    }

    /// Detach (`true`) or reattach (`false`) the window's move and resize handlers.
    fn set_notifications_suspended(&mut self, _suspended: bool) {}
}

pub fn screen_index(areas: &[Rect], point: Point) -> Option<usize> {
    areas.iter().position(|area| area.contains_point(point))
}

/// The area containing `point`, else the primary area.
pub fn screen_for(areas: &[Rect], point: Point) -> Option<Rect> {
    screen_index(areas, point)
        .and_then(|index| areas.get(index))
        .or_else(|| areas.first())
        .copied()
}

pub fn is_on_screen(areas: &[Rect], bounds: &Rect) -> bool {
    areas.iter().any(|area| area.contains_rect(bounds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual() -> Vec<Rect> {
        vec![Rect::new(0, 0, 1920, 1040), Rect::new(1920, 0, 1280, 984)]
    }

    #[test]
    fn screen_index_finds_area_containing_top_left() {
        let areas = dual();
        assert_eq!(screen_index(&areas, Point::new(10, 10)), Some(0));
        assert_eq!(screen_index(&areas, Point::new(1920, 10)), Some(1));
        assert_eq!(screen_index(&areas, Point::new(-5, 10)), None);
    }

    #[test]
    fn screen_for_falls_back_to_primary() {
        let areas = dual();
        assert_eq!(screen_for(&areas, Point::new(5000, 5000)), Some(areas[0]));
        assert_eq!(screen_for(&areas, Point::new(2000, 5)), Some(areas[1]));
        assert_eq!(screen_for(&[], Point::new(0, 0)), None);
    }

    #[test]
    fn spanning_window_is_not_on_screen() {
        let areas = dual();
        assert!(is_on_screen(&areas, &Rect::new(1920, 0, 800, 600)));
        assert!(!is_on_screen(&areas, &Rect::new(1800, 0, 800, 600)));
    }
}
