use std::ops::{Deref, DerefMut};

use super::{is_on_screen, screen_for, HostWindow};
use crate::geometry::{Rect, SizeChangeMode, WindowState};

/// Holds a window's move/resize notifications detached until dropped.
pub struct SuspendedNotifications<'w> {
    window: &'w mut dyn HostWindow,
}

impl<'w> SuspendedNotifications<'w> {
    pub fn new(window: &'w mut dyn HostWindow) -> Self {
        window.set_notifications_suspended(true);
        Self { window }
    }
}

impl<'w> Deref for SuspendedNotifications<'w> {
    type Target = dyn HostWindow + 'w;

    fn deref(&self) -> &Self::Target {
        self.window
    }
}

impl<'w> DerefMut for SuspendedNotifications<'w> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.window
    }
}

impl Drop for SuspendedNotifications<'_> {
    fn drop(&mut self) {
        self.window.set_notifications_suspended(false);
    }
}

/// Brings a window whose bounds no longer match any display back into view.
#[derive(Debug, Clone, Copy)]
pub struct ScreenFitter<'a> {
    areas: &'a [Rect],
    caption_height: i32,
}

impl<'a> ScreenFitter<'a> {
    pub const fn new(areas: &'a [Rect], caption_height: i32) -> Self {
        Self {
            areas,
            caption_height,
        }
    }

    /// Corrects `window` for `mode`; returns the new bounds when they changed.
    ///
    /// Maximized and minimized windows are left alone, as is every window
    /// when no display is attached.
    pub fn fit(&self, window: &mut dyn HostWindow, mode: SizeChangeMode) -> Option<Rect> {
        if window.window_state() != WindowState::Normal {
            return None;
        }
        let before = window.bounds();
        let area = screen_for(self.areas, before.origin())?;

        match mode {
            SizeChangeMode::MoveTopLeft => {
                let target = self.top_left_target(before, area);
                if target == before {
                    return None;
                }
                SuspendedNotifications::new(window).set_bounds(target);
            }
            SizeChangeMode::ResizeFit => {
                if is_on_screen(self.areas, &before) {
                    return None;
                }
                let mut suspended = SuspendedNotifications::new(window);
                self.resize_fit(&mut *suspended, area);
            }
        }

        let after = window.bounds();
        if after == before {
            return None;
        }
        tracing::info!(?mode, from = %before, to = %after, "moved window back on screen");
        Some(after)
    }

    fn top_left_target(&self, bounds: Rect, area: Rect) -> Rect {
        let mut target = bounds;
        if target.x < area.left() || target.x > area.right() {
            target.x = area.left();
        }
        if target.y < area.top() || target.y > area.bottom().saturating_sub(self.caption_height) {
            target.y = area.top();
        }
        target
    }

    fn resize_fit(&self, window: &mut dyn HostWindow, area: Rect) {
        let minimum = window.minimum_size();

        nudge(window, |r| r.x < area.left(), |r| Rect { x: r.x + 1, ..r });
        nudge(window, |r| r.x > area.right(), |r| Rect { x: r.x - 1, ..r });
        nudge(
            window,
            |r| r.right() > area.right() && r.width > minimum.width,
            |r| Rect {
                width: r.width.saturating_sub(1),
                ..r
            },
        );

        nudge(window, |r| r.y < area.top(), |r| Rect { y: r.y + 1, ..r });
        let bounds = window.bounds();
        if bounds.y.saturating_add(self.caption_height) > area.bottom() {
            let top = area
                .bottom()
                .saturating_sub(self.caption_height.saturating_mul(2))
                .max(area.top());
            window.set_bounds(Rect { y: top, ..bounds });
        }
        nudge(
            window,
            |r| r.bottom() > area.bottom() && r.height > minimum.height,
            |r| Rect {
                height: r.height.saturating_sub(1),
                ..r
            },
        );
    }
}

/// Applies `step` one unit at a time while `until_fits` holds, stopping
/// early once the window stops accepting changes.
fn nudge(
    window: &mut dyn HostWindow,
    until_fits: impl Fn(&Rect) -> bool,
    step: impl Fn(Rect) -> Rect,
) {
    let mut current = window.bounds();
    while until_fits(&current) {
        window.set_bounds(step(current));
        let next = window.bounds();
        if next == current {
            tracing::debug!(bounds = %current, "window refused further correction");
            break;
        }
        current = next;
    }
}
