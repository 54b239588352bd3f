//! Per-process placement context: binds the store, tracks windows and
//! drives load, debounce, fit and save from host notifications.

use std::cell::RefCell;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use crate::config::PlacementConfig;
use crate::error::{ErrorPolicy, PlacementError, PlacementResult};
use crate::geometry::{Rect, SizeChangeMode, WindowState};
use crate::notification::{Notifier, SuppressedError};
use crate::properties::{
    ApplicationKind, ConverterRegistry, PropertyError, PropertyNode, PropertyWalker, RuleTable,
    ValueConverter, ValueKind,
};
use crate::screen::{screen_index, DisplayEnvironment, HostWindow, ScreenFitter, SuspendedNotifications};
use crate::state::{WindowEvent, WindowPhase};
use crate::storage::{store_path, Store};

mod environment;
mod registry;
mod settle;

pub use environment::{
    display_changed, record_environment, StoredEnvironment, DPI_KEY, DPI_SECTION,
    SCREENS_SECTION, SCREEN_COUNT_KEY,
};
pub use registry::{Registration, WindowId};
pub use settle::SettleRequest;

use registry::{Registry, TrackedWindow};

pub const BOUNDS_KEY: &str = "bounds";
pub const DEFAULT_BOUNDS_KEY: &str = "defaultBounds";
pub const SIZE_MODE_KEY: &str = "sizeMode";
pub const WINDOW_STATE_KEY: &str = "windowState";
pub const SCREEN_INDEX_KEY: &str = "screenIndex";

/// Removes `name` and its dotted child sections, leaving other windows that
/// merely share the prefix alone.
pub fn wipe_window(store: &mut Store, name: &str) -> usize {
    usize::from(store.remove_section(name)) + store.delete_sections(&format!("{name}.*"))
}

pub struct PlacementController {
    kind: ApplicationKind,
    store_path: PathBuf,
    store: Store,
    rules: RuleTable,
    converters: ConverterRegistry,
    config: PlacementConfig,
    skip_requested: bool,
    display_changed: bool,
    notifier: Notifier,
    registry: Rc<RefCell<Registry>>,
}

impl PlacementController {
    /// Loads `position.ini` from `settings_dir` and compares the recorded
    /// display metadata with `env`. Call once before registering windows.
    pub fn bind(
        kind: ApplicationKind,
        config: PlacementConfig,
        settings_dir: &Path,
        env: &dyn DisplayEnvironment,
    ) -> PlacementResult<Self> {
        let store_path = store_path(settings_dir);
        let store = Store::load(&store_path)?;
        let mut rules = RuleTable::preset(kind);
        config.extend_rules(&mut rules);
        let display_changed = display_changed(&store, env);

        tracing::info!(
            kind = kind.as_str(),
            path = %store_path.display(),
            rules = rules.rules().len(),
            display_changed,
            "placement bound"
        );

        Ok(Self {
            kind,
            store_path,
            store,
            rules,
            converters: ConverterRegistry::new(),
            config,
            skip_requested: false,
            display_changed,
            notifier: Notifier::new(),
            registry: Rc::new(RefCell::new(Registry::default())),
        })
    }

    /// Records the live display metadata and writes the store.
    pub fn unbind(mut self, env: &dyn DisplayEnvironment) -> PlacementResult<()> {
        record_environment(&mut self.store, env);
        self.store.save(&self.store_path)?;
        tracing::info!(
            kind = self.kind.as_str(),
            still_tracked = self.registry.borrow().len(),
            "placement unbound"
        );
        Ok(())
    }

    pub fn with_skip_requested(mut self, skip: bool) -> Self {
        self.set_skip_requested(skip);
        self
    }

    pub fn set_skip_requested(&mut self, skip: bool) {
        if skip {
            tracing::info!("stored window placement will not be restored");
        }
        self.skip_requested = skip;
    }

    pub fn display_changed(&self) -> bool {
        self.display_changed
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn register_converter(&mut self, kind: ValueKind, converter: Box<dyn ValueConverter>) {
        self.converters.register(kind, converter);
    }

    pub fn subscribe_errors(&mut self, handler: impl Fn(&SuppressedError) + 'static) {
        self.notifier.subscribe(handler);
    }

    pub fn phase(&self, id: WindowId) -> Option<WindowPhase> {
        self.registry.borrow().get(id).map(|window| window.machine.phase())
    }

    pub fn default_size(&self, id: WindowId) -> Option<Rect> {
        self.registry.borrow().get(id).map(|window| window.default_size)
    }

    /// State observed at the window's last resize or move notification.
    pub fn last_state(&self, id: WindowId) -> Option<WindowState> {
        self.registry.borrow().get(id).map(|window| window.last_state)
    }

    pub fn settle_pending(&self, id: WindowId) -> bool {
        self.registry
            .borrow()
            .get(id)
            .is_some_and(|window| window.settle.is_pending())
    }

    pub fn tracked_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Starts tracking `window`, capturing its restore bounds as its default size.
    pub fn register<W: HostWindow>(
        &self,
        window: &W,
        mode: SizeChangeMode,
    ) -> PlacementResult<Registration> {
        let name = window
            .identity()
            .reference_name()
            .ok_or_else(|| PlacementError::MissingIdentity {
                type_tag: window.type_tag().to_string(),
            })?;

        let mut registry = self.registry.borrow_mut();
        if registry.contains_name(&name) {
            tracing::warn!(window = %name, "another tracked window shares this name; their stored placement collides");
        }
        let default_size = window.restore_bounds();
        let id = registry.insert(TrackedWindow::new(
            name.clone(),
            mode,
            default_size,
            window.window_state(),
        ));
        tracing::debug!(window = %name, %id, ?mode, %default_size, "window registered");
        Ok(Registration::new(id, &self.registry))
    }

    /// Feeds one host notification for a tracked window.
    ///
    /// Returns a settle request when the host should start (or restart) the
    /// window's debounce timer.
    pub fn handle<W: HostWindow>(
        &mut self,
        id: WindowId,
        window: &mut W,
        event: WindowEvent,
        env: &dyn DisplayEnvironment,
    ) -> PlacementResult<Option<SettleRequest>> {
        let registry = Rc::clone(&self.registry);
        let mut registry = registry.borrow_mut();
        let Some(tracked) = registry.get_mut(id) else {
            if matches!(
                event,
                WindowEvent::Closed | WindowEvent::Disposed | WindowEvent::SettleElapsed(_)
            ) {
                tracing::debug!(%id, ?event, "notification for released window ignored");
                return Ok(None);
            }
            return Err(PlacementError::UnknownWindow(id.to_string()));
        };

        if let WindowEvent::SettleElapsed(generation) = event {
            if !tracked.settle.elapse(generation) {
                tracing::debug!(window = %tracked.name, generation, "stale settle timer ignored");
                return Ok(None);
            }
        }
        let phase = tracked.machine.transition(event)?;

        match event {
            WindowEvent::Shown => {
                self.load(tracked, &mut *window, env)?;
                Ok(None)
            }
            WindowEvent::Resized | WindowEvent::Moved => Ok(self.track_change(id, tracked, window)),
            WindowEvent::ResizeEnded | WindowEvent::SettleElapsed(_) => {
                tracked.settle.cancel();
                if phase == WindowPhase::Settled {
                    fit_tracked(tracked, &mut *window, env);
                }
                Ok(None)
            }
            WindowEvent::Closed | WindowEvent::Disposed => {
                if let Some(tracked) = registry.remove(id) {
                    self.save(&tracked, window, env)?;
                }
                Ok(None)
            }
        }
    }

    /// Refits every loaded window after the host reports a display change.
    pub fn on_display_settings_changed<'w, I>(&self, windows: I, env: &dyn DisplayEnvironment) -> usize
    where
        I: IntoIterator<Item = (WindowId, &'w mut dyn HostWindow)>,
    {
        let mut registry = self.registry.borrow_mut();
        let mut refitted = 0;
        for (id, window) in windows {
            let Some(tracked) = registry.get_mut(id) else {
                continue;
            };
            if tracked.machine.phase().is_loaded() && fit_tracked(tracked, window, env) {
                refitted += 1;
            }
        }
        tracing::info!(refitted, "display settings changed");
        refitted
    }

    /// Deletes the window's stored data, writes the store and stops tracking it.
    pub fn reset_position(&mut self, id: WindowId) -> PlacementResult<()> {
        let tracked = self
            .registry
            .borrow_mut()
            .remove(id)
            .ok_or_else(|| PlacementError::UnknownWindow(id.to_string()))?;
        let removed = wipe_window(&mut self.store, &tracked.name);
        self.store.save(&self.store_path)?;
        tracing::info!(window = %tracked.name, removed, "window placement reset");
        Ok(())
    }

    fn load<W: HostWindow>(
        &mut self,
        tracked: &mut TrackedWindow,
        window: &mut W,
        env: &dyn DisplayEnvironment,
    ) -> PlacementResult<()> {
        let name = tracked.name.clone();
        let skip_for_display = self.display_changed && self.config.skip_on_display_change;
        if self.skip_requested || skip_for_display {
            let removed = wipe_window(&mut self.store, &name);
            tracing::info!(
                window = %name,
                removed,
                skip_requested = self.skip_requested,
                display_changed = self.display_changed,
                "skipping stored placement"
            );
            return Ok(());
        }

        let bounds = self.stored::<Rect>(&name, BOUNDS_KEY)?;
        let default_size = self.stored::<Rect>(&name, DEFAULT_BOUNDS_KEY)?.or(bounds);
        let state = self.stored::<WindowState>(&name, WINDOW_STATE_KEY)?;
        if let Some(mode) = self.stored::<SizeChangeMode>(&name, SIZE_MODE_KEY)? {
            tracked.mode = mode;
        }

        if bounds.is_some() || state.is_some() {
            let mut host = SuspendedNotifications::new(&mut *window);
            match state.unwrap_or_default() {
                WindowState::Maximized => {
                    if let Some(restore) = default_size {
                        host.set_restore_bounds(restore);
                    }
                    host.set_window_state(WindowState::Maximized);
                }
                WindowState::Normal | WindowState::Minimized => {
                    if host.window_state() != WindowState::Normal {
                        host.set_window_state(WindowState::Normal);
                    }
                    if let Some(bounds) = bounds {
                        host.set_bounds(bounds);
                    }
                }
            }
        }
        if let Some(default_size) = default_size {
            tracked.default_size = default_size;
        }
        tracked.last_state = window.window_state();

        let walker = PropertyWalker::new(&self.rules, &self.converters, self.policy());
        let applied = walker.apply(&mut *window, &name, &self.store, &self.notifier)?;
        let moved = fit_tracked(tracked, &mut *window, env);

        tracing::info!(
            window = %name,
            bounds = ?bounds,
            stored_state = ?state,
            restored_state = %tracked.last_state,
            minimized_as_normal = state == Some(WindowState::Minimized),
            applied,
            moved,
            "window placement restored"
        );
        Ok(())
    }

    fn track_change<W: HostWindow>(
        &self,
        id: WindowId,
        tracked: &mut TrackedWindow,
        window: &W,
    ) -> Option<SettleRequest> {
        let state = window.window_state();
        if state == WindowState::Normal {
            tracked.default_size = window.bounds();
        }
        tracked.last_state = state;

        if tracked.machine.phase() != WindowPhase::Resizing {
            return None;
        }
        let generation = tracked.settle.restart();
        Some(SettleRequest {
            window: id,
            generation,
            delay: self.config.settle_delay(),
        })
    }

    fn save<W: HostWindow>(
        &mut self,
        tracked: &TrackedWindow,
        window: &W,
        env: &dyn DisplayEnvironment,
    ) -> PlacementResult<()> {
        let name = tracked.name.as_str();
        let state = window.window_state();
        let (bounds, default_size) = match state {
            WindowState::Normal => (window.bounds(), window.bounds()),
            WindowState::Maximized | WindowState::Minimized => {
                (window.restore_bounds(), tracked.default_size)
            }
        };
        let screen = screen_index(&env.work_areas(), bounds.origin())
            .and_then(|index| i64::try_from(index).ok())
            .unwrap_or(-1);

        self.store.set(name, BOUNDS_KEY, bounds);
        self.store.set(name, DEFAULT_BOUNDS_KEY, default_size);
        self.store.set(name, SIZE_MODE_KEY, tracked.mode);
        self.store.set(name, WINDOW_STATE_KEY, state);
        self.store.set(name, SCREEN_INDEX_KEY, screen);

        let walker = PropertyWalker::new(&self.rules, &self.converters, self.policy());
        let entries = walker.collect(window as &dyn PropertyNode, name, &self.notifier)?;
        for entry in &entries {
            self.store.set(&entry.section, &entry.key, &entry.value);
        }
        self.store.save(&self.store_path)?;

        tracing::info!(
            window = name,
            %bounds,
            %state,
            screen,
            properties = entries.len(),
            "window placement saved"
        );
        Ok(())
    }

    /// Reads and parses one stored value. Malformed values follow the error
    /// policy; in resilient mode they reach subscribers and read as absent.
    fn stored<T>(&self, section: &str, key: &str) -> PlacementResult<Option<T>>
    where
        T: FromStr,
        T::Err: Into<PlacementError> + Display,
    {
        match self.store.get_parsed::<T>(section, key) {
            None => Ok(None),
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(err)) => match self.policy() {
                ErrorPolicy::Strict => Err(err.into()),
                ErrorPolicy::Resilient => {
                    self.notifier.raise(SuppressedError {
                        window: section.to_string(),
                        control: None,
                        error: PropertyError::MalformedValue {
                            key: key.to_string(),
                            value: self.store.get(section, key).unwrap_or_default().to_string(),
                            reason: err.to_string(),
                        },
                    });
                    Ok(None)
                }
            },
        }
    }

    fn policy(&self) -> ErrorPolicy {
        self.config.error_policy()
    }
}

/// Returns whether the window moved.
fn fit_tracked(
    tracked: &mut TrackedWindow,
    window: &mut dyn HostWindow,
    env: &dyn DisplayEnvironment,
) -> bool {
    let areas = env.work_areas();
    let Some(bounds) = ScreenFitter::new(&areas, env.caption_height()).fit(window, tracked.mode) else {
        return false;
    };
    if window.window_state() == WindowState::Normal {
        tracked.default_size = bounds;
    }
    true
}
