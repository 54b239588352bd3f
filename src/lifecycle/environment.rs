use crate::geometry::{Dpi, Rect};
use crate::screen::DisplayEnvironment;
use crate::storage::Store;

pub const DPI_SECTION: &str = "DPI";
pub const DPI_KEY: &str = "value";
pub const SCREENS_SECTION: &str = "Screens";
pub const SCREEN_COUNT_KEY: &str = "count";

/// Display metadata recorded by the previous run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredEnvironment {
    pub dpi: Option<String>,
    pub screen_count: Option<String>,
    pub screens: Vec<(String, String)>,
}

impl StoredEnvironment {
    pub fn read(store: &Store) -> Self {
        Self {
            dpi: store.get(DPI_SECTION, DPI_KEY).map(str::to_string),
            screen_count: store.get(SCREENS_SECTION, SCREEN_COUNT_KEY).map(str::to_string),
            screens: store
                .entries(SCREENS_SECTION)
                .filter(|(key, _)| *key != SCREEN_COUNT_KEY)
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// Compares the recorded DPI and work areas with the live ones.
///
/// A value that was never recorded counts as unchanged; one that cannot be
/// parsed counts as changed.
pub fn display_changed(store: &Store, env: &dyn DisplayEnvironment) -> bool {
    let dpi = env.dpi();
    match store.get_parsed::<Dpi>(DPI_SECTION, DPI_KEY) {
        Some(Ok(stored)) if stored == dpi => {}
        Some(Ok(stored)) => {
            tracing::info!(%stored, current = %dpi, "display DPI changed since last run");
            return true;
        }
        Some(Err(err)) => {
            tracing::warn!(%err, "unreadable stored DPI; treating display as changed");
            return true;
        }
        None => {}
    }

    let areas = env.work_areas();
    match store.get_parsed::<usize>(SCREENS_SECTION, SCREEN_COUNT_KEY) {
        Some(Ok(count)) if count == areas.len() => {}
        Some(Ok(count)) => {
            tracing::info!(stored = count, current = areas.len(), "display count changed since last run");
            return true;
        }
        Some(Err(err)) => {
            tracing::warn!(%err, "unreadable stored display count; treating display as changed");
            return true;
        }
        None => {}
    }

    for (index, area) in areas.iter().enumerate() {
        match store.get_parsed::<Rect>(SCREENS_SECTION, &index.to_string()) {
            Some(Ok(stored)) if stored == *area => {}
            Some(Ok(stored)) => {
                tracing::info!(index, %stored, current = %area, "work area changed since last run");
                return true;
            }
            Some(Err(err)) => {
                tracing::warn!(index, %err, "unreadable stored work area; treating display as changed");
                return true;
            }
            None => {}
        }
    }
    false
}

/// Replaces the recorded metadata with the live display configuration.
pub fn record_environment(store: &mut Store, env: &dyn DisplayEnvironment) {
    let areas = env.work_areas();
    store.set(DPI_SECTION, DPI_KEY, env.dpi());
    store.remove_section(SCREENS_SECTION);
    store.set(SCREENS_SECTION, SCREEN_COUNT_KEY, areas.len());
    for (index, area) in areas.iter().enumerate() {
        store.set(SCREENS_SECTION, &index.to_string(), area);
    }
}
