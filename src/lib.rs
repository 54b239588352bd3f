pub mod config;
pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod logging;
pub mod notification;
pub mod properties;
pub mod screen;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::{default_settings_dir, skip_requested, PlacementConfig};
pub use error::{ErrorPolicy, PlacementError, PlacementResult};
pub use geometry::{Dpi, Point, Rect, Size, SizeChangeMode, WindowState};
pub use lifecycle::{PlacementController, Registration, SettleRequest, WindowId};
pub use properties::{ApplicationKind, ElementIdentity, PropertyNode, PropertyValue, ValueKind};
pub use screen::{DisplayEnvironment, HostWindow};
pub use state::{WindowEvent, WindowPhase};
pub use storage::Store;

/// Binds a controller for `app_dir` using the user's data directory and the
/// optional `placement.json` from the config directory.
pub fn bind_default(
    kind: ApplicationKind,
    app_dir: &str,
    args: impl IntoIterator<Item = impl AsRef<str>>,
    env: &dyn DisplayEnvironment,
) -> anyhow::Result<PlacementController> {
    use anyhow::Context;

    let config = PlacementConfig::load(app_dir);
    let settings = default_settings_dir(app_dir).context("resolving settings directory")?;
    let controller = PlacementController::bind(kind, config, &settings, env)
        .with_context(|| format!("binding placement store in {}", settings.display()))?;
    Ok(controller.with_skip_requested(skip_requested(args)))
}
