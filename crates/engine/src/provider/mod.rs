//! Provider modules and the registration step composing them into panels.
//!
//! Modules:
//! - `declared`: provider module backed by a declarative schema document
//! - `registry`: explicit identifier → module table populated at startup

mod declared;
mod registry;

use std::sync::Arc;

use cloudpanel_types::{Schema, SchemaError};

pub use declared::DeclaredProvider;
pub use registry::ProviderRegistry;

use crate::{Controller, HostHandle, OptionsHandle, PanelError, PanelParams, Placement, TabbedPaneHandle};

/// A pluggable provider type the host can instantiate panels for.
pub trait ProviderModule {
    /// Stable provider type key, equal to the identifier of the schemas it builds.
    fn identifier(&self) -> &str;

    fn title(&self) -> &str;

    /// Builds a fresh, independent schema instance.
    fn schema(&self) -> Result<Arc<dyn Schema>, SchemaError>;

    /// Registration entry point: builds a schema and attaches a controller for it.
    fn init(&self, host: &HostHandle, options: &OptionsHandle, tabbed_pane: &TabbedPaneHandle, params: PanelParams) -> Result<(), PanelError> {
        let schema = self.schema()?;
        register_panel(host, options, tabbed_pane, params, schema)
    }
}

/// Attaches a controller for `schema` at the given placement and hands it to the host.
///
/// Errors from the controller propagate unchanged; on error the host adopts nothing.
pub fn register_panel(
    host: &HostHandle,
    options: &OptionsHandle,
    tabbed_pane: &TabbedPaneHandle,
    params: PanelParams,
    schema: Arc<dyn Schema>,
) -> Result<(), PanelError> {
    let placement = Placement::new(*options, *tabbed_pane);
    let controller = Controller::attach(host, placement, params, schema)?;
    host.adopt(controller);
    Ok(())
}
