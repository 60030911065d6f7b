//! In-process host used by the CLI and tests in place of a widget toolkit.
//!
//! The headless host hands out tabbed pane handles, keeps the last view each
//! panel rendered, owns adopted controllers, and persists commits to a
//! [`ProviderConfigStore`]. A pane holds at most one panel.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use cloudpanel_types::FieldOutcome;
use cloudpanel_util::{ProviderConfigStore, StoredProviderConfig};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{CommitError, CommittedConfig, Controller, OptionsHandle, PanelError, PanelHost, PanelView, Placement, TabbedPaneHandle};

#[derive(Debug, Default)]
struct PaneRecord {
    view: Option<PanelView>,
}

#[derive(Debug)]
pub struct HeadlessHost {
    store: ProviderConfigStore,
    next_handle: Cell<u64>,
    panes: RefCell<IndexMap<TabbedPaneHandle, PaneRecord>>,
    controllers: RefCell<HashMap<TabbedPaneHandle, Controller>>,
}

impl HeadlessHost {
    pub fn new(store: ProviderConfigStore) -> Self {
        Self {
            store,
            next_handle: Cell::new(1),
            panes: RefCell::new(IndexMap::new()),
            controllers: RefCell::new(HashMap::new()),
        }
    }

    /// Host backed by an in-memory store.
    pub fn ephemeral() -> Rc<Self> {
        Rc::new(Self::new(ProviderConfigStore::ephemeral()))
    }

    pub fn store(&self) -> &ProviderConfigStore {
        &self.store
    }

    /// Issues a new options context token.
    pub fn options_handle(&self) -> OptionsHandle {
        OptionsHandle::new(self.issue_handle())
    }

    /// Opens a new, empty tabbed pane.
    pub fn open_pane(&self) -> TabbedPaneHandle {
        let pane = TabbedPaneHandle::new(self.issue_handle());
        self.panes.borrow_mut().insert(pane, PaneRecord::default());
        debug!(pane = %pane, "pane opened");
        pane
    }

    /// Closes a pane, detaching any panel it holds. Returns false for unknown panes.
    pub fn close_pane(&self, pane: TabbedPaneHandle) -> bool {
        let controller = self.controllers.borrow_mut().remove(&pane);
        if let Some(controller) = controller {
            controller.detach();
        }
        let closed = self.panes.borrow_mut().shift_remove(&pane).is_some();
        debug!(pane = %pane, closed, "pane closed");
        closed
    }

    pub fn is_open(&self, pane: TabbedPaneHandle) -> bool {
        self.panes.borrow().contains_key(&pane)
    }

    pub fn has_panel(&self, pane: TabbedPaneHandle) -> bool {
        self.controllers.borrow().contains_key(&pane)
    }

    /// Last view rendered into the pane, if a panel is mounted there.
    pub fn view(&self, pane: TabbedPaneHandle) -> Option<PanelView> {
        self.panes.borrow().get(&pane).and_then(|record| record.view.clone())
    }

    /// Current values of the panel in the pane.
    pub fn values(&self, pane: TabbedPaneHandle) -> Option<IndexMap<String, Value>> {
        self.controllers.borrow().get(&pane).map(|controller| controller.values().clone())
    }

    pub fn edit(&self, pane: TabbedPaneHandle, field: &str, value: Value) -> Result<FieldOutcome, PanelError> {
        self.with_panel(pane, |controller| controller.edit(field, value))
    }

    pub fn edit_text(&self, pane: TabbedPaneHandle, field: &str, text: &str) -> Result<FieldOutcome, PanelError> {
        self.with_panel(pane, |controller| controller.edit_text(field, text))
    }

    pub fn clear(&self, pane: TabbedPaneHandle, field: &str) -> Result<FieldOutcome, PanelError> {
        self.with_panel(pane, |controller| controller.clear(field))
    }

    pub fn submit(&self, pane: TabbedPaneHandle) -> Result<CommittedConfig, PanelError> {
        self.with_panel(pane, Controller::submit)
    }

    /// Runs `action` against the controller adopted for `pane`.
    pub fn with_panel<R>(&self, pane: TabbedPaneHandle, action: impl FnOnce(&mut Controller) -> Result<R, PanelError>) -> Result<R, PanelError> {
        let mut controllers = self.controllers.borrow_mut();
        let controller = controllers.get_mut(&pane).ok_or(PanelError::NoPanel { pane })?;
        action(controller)
    }

    fn issue_handle(&self) -> u64 {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }
}

impl PanelHost for HeadlessHost {
    fn resolve(&self, placement: &Placement) -> bool {
        let pane = placement.tabbed_pane;
        let empty = self.panes.borrow().get(&pane).is_some_and(|record| record.view.is_none());
        empty && !self.has_panel(pane)
    }

    fn render(&self, placement: &Placement, view: &PanelView) {
        if let Some(record) = self.panes.borrow_mut().get_mut(&placement.tabbed_pane) {
            record.view = Some(view.clone());
        }
    }

    fn unmount(&self, placement: &Placement) {
        if let Some(record) = self.panes.borrow_mut().get_mut(&placement.tabbed_pane) {
            record.view = None;
        }
    }

    fn commit(&self, config: &CommittedConfig) -> Result<(), CommitError> {
        let stored = StoredProviderConfig {
            values: config.values.clone(),
            committed_at: config.committed_at,
        };
        self.store.put(&config.identifier, stored)?;
        Ok(())
    }

    fn adopt(&self, controller: Controller) {
        let pane = controller.placement().tabbed_pane;
        if !self.is_open(pane) {
            warn!(pane = %pane, provider = controller.identifier(), "adopting controller for a closed pane; detaching");
            controller.detach();
            return;
        }
        let previous = self.controllers.borrow_mut().remove(&pane);
        if let Some(previous) = previous {
            warn!(pane = %pane, provider = previous.identifier(), "pane already held a panel; replacing it");
            previous.detach();
            // The detach unmounted the pane, so draw the incoming panel again.
            self.render(&controller.placement(), &controller.view());
        }
        self.controllers.borrow_mut().insert(pane, controller);
    }
}
