//! Host-side handles identifying where a panel lives, and the host contract.

use std::{fmt, rc::Rc};

use crate::{CommitError, CommittedConfig, Controller, PanelView};

/// Opaque host token for the options context a panel is created under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionsHandle(u64);

impl OptionsHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OptionsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "options#{}", self.0)
    }
}

/// Opaque host token for the tabbed container a panel renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabbedPaneHandle(u64);

impl TabbedPaneHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TabbedPaneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane#{}", self.0)
    }
}

/// Where a panel is rendered: the options context plus the tabbed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub options: OptionsHandle,
    pub tabbed_pane: TabbedPaneHandle,
}

impl Placement {
    pub const fn new(options: OptionsHandle, tabbed_pane: TabbedPaneHandle) -> Self {
        Self { options, tabbed_pane }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.tabbed_pane, self.options)
    }
}

/// Capabilities a host UI framework provides to panel controllers.
///
/// Controllers call back into the host from inside their own methods, so
/// implementations must not hold borrows of controller storage across
/// `render`, `unmount` or `commit`.
pub trait PanelHost {
    /// Whether the placement names a live container able to receive a panel.
    fn resolve(&self, placement: &Placement) -> bool;

    /// Draws (or redraws) the panel into its placement.
    fn render(&self, placement: &Placement, view: &PanelView);

    /// Removes the panel from its placement.
    fn unmount(&self, placement: &Placement);

    /// Persists configuration from a successful submission.
    fn commit(&self, config: &CommittedConfig) -> Result<(), CommitError>;

    /// Takes ownership of a freshly attached controller and routes UI events to it.
    fn adopt(&self, controller: Controller);
}

/// Shared reference to the host, passed to registration entry points.
pub type HostHandle = Rc<dyn PanelHost>;
