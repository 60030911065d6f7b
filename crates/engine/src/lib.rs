//! # CloudPanel Engine
//!
//! A generic controller that turns a declarative provider [`Schema`] into a
//! live, editable configuration panel hosted by some UI framework.
//!
//! ## Key Features
//!
//! - **Schema-driven panels**: one [`Controller`] per schema/placement pair, with
//!   initial values merged over field defaults
//! - **Inline validation**: every edit re-validates its field and recomputes the
//!   aggregate verdict that gates submission
//! - **Pluggable providers**: [`ProviderModule`] implementations are registered in
//!   an explicit [`ProviderRegistry`] instead of being discovered by name
//! - **Host abstraction**: the [`PanelHost`] trait isolates rendering and
//!   persistence; [`HeadlessHost`] implements it without a widget toolkit
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use cloudpanel_engine::{HeadlessHost, HostHandle, PanelParams, register_panel};
//! use cloudpanel_types::{FieldSpec, ProviderSchema};
//! use serde_json::json;
//!
//! let host = HeadlessHost::ephemeral();
//! let handle: HostHandle = host.clone();
//! let pane = host.open_pane();
//! let schema = ProviderSchema::new(
//!     "demo",
//!     vec![FieldSpec::string("name").required(), FieldSpec::number("replicas")],
//! )?;
//!
//! register_panel(&handle, &host.options_handle(), &pane, PanelParams::default(), Arc::new(schema))?;
//! host.edit(pane, "name", json!("swarm-1"))?;
//! host.edit(pane, "replicas", json!(3))?;
//! let committed = host.submit(pane)?;
//! assert_eq!(committed.values["replicas"], json!(3));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`controller`**: attach/edit/submit/detach lifecycle
//! - **`state`**: panel state, render snapshots, committed output
//! - **`placement`**: host handles and the host contract
//! - **`provider`**: provider modules, registration step, registry
//! - **`host`**: headless host implementation

pub mod controller;
pub mod error;
pub mod host;
pub mod params;
pub mod placement;
pub mod provider;
pub mod state;

pub use cloudpanel_types::Schema;
pub use controller::Controller;
pub use error::{CommitError, PanelError};
pub use host::HeadlessHost;
pub use params::PanelParams;
pub use placement::{HostHandle, OptionsHandle, PanelHost, Placement, TabbedPaneHandle};
pub use provider::{DeclaredProvider, ProviderModule, ProviderRegistry, register_panel};
pub use state::{CommittedConfig, FieldRow, FieldStatus, PanelState, PanelView, format_preview};
