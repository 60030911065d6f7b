//! Built-in provider modules.
//!
//! Each module exposes a fresh-schema builder and an `init` entry point. The
//! host composes them into a [`ProviderRegistry`] with [`builtin_registry`].

pub mod swarm;

use cloudpanel_engine::{PanelError, ProviderRegistry};

pub use swarm::{SwarmProvider, init as init_swarm, swarm_schema};

/// Registry holding every provider shipped with the crate.
pub fn builtin_registry() -> Result<ProviderRegistry, PanelError> {
    let mut registry = ProviderRegistry::new();
    registry.register(SwarmProvider)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_lists_swarm() {
        let registry = builtin_registry().expect("builtin registry");
        let providers: Vec<_> = registry.providers().collect();
        assert_eq!(providers, vec![(swarm::SWARM_IDENTIFIER, swarm::SWARM_TITLE)]);
    }
}
