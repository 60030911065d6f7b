use std::{fs, path::Path, rc::Rc};

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use cloudpanel_engine::{DeclaredProvider, HeadlessHost, HostHandle, PanelParams, PanelView, ProviderRegistry, Schema, format_preview};
use cloudpanel_types::FieldOutcome;
use cloudpanel_util::{CONFIG_PATH_ENV, ProviderConfigStore, expand_tilde};
use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value};
use tracing::debug;

fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    let mut registry = cloudpanel_providers::builtin_registry()?;
    if let Some(paths) = matches.get_many::<String>("schema") {
        for path in paths {
            let provider = DeclaredProvider::from_file(expand_tilde(path)).with_context(|| format!("failed to load schema {}", path))?;
            registry.register(provider)?;
        }
    }

    match matches.subcommand() {
        Some(("providers", _)) => list_providers(&registry),
        Some(("describe", sub)) => describe_provider(&registry, required_provider(sub)?),
        Some(("configure", sub)) => configure_provider(&registry, open_store(&matches)?, sub),
        Some(("show", sub)) => show_provider(&registry, &open_store(&matches)?, required_provider(sub)?),
        _ => bail!("expected a subcommand; run with --help for usage"),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    let provider_arg = || Arg::new("provider").required(true).help("Provider identifier, for example 'swarm'");
    Command::new("cloudpanel")
        .about("Configure cloud provider profiles from their schemas")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .env(CONFIG_PATH_ENV)
                .action(ArgAction::Set)
                .help("Path to the provider configuration file"),
        )
        .arg(
            Arg::new("schema")
                .long("schema")
                .global(true)
                .action(ArgAction::Append)
                .help("Register an extra provider from a YAML/JSON schema file"),
        )
        .subcommand(Command::new("providers").about("List registered providers"))
        .subcommand(Command::new("describe").about("Print a provider's fields").arg(provider_arg()))
        .subcommand(
            Command::new("configure")
                .about("Fill in and submit a provider panel")
                .arg(provider_arg())
                .arg(
                    Arg::new("set")
                        .long("set")
                        .short('s')
                        .action(ArgAction::Append)
                        .value_name("FIELD=VALUE")
                        .help("Edit a field after the panel opens"),
                )
                .arg(
                    Arg::new("values")
                        .long("values")
                        .short('f')
                        .action(ArgAction::Set)
                        .help("YAML/JSON file with initial values"),
                )
                .arg(
                    Arg::new("read-only")
                        .long("read-only")
                        .action(ArgAction::SetTrue)
                        .help("Open the panel without allowing changes"),
                ),
        )
        .subcommand(Command::new("show").about("Print stored configuration").arg(provider_arg()))
}

fn required_provider(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("provider")
        .map(String::as_str)
        .context("expected a provider identifier")
}

fn open_store(matches: &ArgMatches) -> Result<ProviderConfigStore> {
    let store = match matches.get_one::<String>("config") {
        Some(path) => ProviderConfigStore::at(expand_tilde(path)),
        None => ProviderConfigStore::load(),
    };
    store.context("failed to open provider configuration store")
}

fn list_providers(registry: &ProviderRegistry) -> Result<()> {
    for (identifier, title) in registry.providers() {
        println!("{:<12} {}", identifier, title);
    }
    Ok(())
}

fn describe_provider(registry: &ProviderRegistry, identifier: &str) -> Result<()> {
    let schema = registry.describe(identifier)?;
    if let Some(title) = schema.title() {
        println!("{} ({})", title, schema.identifier());
    }
    for field in schema.fields() {
        let mut notes = vec![field.kind.to_string()];
        if field.required {
            notes.push("required".to_string());
        }
        if let Some(default) = &field.default {
            notes.push(format!("default {}", format_preview(default, field.secret)));
        }
        if !field.choices.is_empty() {
            let choices: Vec<String> = field.choices.iter().map(|choice| format_preview(choice, false)).collect();
            notes.push(format!("one of {}", choices.join("|")));
        }
        if field.secret {
            notes.push("secret".to_string());
        }
        println!("  {:<18} {:<20} [{}]", field.name, field.display_label(), notes.join(", "));
        if let Some(description) = &field.description {
            println!("  {:<18} {}", "", description);
        }
    }
    Ok(())
}

fn configure_provider(registry: &ProviderRegistry, store: ProviderConfigStore, matches: &ArgMatches) -> Result<()> {
    let identifier = required_provider(matches)?;
    let mut params = PanelParams::default();
    if let Some(path) = matches.get_one::<String>("values") {
        params = params.with_initial_values(read_values_file(&expand_tilde(path))?);
    }
    if matches.get_flag("read-only") {
        params = params.read_only();
    }

    let host = Rc::new(HeadlessHost::new(store));
    let handle: HostHandle = host.clone();
    let pane = host.open_pane();
    registry
        .init(identifier, &handle, &host.options_handle(), &pane, params)
        .with_context(|| format!("failed to open the {} panel", identifier))?;

    if let Some(edits) = matches.get_many::<String>("set") {
        for edit in edits {
            let (field, text) = edit
                .split_once('=')
                .with_context(|| format!("invalid --set '{}': expected FIELD=VALUE", edit))?;
            let outcome = host.edit_text(pane, field.trim(), text)?;
            debug!(field, outcome = ?outcome, "applied --set edit");
            if let FieldOutcome::Invalid(message) = &outcome {
                eprintln!("{}: {}", field.trim(), message);
            }
        }
    }

    let view = host.view(pane).context("panel did not render")?;
    print_view(&view);
    if view.read_only {
        return Ok(());
    }

    let committed = host.submit(pane)?;
    let schema = registry.describe(identifier)?;
    let output = serde_json::json!({
        "provider": committed.identifier,
        "committed_at": committed.committed_at,
        "values": masked_values(schema.as_ref(), &committed.values),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn show_provider(registry: &ProviderRegistry, store: &ProviderConfigStore, identifier: &str) -> Result<()> {
    let Some(stored) = store.get(identifier) else {
        bail!("no configuration stored for '{}' in {}", identifier, store.path().display());
    };
    let values = match registry.describe(identifier) {
        Ok(schema) => masked_values(schema.as_ref(), &stored.values),
        // Provider no longer registered: nothing says which fields are secret.
        Err(_) => stored
            .values
            .keys()
            .map(|name| (name.clone(), Value::String("********".to_string())))
            .collect(),
    };
    let output = serde_json::json!({
        "provider": identifier,
        "committed_at": stored.committed_at,
        "values": values,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_values_file(path: &Path) -> Result<IndexMap<String, Value>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("{} is not a YAML/JSON mapping", path.display()))
}

fn print_view(view: &PanelView) {
    println!("{}", view.title.as_deref().unwrap_or(&view.identifier));
    for row in &view.rows {
        let marker = if row.required { "*" } else { " " };
        let value = row.value.as_deref().or(row.placeholder.as_deref()).unwrap_or("");
        match &row.message {
            Some(message) => println!("{} {:<20} {:<32} ! {}", marker, row.label, value, message),
            None => println!("{} {:<20} {}", marker, row.label, value),
        }
    }
    if !view.valid {
        println!("panel is incomplete");
    }
}

fn masked_values(schema: &dyn Schema, values: &IndexMap<String, Value>) -> JsonMap<String, Value> {
    values
        .iter()
        .map(|(name, value)| {
            let secret = schema.field(name).is_some_and(|field| field.secret);
            let shown = if secret {
                Value::String(format_preview(value, true))
            } else {
                value.clone()
            };
            (name.clone(), shown)
        })
        .collect()
}
