// File: panel/src/main.rs
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use nimbus_panel::api::{Agents, GeoDns, Resource, Routes, Rules, TrafficRange, Users};
use nimbus_panel::notifications::ToastKind;
use nimbus_panel::pages::{
    AgentsPage, AnalyticsPage, AuditLogPage, DashboardPage, ResourcePage, SettingsPage,
};
use nimbus_panel::schemas::{FieldKind, FieldValue, FormValues, Record, Schema};
use nimbus_panel::storage::SharedStore;
use nimbus_panel::stores::Theme;
use nimbus_panel::table::columns::{
    agent_columns, geodns_columns, route_columns, rule_columns, user_columns,
};
use nimbus_panel::{ConfigManager, PanelError, PanelState, SqliteStorage};

#[derive(Parser, Debug)]
#[command(name = "nimbus-panel", version, about = "Nimbus admin console")]
struct Cli {
    /// Directory holding main.toml
    #[arg(short, long, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "NIMBUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show one page of a resource list
    List {
        resource: ResourceKind,
        #[arg(short, long)]
        search: Option<String>,
        /// Column key to sort by
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Print one record as JSON
    Show { resource: ResourceKind, id: String },
    /// Create a record from key=value fields
    Create {
        resource: ResourceKind,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Change fields of an existing record
    Update {
        resource: ResourceKind,
        id: String,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Delete a record
    Delete {
        resource: ResourceKind,
        id: String,
        /// Skip the confirmation step
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete several agents in one request
    BulkDeleteAgents {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Write a resource list to the download directory
    Export {
        resource: ResourceKind,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
    /// Dashboard counts
    Stats,
    /// Recent activity feed
    Activity,
    /// Traffic analytics for the last N days
    Traffic {
        #[arg(long, default_value_t = 7)]
        days: i64,
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,
    },
    /// Filtered audit log
    Audit {
        #[arg(short, long)]
        search: Option<String>,
        /// Action prefix (agent, rule, route, geodns, user, system, settings)
        #[arg(long = "type", default_value = "all")]
        action_type: String,
        #[arg(long, default_value = "all")]
        severity: String,
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,
    },
    /// Show or change the theme
    Theme { theme: Option<String> },
    /// Show, change or reset preferences
    Preferences {
        #[command(subcommand)]
        action: Option<PreferencesAction>,
    },
}

#[derive(Subcommand, Debug)]
enum PreferencesAction {
    Set { key: String, value: String },
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ResourceKind {
    Agents,
    Rules,
    Routes,
    Geodns,
    Users,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Json,
}

/// Run `$body` with `$page` bound to the generic page of `$kind`
macro_rules! with_page {
    ($state:expr, $kind:expr, |$page:ident| $body:expr) => {
        match $kind {
            ResourceKind::Agents => {
                let $page = ResourcePage::<Agents>::new($state.hooks(), agent_columns());
                $body
            }
            ResourceKind::Rules => {
                let $page = ResourcePage::<Rules>::new($state.hooks(), rule_columns());
                $body
            }
            ResourceKind::Routes => {
                let $page = ResourcePage::<Routes>::new($state.hooks(), route_columns());
                $body
            }
            ResourceKind::Geodns => {
                let $page = ResourcePage::<GeoDns>::new($state.hooks(), geodns_columns());
                $body
            }
            ResourceKind::Users => {
                let $page = ResourcePage::<Users>::new($state.hooks(), user_columns());
                $body
            }
        }
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(cli.config.clone()).await?;
    let config = config_manager.get_current_config();

    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("nimbus_panel={}", level).parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let storage: SharedStore = Arc::new(SqliteStorage::open(&config.storage_path).await?);
    let state = PanelState::new(config, storage).await?;
    let _session_watch = state.watch_session();

    let result = run(&state, cli.command).await;
    print_toasts(&state).await;
    result
}

async fn run(state: &PanelState, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let values = FormValues::new()
                .with_text("username", username)
                .with_text("password", password);
            let response = state.auth().login(&values).await.map_err(describe)?;
            let name = response
                .user
                .map(|u| u.username)
                .unwrap_or_else(|| "unknown user".to_string());
            println!("Signed in as {}", name);
        }
        Command::Logout => {
            state.auth().logout().await?;
            state.cache.clear().await;
            println!("Signed out");
        }
        Command::List {
            resource,
            search,
            sort,
            desc,
            page,
            page_size,
        } => {
            let view = ListView {
                search,
                sort,
                desc,
                page,
                page_size,
            };
            with_page!(state, resource, |page| list(page, &view).await)?;
        }
        Command::Show { resource, id } => {
            with_page!(state, resource, |page| show(page, &id).await)?;
        }
        Command::Create { resource, fields } => {
            with_page!(state, resource, |page| create(page, &fields).await)?;
        }
        Command::Update {
            resource,
            id,
            fields,
        } => {
            with_page!(state, resource, |page| update(page, &id, &fields).await)?;
        }
        Command::Delete { resource, id, yes } => {
            with_page!(state, resource, |page| delete(page, &id, yes).await)?;
        }
        Command::BulkDeleteAgents { ids } => {
            let mut agents = AgentsPage::new(state);
            agents.page_mut().refresh().await?;
            for id in &ids {
                agents.page_mut().table_mut().select_row(id, true);
            }
            let deleted = agents.delete_selected().await?;
            if deleted < ids.len() {
                println!("{} id(s) were not in the agent list", ids.len() - deleted);
            }
        }
        Command::Export { resource, format } => {
            let exporter = state.exporter.clone();
            let path = with_page!(state, resource, |page| {
                let mut page = page;
                page.refresh().await?;
                let rows = page.table().data().to_vec();
                let name = resource_file_name(resource);
                match format {
                    ExportFormat::Csv => exporter.export_csv(&rows, name, None).await?,
                    ExportFormat::Json => exporter.export_json(&rows, name).await?,
                }
            });
            println!("Exported to {}", path.display());
        }
        Command::Stats => {
            let view = DashboardPage::new(state).load().await;
            println!("{}", serde_json::to_string_pretty(&view.stats)?);
        }
        Command::Activity => {
            let mut audit = AuditLogPage::new(state);
            audit.refresh().await?;
            println!("{}", audit.table().render_text());
        }
        Command::Traffic { days, export } => {
            let mut analytics = AnalyticsPage::new(state);
            analytics.set_range(TrafficRange::last_days(days));
            let traffic = analytics.load().await?;
            println!("{}", serde_json::to_string_pretty(traffic)?);
            match export {
                Some(ExportFormat::Csv) => {
                    println!("Exported to {}", analytics.export_csv().await?.display())
                }
                Some(ExportFormat::Json) => {
                    println!("Exported to {}", analytics.export_json().await?.display())
                }
                None => {}
            }
        }
        Command::Audit {
            search,
            action_type,
            severity,
            export,
        } => {
            let mut audit = AuditLogPage::new(state);
            audit.refresh().await?;
            if let Some(search) = search {
                audit.set_search(&search);
            }
            audit.set_action_type(&action_type);
            if !audit.set_severity(&severity) {
                bail!("Unknown severity '{}'", severity);
            }

            println!("{}", audit.table().render_text());
            let counts: Vec<String> = audit
                .severity_counts()
                .iter()
                .map(|(severity, count)| format!("{}: {}", severity, count))
                .collect();
            println!("{} entries ({})", audit.total(), counts.join(", "));

            match export {
                Some(ExportFormat::Csv) => {
                    println!("Exported to {}", audit.export_csv().await?.display())
                }
                Some(ExportFormat::Json) => {
                    println!("Exported to {}", audit.export_json().await?.display())
                }
                None => {}
            }
        }
        Command::Theme { theme } => {
            let settings = SettingsPage::new(state);
            if let Some(theme) = theme {
                let theme: Theme = theme.parse().map_err(|e: String| anyhow!(e))?;
                settings.set_theme(theme).await?;
            }
            println!("Theme: {}", settings.view().await.theme);
        }
        Command::Preferences { action } => {
            let settings = SettingsPage::new(state);
            match action {
                Some(PreferencesAction::Set { key, value }) => {
                    settings.set_preference(&key, &value).await?
                }
                Some(PreferencesAction::Reset) => {
                    settings.reset().await?;
                }
                None => {}
            }
            println!("{}", serde_json::to_string_pretty(&settings.view().await)?);
        }
    }
    Ok(())
}

struct ListView {
    search: Option<String>,
    sort: Option<String>,
    desc: bool,
    page: usize,
    page_size: Option<usize>,
}

async fn list<R: Resource>(mut page: ResourcePage<R>, view: &ListView) -> Result<()> {
    page.refresh().await?;
    let table = page.table_mut();

    if let Some(size) = view.page_size {
        if !table.set_page_size(size) {
            bail!("Page size must be greater than zero");
        }
    }
    if let Some(search) = &view.search {
        table.set_global_filter(search);
    }
    if let Some(column) = &view.sort {
        let state = table.toggle_sort(column);
        if state.is_none() {
            bail!("Column '{}' is not sortable", column);
        }
        if view.desc {
            table.toggle_sort(column);
        }
        debug!("Sorted by {:?}", table.sort_state());
    }
    table.set_page(view.page.saturating_sub(1));

    println!("{}", table.render_text());
    Ok(())
}

async fn show<R: Resource>(page: ResourcePage<R>, id: &str) -> Result<()> {
    let record = page.hooks().get(id).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn create<R: Resource>(mut page: ResourcePage<R>, fields: &[String]) -> Result<()> {
    let values = parse_fields::<R::Schema>(fields)?;
    let form = page.open_create();
    for (path, value) in values.iter() {
        form.set(path, value.clone());
    }
    let record = page.submit().await.map_err(describe)?;
    info!("Created {} {}", R::SINGULAR, record.id());
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn update<R: Resource>(mut page: ResourcePage<R>, id: &str, fields: &[String]) -> Result<()> {
    let values = parse_fields::<R::Schema>(fields)?;
    let form = page.open_edit(id).await?;
    for (path, value) in values.iter() {
        form.set(path, value.clone());
    }
    let record = page.submit().await.map_err(describe)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn delete<R: Resource>(mut page: ResourcePage<R>, id: &str, confirmed: bool) -> Result<()> {
    page.request_delete(id);
    if !confirmed {
        page.cancel_delete();
        bail!(
            "Deleting {} {} cannot be undone; pass --yes to confirm",
            R::SINGULAR,
            id
        );
    }
    page.confirm_delete().await?;
    Ok(())
}

fn resource_file_name(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Agents => Agents::KEY,
        ResourceKind::Rules => Rules::KEY,
        ResourceKind::Routes => Routes::KEY,
        ResourceKind::Geodns => GeoDns::KEY,
        ResourceKind::Users => Users::KEY,
    }
}

/// `--set name=edge-1 --set capabilities.http=true --set agents=a1,a2`
fn parse_fields<S: Schema>(fields: &[String]) -> Result<FormValues> {
    let mut values = FormValues::new();
    for field in fields {
        let (key, raw) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", field))?;
        let key = key.trim();
        let spec = S::fields()
            .iter()
            .find(|spec| spec.path == key)
            .ok_or_else(|| anyhow!("{} has no field '{}'", S::ENTITY, key))?;

        let value = match spec.kind {
            FieldKind::Checkbox => match raw.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => FieldValue::Bool(true),
                "false" | "no" | "0" | "off" => FieldValue::Bool(false),
                _ => bail!("'{}' expects true or false, got '{}'", key, raw),
            },
            FieldKind::Reference { multiple: true, .. } => FieldValue::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            _ => FieldValue::Text(raw.to_string()),
        };
        values.set(key, value);
    }
    Ok(values)
}

/// Spell out field errors; other failures keep their message
fn describe(err: PanelError) -> anyhow::Error {
    match err {
        PanelError::Validation(errors) => {
            let lines: Vec<String> = errors
                .iter()
                .filter_map(|(path, messages)| {
                    messages.first().map(|m| format!("  {}: {}", path, m))
                })
                .collect();
            anyhow!("Invalid input:\n{}", lines.join("\n"))
        }
        other => anyhow!(other.root_message()),
    }
}

async fn print_toasts(state: &PanelState) {
    for toast in state.toasts.toasts().await {
        let marker = match toast.kind {
            ToastKind::Success => "✓",
            ToastKind::Error => "✗",
            ToastKind::Warning => "!",
            ToastKind::Info => "i",
        };
        eprintln!("{} {}", marker, toast.message);
    }
}
