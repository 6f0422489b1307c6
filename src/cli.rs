//! Command-line surface. Every command renders its result as pretty-printed
//! JSON on stdout; credential warnings go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::client::keys::KeyType;
use crate::client::types::{
    ApiAccessKeyUpdate, DashboardInput, LogParsingRuleUpdate, NewDeployment,
};
use crate::client::{Client, ClientConfig};
use crate::config::{self, Config};
use crate::identifiers::EntityGuid;
use crate::time::parse_flexible_time;

#[derive(Debug, Clone, Parser)]
#[command(name = "newrelic-cli", author, version, about)]
pub struct Cli {
    /// Path to the config file.
    #[arg(long, env = "NEWRELIC_CLI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub api_key: Option<String>,
    #[arg(long, global = true)]
    pub account_id: Option<String>,
    #[arg(long, global = true)]
    pub region: Option<String>,
    #[arg(long, global = true)]
    pub timezone: Option<String>,
    #[arg(long, global = true)]
    pub timeout: Option<String>,
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// APM applications.
    #[command(subcommand)]
    Apps(AppsCommand),
    /// Alert policies.
    #[command(subcommand)]
    Alerts(AlertsCommand),
    /// Dashboards.
    #[command(subcommand)]
    Dashboards(DashboardsCommand),
    /// Deployment markers.
    #[command(subcommand)]
    Deployments(DeploymentsCommand),
    /// Entity search.
    #[command(subcommand)]
    Entities(EntitiesCommand),
    /// API access keys.
    #[command(subcommand)]
    Keys(KeysCommand),
    /// Log parsing rules.
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Run an NRQL query against the configured account.
    Nrql { query: String },
    /// Synthetic monitors.
    #[command(subcommand)]
    Synthetics(SyntheticsCommand),
    /// Users in the account's organization.
    #[command(subcommand)]
    Users(UsersCommand),
    /// Read and write the stored configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Verify API key and account access.
    Ping,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AppsCommand {
    List,
    /// Look an application up by ID, entity GUID, or name.
    Get { app: String },
    /// List the metric names an application reports.
    Metrics { app: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AlertsCommand {
    List,
    Get { policy_id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum DashboardsCommand {
    List,
    Get {
        guid: String,
    },
    /// Create a dashboard from a JSON definition file.
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    Update {
        guid: String,
        #[arg(long)]
        file: PathBuf,
    },
    Delete {
        guid: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum DeploymentsCommand {
    List {
        app: String,
        /// Lower bound; accepts the flexible forms ("2 days ago", "yesterday", dates).
        #[arg(long)]
        since: Option<String>,
        /// Upper bound; same forms as --since.
        #[arg(long)]
        until: Option<String>,
    },
    Create {
        app: String,
        #[arg(long)]
        revision: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        user: String,
        #[arg(long, default_value = "")]
        changelog: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum EntitiesCommand {
    /// Search entities with an entity-search query expression.
    Search { query: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum KeysCommand {
    List {
        /// Filter by key type (USER or INGEST); both when omitted.
        #[arg(long = "type", value_name = "TYPE")]
        key_type: Option<KeyType>,
        /// Restrict the search to one account.
        #[arg(long)]
        account: Option<i64>,
    },
    Get {
        key_id: String,
        /// Key type; auto-detected (USER probed first) when omitted.
        #[arg(long = "type", value_name = "TYPE")]
        key_type: Option<KeyType>,
    },
    Create {
        #[arg(long = "type", value_name = "TYPE")]
        key_type: KeyType,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Account the key belongs to; defaults to the configured account.
        #[arg(long)]
        account: Option<i64>,
        /// User the key belongs to (user keys); defaults to the caller.
        #[arg(long)]
        user_id: Option<i64>,
        /// LICENSE or BROWSER (ingest keys).
        #[arg(long)]
        ingest_type: Option<String>,
    },
    Update {
        key_id: String,
        #[arg(long = "type", value_name = "TYPE")]
        key_type: Option<KeyType>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        #[arg(required = true)]
        key_ids: Vec<String>,
        /// Key type; auto-detected per key when omitted.
        #[arg(long = "type", value_name = "TYPE")]
        key_type: Option<KeyType>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum LogsCommand {
    /// List the account's log parsing rules.
    Rules,
    CreateRule {
        #[arg(long)]
        description: String,
        #[arg(long)]
        grok: String,
        #[arg(long)]
        nrql: String,
        #[arg(long, default_value = "")]
        lucene: String,
        #[arg(long, default_value_t = true)]
        enabled: bool,
    },
    UpdateRule {
        rule_id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        grok: Option<String>,
        #[arg(long)]
        nrql: Option<String>,
        #[arg(long)]
        lucene: Option<String>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    DeleteRule {
        rule_id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum SyntheticsCommand {
    List,
    Get { monitor_id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum UsersCommand {
    List,
    Get { user_id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    SetApiKey { value: String },
    SetAccountId { value: String },
    SetRegion { value: String },
    /// Print the effective configuration.
    Get,
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Command::Config(command) = &cli.command {
        return run_config(&cli, command.clone());
    }

    let config = config::load(&cli)?;
    init_tracing(&config.log_level);

    if let Some(warning) = config.api_key_warning() {
        eprintln!("warning: {warning}");
    }

    let client = build_client(&config)?;
    match cli.command {
        Command::Apps(command) => run_apps(&client, command).await,
        Command::Alerts(command) => run_alerts(&client, command).await,
        Command::Dashboards(command) => run_dashboards(&client, command).await,
        Command::Deployments(command) => run_deployments(&client, &config, command).await,
        Command::Entities(command) => run_entities(&client, command).await,
        Command::Keys(command) => run_keys(&client, command).await,
        Command::Logs(command) => run_logs(&client, command).await,
        Command::Nrql { query } => print_json(&client.query_nrql(&query).await?),
        Command::Synthetics(command) => run_synthetics(&client, command).await,
        Command::Users(command) => run_users(&client, command).await,
        Command::Ping => print_json(&client.test_connection().await?),
        Command::Config(_) => unreachable!("handled above"),
    }
}

fn build_client(config: &Config) -> Result<Client> {
    let client_config: ClientConfig = config.client_config()?;
    if client_config.api_key.is_empty() {
        bail!("API key required - run 'newrelic-cli config set-api-key' or set NEWRELIC_API_KEY");
    }
    Ok(Client::new(client_config)?)
}

async fn run_apps(client: &Client, command: AppsCommand) -> Result<()> {
    match command {
        AppsCommand::List => print_json(&client.list_applications().await?),
        AppsCommand::Get { app } => {
            let app_id = client.resolve_app_id(&app).await?;
            print_json(&client.get_application(&app_id).await?)
        }
        AppsCommand::Metrics { app } => {
            let app_id = client.resolve_app_id(&app).await?;
            print_json(&client.list_application_metrics(&app_id).await?)
        }
    }
}

async fn run_alerts(client: &Client, command: AlertsCommand) -> Result<()> {
    match command {
        AlertsCommand::List => print_json(&client.list_alert_policies().await?),
        AlertsCommand::Get { policy_id } => print_json(&client.get_alert_policy(&policy_id).await?),
    }
}

async fn run_dashboards(client: &Client, command: DashboardsCommand) -> Result<()> {
    match command {
        DashboardsCommand::List => print_json(&client.list_dashboards().await?),
        DashboardsCommand::Get { guid } => {
            print_json(&client.get_dashboard(&EntityGuid::new(guid)).await?)
        }
        DashboardsCommand::Create { file } => {
            let input = read_dashboard_input(&file)?;
            print_json(&client.create_dashboard(&input).await?)
        }
        DashboardsCommand::Update { guid, file } => {
            let input = read_dashboard_input(&file)?;
            print_json(
                &client
                    .update_dashboard(&EntityGuid::new(guid), &input)
                    .await?,
            )
        }
        DashboardsCommand::Delete { guid } => {
            client.delete_dashboard(&EntityGuid::new(guid)).await?;
            println!("dashboard deleted");
            Ok(())
        }
    }
}

async fn run_deployments(
    client: &Client,
    config: &Config,
    command: DeploymentsCommand,
) -> Result<()> {
    match command {
        DeploymentsCommand::List { app, since, until } => {
            let tz = config.timezone();
            let now = Utc::now();
            let since = since
                .map(|raw| parse_flexible_time(&raw, tz, now))
                .transpose()
                .context("invalid --since")?;
            let until = until
                .map(|raw| parse_flexible_time(&raw, tz, now))
                .transpose()
                .context("invalid --until")?;

            let app_id = client.resolve_app_id(&app).await?;
            print_json(
                &client
                    .list_deployments_between(&app_id, since, until)
                    .await?,
            )
        }
        DeploymentsCommand::Create {
            app,
            revision,
            description,
            user,
            changelog,
        } => {
            let app_id = client.resolve_app_id(&app).await?;
            let new = NewDeployment {
                revision,
                description,
                user,
                changelog,
            };
            print_json(&client.create_deployment(&app_id, new).await?)
        }
    }
}

async fn run_entities(client: &Client, command: EntitiesCommand) -> Result<()> {
    match command {
        EntitiesCommand::Search { query } => print_json(&client.search_entities(&query).await?),
    }
}

async fn run_keys(client: &Client, command: KeysCommand) -> Result<()> {
    match command {
        KeysCommand::List { key_type, account } => {
            let types: Vec<KeyType> = key_type.into_iter().collect();
            print_json(&client.search_api_keys(&types, account).await?)
        }
        KeysCommand::Get { key_id, key_type } => match key_type {
            Some(key_type) => print_json(&client.get_api_access_key(&key_id, key_type).await?),
            None => print_json(&client.find_api_access_key(&key_id).await?),
        },
        KeysCommand::Create {
            key_type,
            name,
            notes,
            account,
            user_id,
            ingest_type,
        } => {
            let account_id = match account {
                Some(id) => id,
                None => client.account_id().as_int()?,
            };
            let key = match key_type {
                KeyType::User => {
                    let user_id = match user_id {
                        Some(id) => id,
                        None => client.get_current_user_id().await?,
                    };
                    client
                        .create_user_api_key(account_id, user_id, &name, &notes)
                        .await?
                }
                KeyType::Ingest => {
                    let Some(ingest_type) = ingest_type else {
                        bail!("--ingest-type is required for ingest keys (LICENSE or BROWSER)");
                    };
                    client
                        .create_ingest_api_key(
                            account_id,
                            &ingest_type.to_ascii_uppercase(),
                            &name,
                            &notes,
                        )
                        .await?
                }
            };
            print_json(&key)
        }
        KeysCommand::Update {
            key_id,
            key_type,
            name,
            notes,
        } => {
            let key_type = match key_type {
                Some(key_type) => key_type,
                None => client.find_api_access_key(&key_id).await?.key_type.parse()?,
            };
            let update = ApiAccessKeyUpdate { name, notes };
            print_json(
                &client
                    .update_api_access_key(&key_id, key_type, &update)
                    .await?,
            )
        }
        KeysCommand::Delete { key_ids, key_type } => {
            let mut user_ids = Vec::new();
            let mut ingest_ids = Vec::new();
            for key_id in key_ids {
                let key_type = match key_type {
                    Some(key_type) => key_type,
                    None => client.find_api_access_key(&key_id).await?.key_type.parse()?,
                };
                match key_type {
                    KeyType::User => user_ids.push(key_id),
                    KeyType::Ingest => ingest_ids.push(key_id),
                }
            }
            print_json(&client.delete_api_access_keys(&user_ids, &ingest_ids).await?)
        }
    }
}

async fn run_logs(client: &Client, command: LogsCommand) -> Result<()> {
    match command {
        LogsCommand::Rules => print_json(&client.list_log_parsing_rules().await?),
        LogsCommand::CreateRule {
            description,
            grok,
            nrql,
            lucene,
            enabled,
        } => print_json(
            &client
                .create_log_parsing_rule(&description, &grok, &nrql, enabled, &lucene)
                .await?,
        ),
        LogsCommand::UpdateRule {
            rule_id,
            description,
            grok,
            nrql,
            lucene,
            enabled,
        } => {
            let update = LogParsingRuleUpdate {
                description,
                enabled,
                grok,
                lucene,
                nrql,
            };
            print_json(&client.update_log_parsing_rule(&rule_id, &update).await?)
        }
        LogsCommand::DeleteRule { rule_id } => {
            client.delete_log_parsing_rule(&rule_id).await?;
            println!("log parsing rule deleted");
            Ok(())
        }
    }
}

async fn run_synthetics(client: &Client, command: SyntheticsCommand) -> Result<()> {
    match command {
        SyntheticsCommand::List => print_json(&client.list_synthetic_monitors().await?),
        SyntheticsCommand::Get { monitor_id } => {
            print_json(&client.get_synthetic_monitor(&monitor_id).await?)
        }
    }
}

async fn run_users(client: &Client, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List => print_json(&client.list_users().await?),
        UsersCommand::Get { user_id } => print_json(&client.get_user(&user_id).await?),
    }
}

fn run_config(cli: &Cli, command: ConfigCommand) -> Result<()> {
    let path = config::config_file_path(cli.config.as_deref());
    let mut config = config::load_for_editing(cli)?;

    match command {
        ConfigCommand::SetApiKey { value } => {
            config.api_key = value.trim().to_string();
            config.save(&path)?;
            if let Some(warning) = config.api_key_warning() {
                eprintln!("warning: {warning}");
            }
            println!("api_key saved to {}", path.display());
        }
        ConfigCommand::SetAccountId { value } => {
            let account_id = value.trim().to_string();
            crate::identifiers::AccountId::new(account_id.clone()).as_int()?;
            config.account_id = account_id;
            config.save(&path)?;
            println!("account_id saved to {}", path.display());
        }
        ConfigCommand::SetRegion { value } => {
            let region: crate::identifiers::Region = value.parse()?;
            config.region = region.as_str().to_string();
            config.save(&path)?;
            println!("region saved to {}", path.display());
        }
        ConfigCommand::Get => {
            print_json(&config)?;
        }
    }

    Ok(())
}

fn read_dashboard_input(path: &Path) -> Result<DashboardInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid dashboard JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
}
