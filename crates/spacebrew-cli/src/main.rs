//! Spacebrew CLI - command-line Spacebrew client
//!
//! Watch a router, publish or subscribe to a single channel, and add or
//! remove routes from the command line.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use spacebrew_client::{ClientSettings, Overrides, Spacebrew, SpacebrewBuilder};
use spacebrew_core::{ChannelType, RouteOp, DEFAULT_PORT, DEFAULT_SERVER};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Spacebrew - publish/subscribe routing for interactive spaces
#[derive(Parser)]
#[command(name = "spacebrew")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Router host
    #[arg(short, long, global = true, env = "SPACEBREW_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Router port
    #[arg(short = 'P', long, global = true, env = "SPACEBREW_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Client name
    #[arg(short, long, global = true, env = "SPACEBREW_NAME")]
    name: Option<String>,

    /// Client description
    #[arg(short, long, global = true, env = "SPACEBREW_DESCRIPTION")]
    description: Option<String>,

    /// Query string overrides (e.g. "server=host&name=app"); these win over other options
    #[arg(short, long, global = true)]
    query: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch clients and routes on the router (admin mode)
    Monitor,

    /// Publish a single value
    Pub {
        /// Channel name
        channel: String,

        /// Channel type (boolean, range, string or a custom tag)
        #[arg(short = 't', long = "type", default_value = "string")]
        channel_type: String,

        /// Value to send
        value: String,
    },

    /// Subscribe to a channel and print incoming values
    Sub {
        /// Channel name
        channel: String,

        /// Channel type (boolean, range, string or a custom tag)
        #[arg(short = 't', long = "type", default_value = "string")]
        channel_type: String,
    },

    /// Add or remove a route between two clients
    Route {
        /// Operation
        #[arg(value_enum)]
        op: RouteAction,

        /// Publisher as client@address:channel
        publisher: String,

        /// Subscriber as client@address:channel
        subscriber: String,

        /// Time to collect client announcements before sending, in milliseconds
        #[arg(long, default_value = "1000")]
        settle_ms: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RouteAction {
    Add,
    Remove,
}

impl From<RouteAction> for RouteOp {
    fn from(action: RouteAction) -> Self {
        match action {
            RouteAction::Add => RouteOp::Add,
            RouteAction::Remove => RouteOp::Remove,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Monitor => run_monitor(&cli.connection).await?,

        Commands::Pub {
            channel,
            channel_type,
            value,
        } => run_publish(&cli.connection, &channel, &channel_type, &value).await?,

        Commands::Sub {
            channel,
            channel_type,
        } => run_subscribe(&cli.connection, &channel, &channel_type).await?,

        Commands::Route {
            op,
            publisher,
            subscriber,
            settle_ms,
        } => {
            run_route(
                &cli.connection,
                op.into(),
                &publisher,
                &subscriber,
                Duration::from_millis(settle_ms),
            )
            .await?
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

/// Builder seeded from the shared connection options
fn builder(args: &ConnectionArgs, default_name: &str) -> SpacebrewBuilder {
    let settings = ClientSettings {
        server: args.server.clone(),
        port: args.port,
        name: args.name.clone().unwrap_or_else(|| default_name.to_string()),
        description: args
            .description
            .clone()
            .unwrap_or_else(|| "spacebrew command-line client".to_string()),
        admin: false,
    };
    let overrides = args
        .query
        .as_deref()
        .map(Overrides::from_query)
        .unwrap_or_default();

    Spacebrew::builder().settings(settings).overrides(overrides)
}

/// Connect and wait for the open handshake
async fn open(builder: SpacebrewBuilder) -> Result<(Spacebrew, Arc<Notify>)> {
    let opened = Arc::new(Notify::new());
    let closed = Arc::new(Notify::new());

    let client = {
        let opened = opened.clone();
        let closed = closed.clone();
        builder
            .on_open(move || opened.notify_one())
            .on_close(move || closed.notify_one())
            .build()
    };

    println!("{} Connecting to {}", "SPACEBREW".cyan().bold(), client.url());
    client
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", client.url()))?;

    tokio::select! {
        _ = opened.notified() => {}
        _ = closed.notified() => bail!("Connection closed before opening"),
        _ = tokio::time::sleep(Duration::from_secs(10)) => bail!("Timed out waiting for router"),
    }

    println!(
        "{} Connected as {}",
        "SPACEBREW".cyan().bold(),
        client.name().green()
    );
    Ok((client, closed))
}

/// Block until Ctrl+C or the router closes the connection
async fn wait_for_shutdown(client: &Spacebrew, closed: &Notify) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            client.close();
        }
        _ = closed.notified() => {
            warn!("Router closed the connection");
        }
    }
}

async fn run_monitor(args: &ConnectionArgs) -> Result<()> {
    let builder = builder(args, "spacebrew monitor")
        .admin(true)
        .on_new_client(|client| {
            println!(
                "{} {} @ {} ({} pub, {} sub)",
                "+".green().bold(),
                client.name.green(),
                client.remote_address,
                client.publish.len(),
                client.subscribe.len()
            );
        })
        .on_updated_client(|client| {
            println!(
                "{} {} @ {} ({} pub, {} sub)",
                "~".yellow().bold(),
                client.name.yellow(),
                client.remote_address,
                client.publish.len(),
                client.subscribe.len()
            );
        })
        .on_remove_client(|name, address| {
            println!("{} {} @ {}", "-".red().bold(), name.red(), address);
        })
        .on_route_update(|update| {
            let side = |e: &Option<spacebrew_core::Endpoint>| {
                e.as_ref()
                    .map(|e| format!("{}@{}:{}", e.client_name, e.remote_address, e.name))
                    .unwrap_or_else(|| "?".to_string())
            };
            println!(
                "{} route {} {} -> {}",
                "*".cyan().bold(),
                update.kind,
                side(&update.publish),
                side(&update.subscribe)
            );
        });

    let (client, closed) = open(builder).await?;
    wait_for_shutdown(&client, &closed).await;
    Ok(())
}

async fn run_publish(
    args: &ConnectionArgs,
    channel: &str,
    channel_type: &str,
    value: &str,
) -> Result<()> {
    let channel_type = ChannelType::parse(channel_type);
    let builder = builder(args, "spacebrew publisher").publish(
        channel,
        channel_type.clone(),
        Some(value),
    );

    let (client, _closed) = open(builder).await?;
    client.send(channel, channel_type.clone(), value)?;
    println!(
        "{} {} [{}] = {}",
        "SENT".green().bold(),
        channel,
        channel_type,
        value
    );

    // Let the writer flush before closing
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.close();
    Ok(())
}

async fn run_subscribe(args: &ConnectionArgs, channel: &str, channel_type: &str) -> Result<()> {
    let builder = builder(args, "spacebrew subscriber")
        .subscribe(channel, ChannelType::parse(channel_type))
        .on_boolean(|name, value| println!("{} {} = {}", "<".cyan(), name, value))
        .on_range(|name, value| println!("{} {} = {}", "<".cyan(), name, value))
        .on_string(|name, value| println!("{} {} = {}", "<".cyan(), name, value))
        .on_custom(|name, value, kind| {
            println!("{} {} [{}] = {}", "<".cyan(), name, kind, value)
        });

    let (client, closed) = open(builder).await?;
    println!(
        "{} Waiting for values on {} (route a publisher to this client)",
        "SPACEBREW".cyan().bold(),
        channel.yellow()
    );
    wait_for_shutdown(&client, &closed).await;
    Ok(())
}

async fn run_route(
    args: &ConnectionArgs,
    op: RouteOp,
    publisher: &str,
    subscriber: &str,
    settle: Duration,
) -> Result<()> {
    let (pub_client, pub_address, pub_name) = parse_channel(publisher)?;
    let (sub_client, sub_address, sub_name) = parse_channel(subscriber)?;

    let builder = builder(args, "spacebrew router cli").admin(true);
    let (client, _closed) = open(builder).await?;

    // Admin announcements arrive after registration; give them time so types resolve
    tokio::time::sleep(settle).await;

    let result = match op {
        RouteOp::Add => client.add_route(
            pub_client,
            pub_address,
            pub_name,
            sub_client,
            sub_address,
            sub_name,
        ),
        RouteOp::Remove => client.remove_route(
            pub_client,
            pub_address,
            pub_name,
            sub_client,
            sub_address,
            sub_name,
        ),
    };
    result.with_context(|| format!("Unable to {} route", op))?;

    println!(
        "{} route {} {} -> {}",
        "SENT".green().bold(),
        op,
        publisher,
        subscriber
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    client.close();
    Ok(())
}

/// Split `client@address:channel`
fn parse_channel(spec: &str) -> Result<(&str, &str, &str)> {
    let (client, rest) = spec
        .split_once('@')
        .with_context(|| format!("Missing '@' in {}", spec))?;
    let (address, channel) = rest
        .rsplit_once(':')
        .with_context(|| format!("Missing ':' in {}", spec))?;
    if client.is_empty() || address.is_empty() || channel.is_empty() {
        bail!("Expected client@address:channel, got {}", spec);
    }
    Ok((client, address, channel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel() {
        assert_eq!(
            parse_channel("button@192.168.1.5:pressed").unwrap(),
            ("button", "192.168.1.5", "pressed")
        );
        assert!(parse_channel("button:pressed").is_err());
        assert!(parse_channel("@1.2.3.4:x").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "spacebrew",
            "--server",
            "localhost",
            "pub",
            "level",
            "--type",
            "range",
            "42",
        ])
        .unwrap();
        assert_eq!(cli.connection.server, "localhost");
        assert!(matches!(cli.command, Commands::Pub { .. }));
    }
}
