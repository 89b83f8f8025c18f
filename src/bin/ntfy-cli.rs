//! CLI client for ntfy-style push notification servers.
//!
//! Publishes, polls and subscribes from the command line. Defaults (host,
//! credentials, topics to subscribe to) come from a YAML or TOML config file.

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use ntfy_client::core::options::{
    with_click, with_credentials, with_delay, with_icon, with_markdown, with_no_cache,
    with_no_firebase, with_priority, with_scheduled, with_since, with_tags_list, with_title,
    RequestOption,
};
use ntfy_client::logging::init_logging_with_level;
use ntfy_client::{Client, Config};

/// Command-line interface for ntfy-client.
#[derive(Debug, Parser)]
#[command(
    name = "ntfy-cli",
    version,
    about = "Publish to, poll and subscribe to push notification topics"
)]
pub struct Cli {
    /// Client config file (.yml/.yaml or .toml); env NTFY_CONFIG is used otherwise
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Publish a message to a topic
    Publish {
        /// Topic name or URL
        topic: String,
        /// Message body (enclose in quotes for spaces)
        message: String,
        #[arg(short, long)]
        title: Option<String>,
        /// 1-5 or min, low, default, high, max/urgent
        #[arg(short, long)]
        priority: Option<String>,
        /// Comma separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Delay delivery, e.g. 30m or "tomorrow, 9am"
        #[arg(long)]
        delay: Option<String>,
        #[arg(long)]
        click: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        markdown: bool,
        #[arg(long)]
        no_cache: bool,
        #[arg(long)]
        no_firebase: bool,
    },

    /// Print the messages a topic currently holds and exit
    Poll {
        /// Topic name or URL
        topic: String,
        /// all, latest, a unix timestamp, a duration (10m) or a message id
        #[arg(long)]
        since: Option<String>,
        /// Include scheduled messages
        #[arg(long)]
        scheduled: bool,
    },

    /// Stream new messages; uses the config's subscribe list if no topic is given
    Subscribe {
        /// Topic names or URLs
        topics: Vec<String>,
        #[arg(long)]
        since: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_level(&cli.log_level);

    let config = Config::load(cli.config.as_deref())?;
    let default_auth: Vec<RequestOption> = config
        .default_credentials()
        .map(|c| vec![with_credentials(&c)])
        .unwrap_or_default();
    let client = Client::new(config);

    match cli.command {
        Command::Publish {
            topic,
            message,
            title,
            priority,
            tags,
            delay,
            click,
            icon,
            markdown,
            no_cache,
            no_firebase,
        } => {
            let mut options = default_auth;
            options.extend(title.map(with_title));
            options.extend(priority.map(with_priority));
            options.extend(tags.map(with_tags_list));
            options.extend(delay.map(with_delay));
            options.extend(click.map(with_click));
            options.extend(icon.map(with_icon));
            if markdown {
                options.push(with_markdown());
            }
            if no_cache {
                options.push(with_no_cache());
            }
            if no_firebase {
                options.push(with_no_firebase());
            }

            let published = client.publish(&topic, message, &options).await?;
            println!("{}", published.raw.trim_end());
        }

        Command::Poll {
            topic,
            since,
            scheduled,
        } => {
            let mut options = default_auth;
            options.extend(since.map(with_since));
            if scheduled {
                options.push(with_scheduled());
            }

            match client.poll(&topic, &options).await {
                Ok(messages) => {
                    for m in messages {
                        println!("{}", m.raw);
                    }
                }
                Err(err) => {
                    for m in &err.messages {
                        println!("{}", m.raw);
                    }
                    return Err(err.into());
                }
            }
        }

        Command::Subscribe { topics, since } => {
            let since: Vec<RequestOption> = since.map(with_since).into_iter().collect();

            if topics.is_empty() {
                let entries = client.config().subscribe.clone();
                if entries.is_empty() {
                    anyhow::bail!("no topics given and none configured under `subscribe`");
                }
                for entry in entries {
                    let mut options = since.clone();
                    options.extend(client.config().subscribe_options(&entry));
                    let id = client.subscribe(&entry.topic, &options)?;
                    info!(subscription_id = %id, "Subscribed to {}", entry.topic);
                }
            } else {
                for topic in &topics {
                    let mut options = default_auth.clone();
                    options.extend(since.iter().cloned());
                    let id = client.subscribe(topic, &options)?;
                    info!(subscription_id = %id, "Subscribed to {}", topic);
                }
            }

            // The queue stays open while the client lives; only ctrl-c ends this.
            loop {
                tokio::select! {
                    Some(m) = client.messages().next() => println!("{}", m.raw),
                    _ = tokio::signal::ctrl_c() => {
                        warn!("Interrupted, closing subscriptions");
                        break;
                    }
                }
            }
            client.shutdown().await;
        }
    }

    Ok(())
}
