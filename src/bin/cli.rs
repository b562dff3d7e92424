//! Social CLI
//!
//! Terminal front end for the social service:
//! - Interactive shell (one session per run)
//! - One-shot anonymous reads of posts, users and profiles
//! - Default config generation

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use social::api::{Id, UserQuery};
use social::config::{generate_default_config, Config};
use social::pages::{FeedScope, ProfileTarget, Tab};
use social::shell::Shell;
use social::App;

#[derive(Parser)]
#[command(name = "social")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Post, comment and follow people from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: ~/.config/social/config.toml, then ./social.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the config file and SOCIAL_FE_BE_URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive shell (default)
    Shell,

    /// List posts
    Posts {
        /// Only posts by this user id
        #[arg(long)]
        author: Option<String>,
    },

    /// Show one post with its comments
    Post {
        /// Post id
        id: String,
    },

    /// List users
    Users,

    /// Show a user profile
    Profile {
        /// User id
        id: String,
        /// Also list the user's followers
        #[arg(long, conflicts_with = "followings")]
        followers: bool,
        /// Also list the users this user follows
        #[arg(long)]
        followings: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Config { output } => write_default_config(output),
        command => run(command, cli.config, cli.base_url).await,
    }
}

fn write_default_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote default config to {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn run(
    command: Commands,
    config_path: Option<PathBuf>,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    let mut config = Config::load_default(config_path.as_deref())?;
    if let Some(url) = base_url {
        config.api.base_url = url;
    }
    social::telemetry::init(&config.logging)?;

    let app = App::install(config)?;
    tracing::debug!("social v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Commands::Shell => {
            println!("social {} - type `help` for commands", env!("CARGO_PKG_VERSION"));
            let mut shell = Shell::new(app, std::io::stdout());
            shell
                .run(tokio::io::BufReader::new(tokio::io::stdin()))
                .await?;
        }

        Commands::Posts { author } => {
            let page = app.feed();
            let scope = match author {
                Some(id) => FeedScope::ByAuthor(Id::from(id)),
                None => FeedScope::All,
            };
            page.open(scope).await;
            if let Some(error) = page.snapshot().error {
                anyhow::bail!(error);
            }
            let posts = page.posts();
            if posts.is_empty() {
                println!("No posts yet.");
            }
            for post in posts.iter() {
                println!("{}", post);
                println!();
            }
        }

        Commands::Post { id } => {
            let page = app.post_page();
            page.open(Id::from(id)).await;
            page.toggle_comments().await;

            let snapshot = page.snapshot();
            if let Some(error) = snapshot.error {
                anyhow::bail!(error);
            }
            if let Some(post) = snapshot.data {
                println!("{}", post);
            }
            for comment in page.comments().iter() {
                println!("{}", comment);
            }
        }

        Commands::Users => {
            let users = app.client().list_users(&UserQuery::default()).await?;
            println!("{:<26} {:<20} {}", "ID", "Name", "Email");
            println!("{}", "-".repeat(70));
            for user in users {
                println!("{:<26} {:<20} {}", user.id, user.name, user.email);
            }
        }

        Commands::Profile {
            id,
            followers,
            followings,
        } => {
            let page = app.profile();
            page.open(ProfileTarget::Identified(Id::from(id))).await;
            if let Some(error) = page.snapshot().error {
                anyhow::bail!(error);
            }
            if let Some(user) = page.user() {
                println!("{}", user);
            }

            let tab = match (followers, followings) {
                (true, _) => Some(Tab::Followers),
                (_, true) => Some(Tab::Followings),
                _ => None,
            };
            if let Some(tab) = tab {
                page.select_tab(tab).await;
                if let Some(error) = page.tab_snapshot(tab).error {
                    anyhow::bail!(error);
                }
                println!();
                println!("{:?}:", tab);
                for user in page.listed(tab).iter() {
                    println!("  {}", user);
                }
            }
        }

        Commands::Config { output } => write_default_config(output)?,
    }

    Ok(())
}
