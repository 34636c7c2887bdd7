/**
 * Artline Command Line Client
 *
 * Drives a session from the terminal: authenticate, generate images and
 * manage the Saved, Loved and History collections.
 */
use artline::client::share::{ShareError, SharePayload, ShareTarget};
use artline::client::state::{CollectionKind, Flag};
use artline::client::storage::{SqliteStore, DATABASE_FILE};
use artline::client::sync::{IdSource, ToggleOutcome};
use artline::client::{Config, Notification, Session};
use artline::shared::profile::ProfileUpdate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(version, about = "Artline - generate AI images and keep your collections in sync", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login { email: String, password: String },
    /// Create an account
    Signup {
        name: String,
        email: String,
        password: String,
    },
    /// Log out and wipe local state
    Logout,
    /// Delete the account and wipe local state
    DeleteAccount,
    /// Generate an image from a prompt
    Generate {
        /// Prompt text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Love an image, or toggle when neither --on nor --off is given
    Love {
        id: String,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Save an image, or toggle when neither --on nor --off is given
    Save {
        id: String,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Remove an image from Saved or Loved
    Remove { collection: FlagCollection, id: String },
    /// Remove an image from History, its other collections and the backend
    RemoveHistory { id: String },
    /// List a collection from the local mirror
    List {
        #[arg(value_enum, default_value_t = ListCollection::History)]
        collection: ListCollection,
    },
    /// Replace the local collections with the backend's listings
    Refresh,
    /// Download an image by id or URL
    Download {
        target: String,
        /// Destination directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show the profile, or update it
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Change the account password
    Password { current: String, new: String },
    /// Email password reset instructions
    ResetPassword { email: String },
    /// Set a new password with the token from a reset email
    ResetPasswordConfirm { token: String, new_password: String },
    /// Share an image link
    Share {
        id: String,
        /// Print only the link
        #[arg(long)]
        link: bool,
    },
}

/// Shares by printing to the terminal
struct TerminalShare {
    link_only: bool,
}

impl ShareTarget for TerminalShare {
    fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        if self.link_only {
            return Err(ShareError::Unavailable);
        }
        println!("{}\n{}\n{}", payload.title, payload.text, payload.url);
        Ok(())
    }

    fn copy_link(&self, url: &str) -> Result<(), ShareError> {
        println!("{}", url);
        Ok(())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FlagCollection {
    Saved,
    Loved,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListCollection {
    Saved,
    Loved,
    History,
}

impl From<FlagCollection> for CollectionKind {
    fn from(value: FlagCollection) -> Self {
        match value {
            FlagCollection::Saved => CollectionKind::Saved,
            FlagCollection::Loved => CollectionKind::Loved,
        }
    }
}

impl From<ListCollection> for CollectionKind {
    fn from(value: ListCollection) -> Self {
        match value {
            ListCollection::Saved => CollectionKind::Saved,
            ListCollection::Loved => CollectionKind::Loved,
            ListCollection::History => CollectionKind::History,
        }
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let store = Arc::new(SqliteStore::open(&config.data_dir().join(DATABASE_FILE)).await?);
    let (mut session, mut notifications) = Session::open(config, store).await;

    let result = run(&mut session, cli.command).await;
    drain(&mut notifications);
    result
}

async fn run(session: &mut Session, command: Commands) -> CliResult<()> {
    match command {
        Commands::Login { email, password } => session.login(&email, &password).await?,
        Commands::Signup {
            name,
            email,
            password,
        } => session.signup(&name, &email, &password).await?,
        Commands::Logout => session.logout().await?,
        Commands::DeleteAccount => session.delete_account().await?,
        Commands::Generate { prompt } => {
            let generated = session.engine()?.generate(&prompt.join(" ")).await?;
            println!("{}  {}", generated.record.id, generated.record.image_url);
            if generated.id_source == IdSource::LocalFallback {
                println!("(no id from server; local id assigned)");
            }
        }
        Commands::Love { id, on, off } => set_flag(session, Flag::Love, &id, target(on, off)).await?,
        Commands::Save { id, on, off } => set_flag(session, Flag::Save, &id, target(on, off)).await?,
        Commands::Remove { collection, id } => {
            // Failures are reported by the engine; local removal stands
            let _ = session
                .engine()?
                .remove_from_collection(collection.into(), &id)
                .await;
        }
        Commands::RemoveHistory { id } => {
            session.engine()?.remove_from_history(&id).await;
        }
        Commands::List { collection } => {
            let kind = CollectionKind::from(collection);
            let records = session.engine()?.records(kind).await;
            if records.is_empty() {
                println!("{} is empty", kind);
            }
            for record in records {
                println!("{}  {}  {}", record.id, record.created_at, record.prompt);
            }
        }
        Commands::Refresh => {
            let engine = session.engine()?;
            for kind in [CollectionKind::Loved, CollectionKind::Saved, CollectionKind::History] {
                match engine.refresh(kind).await {
                    Ok(count) => println!("{}: {} image(s)", kind, count),
                    Err(e) => eprintln!("{}: {}", kind, e.user_message("Failed to fetch images")),
                }
            }
        }
        Commands::Download { target, dir } => {
            let url = resolve_url(session, &target).await?;
            let dir = dir
                .or_else(dirs::download_dir)
                .unwrap_or_else(|| PathBuf::from("."));
            if let Some(path) = session.download(&url, &dir).await {
                println!("{}", path.display());
            }
        }
        Commands::Profile { name, avatar } => {
            if name.is_none() && avatar.is_none() {
                let profile = session.fetch_profile().await?;
                println!("{} <{}> ({:?})", profile.name, profile.email, profile.role);
                println!("avatar: {}", profile.avatar_url);
            } else {
                let update = ProfileUpdate {
                    name,
                    avatar_url: avatar,
                };
                session.update_profile(&update).await?;
            }
        }
        Commands::Password { current, new } => session.update_password(&current, &new).await?,
        Commands::ResetPassword { email } => session.request_password_reset(&email).await?,
        Commands::ResetPasswordConfirm { token, new_password } => {
            session.confirm_password_reset(&token, &new_password).await?
        }
        Commands::Share { id, link } => {
            let record = session
                .engine()?
                .mirror()
                .await
                .find(&id)
                .cloned()
                .ok_or_else(|| format!("unknown image id '{}'", id))?;
            session.share(&TerminalShare { link_only: link }, &record);
        }
    }
    Ok(())
}

fn target(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

async fn set_flag(session: &Session, flag: Flag, id: &str, target: Option<bool>) -> CliResult<()> {
    let engine = session.engine()?;
    let record = engine
        .mirror()
        .await
        .find(id)
        .cloned()
        .ok_or_else(|| format!("unknown image id '{}'; run `artline refresh` first", id))?;

    let outcome = match target {
        Some(value) => engine.toggle_flag(flag, &record, value).await,
        None => engine.toggle(flag, &record).await,
    };
    if let ToggleOutcome::RolledBack(error) = outcome {
        return Err(error.into());
    }
    Ok(())
}

async fn resolve_url(session: &Session, target: &str) -> CliResult<String> {
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(target.to_string());
    }
    let engine = session.engine()?;
    let mirror = engine.mirror().await;
    let record = mirror
        .find(target)
        .ok_or_else(|| format!("unknown image id '{}'", target))?;
    Ok(record.image_url.clone())
}

fn drain(notifications: &mut UnboundedReceiver<Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        if notification.is_error() {
            eprintln!("{}", notification);
        } else {
            println!("{}", notification);
        }
    }
}
