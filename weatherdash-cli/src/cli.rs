use anyhow::Result;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::time::Duration;
use tracing::debug;
use weatherdash_core::{Config, Dashboard, Guarded, suggest::MIN_QUERY_LEN};

use crate::{interactive, prompt::prompt, view};

/// How long `logout` waits for the backend before exiting anyway.
const LOGOUT_GRACE: Duration = Duration::from_secs(3);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard in your terminal")]
pub struct Cli {
    /// Backend API root, overriding config and WEATHERDASH_API_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log core library activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Runs the interactive dashboard when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the backend URL.
    Configure,

    /// Interactive dashboard with live city suggestions.
    Dashboard,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "London" or "Paris, FR".
        city: String,
    },

    /// List cities matching a partial name.
    Suggest { query: String },

    /// Sign in.
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Create an account and sign in.
    Register {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// Sign out.
    Logout,

    /// Show who is signed in.
    Status,

    /// Show your past searches.
    History,
}

impl Cli {
    /// Load config and apply command-line overrides.
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::load()?;
        if let Some(url) = &self.base_url {
            config.set_base_url(url)?;
        }
        if self.verbose {
            config.logging.filters.push("weatherdash_core=debug".to_string());
        }
        Ok(config)
    }

    pub async fn run(self, config: Config) -> Result<()> {
        match self.command.unwrap_or(Command::Dashboard) {
            Command::Configure => configure(config).await,
            Command::Dashboard => interactive::run(open(&config).await?).await,
            Command::Show { city } => show(&open(&config).await?, &city).await,
            Command::Suggest { query } => suggest(&open(&config).await?, &config, &query).await,
            Command::Login { username } => login(&open(&config).await?, username).await,
            Command::Register { username, email } => {
                register(&open(&config).await?, username, email).await
            }
            Command::Logout => logout(&open(&config).await?).await,
            Command::Status => {
                let dash = open(&config).await?;
                println!("{}", view::navbar(&dash.session().state()));
                Ok(())
            }
            Command::History => history(&open(&config).await?).await,
        }
    }
}

/// Wire the dashboard and restore any saved session.
async fn open(config: &Config) -> Result<Dashboard> {
    let dash = Dashboard::from_config(config)?;
    let state = dash.session().bootstrap().await;
    debug!(authenticated = state.is_authenticated(), "Session bootstrapped");
    Ok(dash)
}

async fn configure(mut config: Config) -> Result<()> {
    let current = config.api.base_url.clone();
    let Some(url) = prompt(move || {
        Text::new("Backend API URL:")
            .with_default(&current)
            .with_help_message("Root of the dashboard API, e.g. https://weather.example.com/api")
            .prompt()
    })
    .await?
    else {
        return Ok(());
    };

    config.set_base_url(&url)?;
    config.save()?;
    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

pub async fn show(dash: &Dashboard, city: &str) -> Result<()> {
    // Failures are already reflected in the search state.
    let _ = dash.search().search(city).await;
    print!("{}", view::home(&dash.search().state()));
    Ok(())
}

async fn suggest(dash: &Dashboard, config: &Config, query: &str) -> Result<()> {
    if query.chars().count() < MIN_QUERY_LEN {
        println!("Type at least {MIN_QUERY_LEN} characters.");
        return Ok(());
    }

    let pipeline = dash.suggestions();
    let mut rx = pipeline.subscribe();
    pipeline.on_query_change(query);

    let wait = config.suggestions.debounce() + config.api.timeout();
    if tokio::time::timeout(wait, rx.changed()).await.is_err() {
        debug!(query, "No suggestions before timeout");
    }

    print!("{}", view::suggestions(&pipeline.state()));
    Ok(())
}

pub async fn login(dash: &Dashboard, username: Option<String>) -> Result<()> {
    let Some(username) = ask_or(username, "Username:").await? else {
        return Ok(());
    };
    let Some(password) = prompt(|| {
        Password::new("Password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
    })
    .await?
    else {
        return Ok(());
    };

    match dash.session().login(&username, &password).await {
        Ok(user) => println!("Welcome, {}", user.username),
        Err(err) => println!("Login failed: {err}. Check your credentials and try again."),
    }
    Ok(())
}

pub async fn register(
    dash: &Dashboard,
    username: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let Some(username) = ask_or(username, "Username:").await? else {
        return Ok(());
    };
    let Some(email) = ask_or(email, "Email:").await? else {
        return Ok(());
    };
    let Some(password) = prompt(|| {
        Password::new("Password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_custom_confirmation_message("Confirm password:")
            .prompt()
    })
    .await?
    else {
        return Ok(());
    };

    match dash.session().register(&username, &email, &password).await {
        Ok(user) => println!("Account created. Welcome, {}", user.username),
        Err(err) => println!("Registration failed: {err}. The username or email may be taken."),
    }
    Ok(())
}

async fn logout(dash: &Dashboard) -> Result<()> {
    let notify = dash.session().logout();
    println!("Signed out.");

    // The process is about to exit; give the backend a moment to hear about it.
    if let Some(notify) = notify {
        if tokio::time::timeout(LOGOUT_GRACE, notify).await.is_err() {
            debug!("Backend logout notification still pending at exit");
        }
    }
    Ok(())
}

pub async fn history(dash: &Dashboard) -> Result<()> {
    match dash.history().await {
        Ok(Guarded::Render(entries)) => print!("{}", view::history(&entries)),
        Ok(Guarded::Redirect(route)) => {
            println!("Please log in to see your search history ({route}).")
        }
        Err(err) => {
            debug!(error = %err, "History fetch failed");
            println!("{}", view::HISTORY_FAILED);
        }
    }
    Ok(())
}

async fn ask_or(value: Option<String>, label: &'static str) -> Result<Option<String>> {
    if let Some(value) = value {
        return Ok(Some(value));
    }

    let answer = prompt(move || {
        Text::new(label)
            .with_validator(|s: &str| {
                if s.trim().is_empty() {
                    Ok(inquire::validator::Validation::Invalid("Required".into()))
                } else {
                    Ok(inquire::validator::Validation::Valid)
                }
            })
            .prompt()
    })
    .await?;

    Ok(answer.map(|s| s.trim().to_string()))
}
