//! CLI module for the FarmerJoin command-line interface.
//!
//! Without a subcommand the binary runs the HTTP server. The subcommands are:
//! - `seed-admin` - Create the first admin account
//! - `login` / `logout` / `whoami` - Manage the cached client session
//! - `open <page>` - Run the client route guard for a page
//! - `config check` - Validate the configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{landing_path, open_page, CachedSession, GuardDecision, SessionCache};
use crate::config::{Config, ADMIN_PASSWORD_ENV};
use crate::db::{AccountDetail, LoginResponse, Role};

#[derive(Parser, Debug)]
#[command(name = "farmerjoin")]
#[command(
    author,
    version,
    about = "FarmerJoin account and role authorization service",
    long_about = None
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "farmerjoin.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL used by the client commands
    #[arg(long, env = "FARMERJOIN_API_URL", default_value = "http://localhost:4000")]
    pub api_url: String,

    /// Session cache file (default: ~/.farmerjoin/session.json)
    #[arg(long, env = "FARMERJOIN_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the bootstrap admin account if it does not exist
    SeedAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// Falls back to FARMERJOIN_ADMIN_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and cache the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "FARMERJOIN_PASSWORD")]
        password: Option<String>,
    },

    /// Forget the cached session
    Logout,

    /// Show the cached identity
    Whoami {
        /// Also ask the server whether the token is still accepted
        #[arg(long)]
        check: bool,
    },

    /// Decide whether a client page renders or redirects
    Open {
        /// Page path, e.g. /buyer-dashboard
        page: String,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn create_client(token: Option<&str>) -> Result<Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(token) = token {
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", token)
                .parse()
                .context("Invalid token format")?,
        );
    }

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

fn session_cache(cli: &Cli) -> Result<SessionCache> {
    let path = match &cli.session_file {
        Some(path) => path.clone(),
        None => SessionCache::default_path()?,
    };
    Ok(SessionCache::new(path))
}

/// Turn a non-2xx response into an error carrying the server's message
async fn error_from_response(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error) => anyhow::anyhow!("{} ({})", error.message, status),
        Err(_) => anyhow::anyhow!("Server returned error {}: {}", status, body),
    }
}

fn read_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Run a CLI subcommand. `None` (serve) is handled in main.rs.
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Some(Commands::SeedAdmin {
            email,
            name,
            password,
        }) => cmd_seed_admin(config, email, name, password.as_deref()).await,
        Some(Commands::Login { email, password }) => {
            cmd_login(cli, email, password.as_deref()).await
        }
        Some(Commands::Logout) => cmd_logout(cli),
        Some(Commands::Whoami { check }) => cmd_whoami(cli, *check).await,
        Some(Commands::Open { page }) => cmd_open(cli, page),
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        None => Ok(()),
    }
}

async fn cmd_seed_admin(
    config: &Config,
    email: &str,
    name: &str,
    password: Option<&str>,
) -> Result<()> {
    let password = password
        .map(str::to_string)
        .or_else(|| config.auth.admin_password.clone())
        .with_context(|| format!("Pass --password or set {}", ADMIN_PASSWORD_ENV))?;
    crate::db::check_admin_password(&password, config.auth.min_password_length)?;

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.server.data_dir.display()
        )
    })?;
    let db = crate::db::init(&config.server.data_dir).await?;

    match crate::db::seed_admin(&db, email, name, &password).await? {
        crate::db::SeedOutcome::Created { user_id } => {
            println!("[OK] Created admin account {} (id {})", email, user_id);
        }
        crate::db::SeedOutcome::AlreadyExists { user_id, role } if role == Role::Admin => {
            println!("[--] Admin {} already exists (id {}), left unchanged", email, user_id);
        }
        crate::db::SeedOutcome::AlreadyExists { user_id, role } => {
            println!(
                "[!!] {} already belongs to a {} account (id {}); no admin was created",
                email, role, user_id
            );
        }
    }
    Ok(())
}

async fn cmd_login(cli: &Cli, email: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(password) => password.to_string(),
        None => read_password("Password: ")?,
    };

    let client = create_client(None)?;
    let url = format!("{}/auth/login", cli.api_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .context("Failed to connect to server. Is FarmerJoin running?")?;

    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    let login: LoginResponse = response
        .json()
        .await
        .context("Failed to parse login response")?;

    let session = CachedSession {
        token: login.token,
        user: login.user,
    };
    let cache = session_cache(cli)?;
    cache.store(&session)?;

    println!(
        "Logged in as {} ({})",
        session.user.full_name, session.user.role
    );
    println!("Landing page: {}", landing_path(Some(&session)));
    Ok(())
}

fn cmd_logout(cli: &Cli) -> Result<()> {
    session_cache(cli)?.clear()?;
    println!("Logged out");
    Ok(())
}

async fn cmd_whoami(cli: &Cli, check: bool) -> Result<()> {
    let Some(session) = session_cache(cli)?.load() else {
        println!("Not logged in");
        return Ok(());
    };

    println!("User ID:  {}", session.user.user_id);
    println!("Name:     {}", session.user.full_name);
    println!("Email:    {}", session.user.email);
    println!("Role:     {}", session.user.role);

    if check {
        let client = create_client(Some(&session.token))?;
        let url = format!("{}/auth/me", cli.api_url.trim_end_matches('/'));
        let response = client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to server")?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            println!("Server:   [!!] token rejected, log in again");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let account: AccountDetail = response
            .json()
            .await
            .context("Failed to parse account response")?;
        if account.role != session.user.role {
            println!(
                "Server:   [!!] role is now {}, log in again to refresh",
                account.role
            );
        } else {
            println!("Server:   [OK] token accepted");
        }
    }
    Ok(())
}

fn cmd_open(cli: &Cli, page: &str) -> Result<()> {
    let session = session_cache(cli)?.load();
    match open_page(page, session.as_ref()) {
        GuardDecision::Render => println!("render"),
        GuardDecision::Redirect(target) => println!("redirect {}", target),
    }
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!("[!!] Configuration file not found: {}", config_path.display());
        println!();
        println!("Defaults will be used when starting the server.");
        println!("To customise, copy farmerjoin.example.toml to farmerjoin.toml");
        return Ok(());
    }

    let config = Config::load(config_path)?;
    println!("[OK] Configuration file is valid!");
    println!();
    println!("Server:");
    println!("  Address:      {}:{}", config.server.host, config.server.port);
    println!("  Data Dir:     {}", config.server.data_dir.display());
    println!("  Timeout:      {}s", config.server.request_timeout_secs);
    println!();
    println!("Auth:");
    println!(
        "  JWT Secret:   {}",
        if config.auth.jwt_secret.is_some() {
            "Configured"
        } else {
            "Not set (random per start, tokens die on restart)"
        }
    );
    println!("  Token TTL:    {}h", config.auth.token_ttl_hours);
    println!("  Min Password: {}", config.auth.min_password_length);
    println!(
        "  Expose Temp:  {}",
        if config.auth.expose_temporary_password {
            "Yes"
        } else {
            "No"
        }
    );
    println!();
    println!(
        "Email:          {}",
        if config.email.is_configured() {
            "Configured"
        } else {
            "Not configured"
        }
    );
    println!(
        "Rate Limiting:  {}",
        if config.rate_limit.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );

    if !config.email.is_configured() && !config.auth.expose_temporary_password {
        println!();
        println!("[!!] Password resets are unavailable: configure [email] or set");
        println!("     auth.expose_temporary_password = true");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["farmerjoin"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("farmerjoin.toml"));
    }

    #[test]
    fn test_parse_seed_admin() {
        let cli = Cli::try_parse_from([
            "farmerjoin",
            "seed-admin",
            "--email",
            "admin@farmerjoin.rw",
            "--name",
            "Admin",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::SeedAdmin {
                email,
                name,
                password,
            }) => {
                assert_eq!(email, "admin@farmerjoin.rw");
                assert_eq!(name, "Admin");
                assert!(password.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_open() {
        let cli = Cli::try_parse_from(["farmerjoin", "open", "/buyer-dashboard"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Open { ref page }) if page == "/buyer-dashboard"
        ));
    }

    #[tokio::test]
    async fn test_seed_admin_requires_password() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.data_dir = dir.path().to_path_buf();

        let err = cmd_seed_admin(&config, "admin@farmerjoin.rw", "Admin", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(ADMIN_PASSWORD_ENV));

        let err = cmd_seed_admin(&config, "admin@farmerjoin.rw", "Admin", Some("abc"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at least"));
    }

    #[tokio::test]
    async fn test_seed_admin_writes_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.data_dir = dir.path().to_path_buf();

        cmd_seed_admin(&config, "admin@farmerjoin.rw", "Admin", Some("bootstrap-pass"))
            .await
            .unwrap();
        assert!(dir.path().join("farmerjoin.db").exists());
    }
}
