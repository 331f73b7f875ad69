//! CLI module for keyward-auth.
//!
//! Administrative front end for a credential store. It can be used either
//! as a standalone binary or as the `auth` subcommand of the main keyward CLI.
//!
//! # Usage
//!
//! ```bash
//! # Show and apply pending schema changes
//! keyward-auth --db-url sqlite:auth.db check
//! keyward-auth --db-url sqlite:auth.db upgrade
//!
//! # Manage users
//! keyward-auth -c keyward.toml add -u alice -p wonderland
//! keyward-auth -c keyward.toml grant -u alice -r admin
//! keyward-auth -c keyward.toml list --format json
//!
//! # Check credentials
//! keyward-auth -c keyward.toml verify -u alice -p wonderland
//! ```

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use keyward_config::{
    CliOverrides, Config, LoggingConfig, apply_overrides, load_config, validate_config,
};
use tabled::{Table, Tabled};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::handler::{DatabaseHandler, UserSummary};
use crate::migration::ChangelogParams;
use crate::user::UserData;

/// Keyward credential store management CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "keyward-auth",
    version,
    about = "Manage keyward users, roles and schema upgrades"
)]
pub struct AuthArgs {
    /// Configuration file (.toml, .json, .jsonc, .yaml, .yml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,

    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommands {
    /// Show schema changes that have not been applied yet.
    Check {
        /// Changelog parameter as NAME=VALUE (repeatable).
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Apply pending schema changes.
    Upgrade {
        /// Changelog parameter as NAME=VALUE (repeatable).
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Check a username and password, printing the granted roles.
    Verify {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        password: String,
    },

    /// Check whether a role is granted to a user.
    HasRole {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        role: String,

        /// Also require this password to match.
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Add a new user.
    Add {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        password: String,

        /// Roles to grant right away (repeatable).
        #[arg(short, long = "role")]
        roles: Vec<String>,
    },

    /// Remove a user and all of their roles.
    Remove {
        #[arg(short, long)]
        user: String,
    },

    /// Grant a role to a user.
    Grant {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        role: String,
    },

    /// Revoke a role from a user.
    Revoke {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        role: String,
    },

    /// List all users.
    List {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Output format of `list`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// User row for display.
#[derive(Tabled)]
struct UserDisplay {
    #[tabled(rename = "User")]
    user_name: String,
    #[tabled(rename = "Roles")]
    roles: String,
}

/// Run the auth CLI with the given arguments.
///
/// This is the main entry point for the auth CLI, used by both the
/// standalone binary and the unified keyward CLI.
pub async fn run(args: AuthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(args.config.as_deref(), &args.overrides)?;
    init_tracing(&config.logging);

    let handler = DatabaseHandler::new(config.auth)?;

    match args.command {
        AuthCommands::Check { params } => {
            let params: ChangelogParams = params.into_iter().collect();
            print!("{}", handler.check_for_upgrades(&params).await);
        }
        AuthCommands::Upgrade { params } => {
            let params: ChangelogParams = params.into_iter().collect();
            let mut out = io::stdout();
            if !handler.do_upgrades(&mut out, &params).await? {
                return Err("database upgrade did not complete".into());
            }
        }
        AuthCommands::Verify { user, password } => {
            let mut data = UserData::new(user, password);
            if !handler.is_valid_user(&mut data).await {
                return Err(format!("invalid credentials for '{}'", data.user_name).into());
            }
            let roles: Vec<&str> = data.roles.iter().map(String::as_str).collect();
            println!("valid: {} [{}]", data.user_name, roles.join(", "));
        }
        AuthCommands::HasRole {
            user,
            role,
            password,
        } => {
            let granted = match password.as_deref() {
                Some(pass) => handler.user_has_role_with_password(&user, pass, &role).await,
                None => handler.user_has_role(Some(&user), &role).await,
            };
            if !granted {
                return Err(format!("'{user}' does not have role '{role}'").into());
            }
            println!("'{user}' has role '{role}'");
        }
        AuthCommands::Add {
            user,
            password,
            roles,
        } => {
            handler.add_user(&user, &password).await?;
            for role in &roles {
                handler.grant_role(&user, role).await?;
            }
            println!("User '{user}' added");
        }
        AuthCommands::Remove { user } => {
            handler.remove_user(&user).await?;
            println!("User '{user}' removed");
        }
        AuthCommands::Grant { user, role } => {
            handler.grant_role(&user, &role).await?;
            println!("Role '{role}' granted to '{user}'");
        }
        AuthCommands::Revoke { user, role } => {
            handler.revoke_role(&user, &role).await?;
            println!("Role '{role}' revoked from '{user}'");
        }
        AuthCommands::List { format } => {
            let users = handler.list_users().await?;
            if users.is_empty() && format == OutputFormat::Table {
                println!("No users found.");
            } else {
                println!("{}", render_users(&users, format)?);
            }
        }
    }

    Ok(())
}

/// Load the configuration file (if any), apply overrides and validate.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<Config, keyward_config::ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, overrides);
    validate_config(&config)?;
    Ok(config)
}

/// Install the global tracing subscriber described by `config`.
pub fn init_tracing(config: &LoggingConfig) {
    // Build the env filter from base level and per-module filters
    let base_level = config.level.as_deref().unwrap_or(keyward_core::DEFAULT_LOG_LEVEL);
    let mut filter_str = base_level.to_string();

    for (module, level) in &config.filters {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }

    let filter = EnvFilter::try_new(&filter_str)
        .unwrap_or_else(|_| EnvFilter::new(keyward_core::DEFAULT_LOG_LEVEL));

    let format = config
        .format
        .as_deref()
        .unwrap_or(keyward_core::DEFAULT_LOG_FORMAT);
    let output = config
        .output
        .as_deref()
        .unwrap_or(keyward_core::DEFAULT_LOG_OUTPUT);

    match (format, output) {
        ("json", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stdout))
                .init();
        }
        ("json", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        ("compact", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stdout))
                .init();
        }
        ("compact", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        (_, "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stdout))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

/// Render users in the requested format.
fn render_users(users: &[UserSummary], format: OutputFormat) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(users)?,
        OutputFormat::Csv => {
            let mut csv = String::from("user_name,roles");
            for user in users {
                csv.push('\n');
                csv.push_str(&csv_field(&user.user_name));
                csv.push(',');
                csv.push_str(&csv_field(&user.roles.join(";")));
            }
            csv
        }
        OutputFormat::Table => {
            let rows = users.iter().map(|user| UserDisplay {
                user_name: user.user_name.clone(),
                roles: if user.roles.is_empty() {
                    "-".to_string()
                } else {
                    user.roles.join(", ")
                },
            });
            Table::new(rows).to_string()
        }
    })
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("empty parameter name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<UserSummary> {
        vec![
            UserSummary {
                user_name: "alice".into(),
                roles: vec!["admin".into(), "auditor".into()],
            },
            UserSummary {
                user_name: "bob".into(),
                roles: vec![],
            },
        ]
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("schema=auth").unwrap(),
            ("schema".to_string(), "auth".to_string())
        );
        assert_eq!(parse_param("empty=").unwrap().1, "");
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_render_csv() {
        let csv = render_users(&users(), OutputFormat::Csv).unwrap();
        assert_eq!(csv, "user_name,roles\nalice,admin;auditor\nbob,");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_json() {
        let json = render_users(&users(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["user_name"], "alice");
        assert_eq!(parsed[0]["roles"][1], "auditor");
        assert_eq!(parsed[1]["roles"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_render_table() {
        let table = render_users(&users(), OutputFormat::Table).unwrap();
        assert!(table.contains("User"));
        assert!(table.contains("admin, auditor"));
        assert!(table.contains("bob"));
    }

    #[test]
    fn test_parse_args() {
        let args = AuthArgs::try_parse_from([
            "keyward-auth",
            "--db-url",
            "sqlite:auth.db",
            "has-role",
            "-u",
            "alice",
            "-r",
            "admin",
        ])
        .unwrap();
        assert_eq!(args.overrides.db_url.as_deref(), Some("sqlite:auth.db"));
        assert!(matches!(
            args.command,
            AuthCommands::HasRole { ref user, password: None, .. } if user == "alice"
        ));

        let args =
            AuthArgs::try_parse_from(["keyward-auth", "list", "--format", "csv"]).unwrap();
        assert!(matches!(
            args.command,
            AuthCommands::List {
                format: OutputFormat::Csv
            }
        ));
    }

    #[test]
    fn test_resolve_config_requires_url() {
        let err = resolve_config(None, &CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("db_url"));

        let overrides = CliOverrides {
            db_url: Some("sqlite:auth.db".into()),
            ..Default::default()
        };
        let config = resolve_config(None, &overrides).unwrap();
        assert_eq!(config.auth.db_url, "sqlite:auth.db");
    }

    #[tokio::test]
    async fn test_hashed_mode_from_command_line() {
        let parse = |url: &str| {
            AuthArgs::try_parse_from([
                "keyward-auth",
                "--db-url",
                url,
                "--plain-text-password",
                "false",
                "verify",
                "-u",
                "alice",
                "-p",
                "secret",
            ])
            .unwrap()
        };

        let args = parse("postgres://keyward@127.0.0.1:1/auth");
        let config = resolve_config(args.config.as_deref(), &args.overrides).unwrap();
        assert!(!config.auth.plain_text_password);
        let handler = DatabaseHandler::new(config.auth).unwrap();
        assert!(!handler.is_plain_text_password());

        let args = parse("sqlite:auth.db");
        let config = resolve_config(args.config.as_deref(), &args.overrides).unwrap();
        assert!(matches!(
            DatabaseHandler::new(config.auth),
            Err(crate::AuthError::Unsupported(_))
        ));
    }
}
