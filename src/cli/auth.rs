//! Account and login CLI commands

use clap::Subcommand;

use crate::config::paths::FintrackPaths;
use crate::config::settings::Settings;
use crate::error::{FintrackError, FintrackResult};
use crate::services::{AuthService, RegisterInput, UserService};
use crate::storage::Storage;

use super::session::{clear_session, load_token, require_user, save_session};
use super::{read_password, PASSWORD_ENV};

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create a new account
    Register {
        /// Username (3-32 characters: letters, digits, '_', '-', '.')
        username: String,
        /// Email address
        #[arg(short, long)]
        email: String,
        /// Display name (defaults to the username)
        #[arg(short = 'n', long)]
        name: Option<String>,
        /// Password; prompted for when not given
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Log in and remember the session
    Login {
        /// Username or email
        identifier: String,
        /// Password; prompted for when not given
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out of this session
    Logout {
        /// End every session of the account, not just this one
        #[arg(long)]
        all: bool,
    },

    /// Show the logged-in account
    Whoami,

    /// Change the password (other sessions are signed out)
    Passwd {
        /// Current password; prompted for when not given
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
        /// New password; prompted for when not given
        #[arg(long, env = "FINTRACK_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },

    /// Change display name or email
    Profile {
        #[arg(short = 'n', long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Delete the account and all of its data
    DeleteAccount {
        /// Required to confirm
        #[arg(long)]
        yes: bool,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
}

/// Handle an auth command
pub fn handle_auth_command(
    storage: &Storage,
    settings: &Settings,
    paths: &FintrackPaths,
    cmd: AuthCommands,
) -> FintrackResult<()> {
    let auth = AuthService::new(storage, settings);

    match cmd {
        AuthCommands::Register {
            username,
            email,
            name,
            password,
        } => {
            let password = match password {
                Some(p) => p.into(),
                None => {
                    let first = read_password("Password: ", None)?;
                    let second = read_password("Confirm password: ", None)?;
                    if first.as_str() != second.as_str() {
                        return Err(FintrackError::Validation("Passwords do not match".into()));
                    }
                    first
                }
            };

            let user = auth.register(RegisterInput {
                username,
                email,
                display_name: name,
                password,
            })?;
            println!("Registered '{}' ({})", user.username, user.id);
            println!("Run 'fintrack auth login {}' to start.", user.username);
        }

        AuthCommands::Login {
            identifier,
            password,
        } => {
            let password = read_password("Password: ", password)?;
            let outcome = auth.login(&identifier, &password)?;
            save_session(paths, &outcome.user.username, &outcome.token)?;
            println!(
                "Logged in as {} (session valid until {})",
                outcome.user.name(),
                outcome.session.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }

        AuthCommands::Logout { all } => {
            if all {
                let user = require_user(storage, settings, paths)?;
                let ended = auth.logout_all(user.id)?;
                println!("Ended {} session(s)", ended);
            } else if let Some(token) = load_token(paths)? {
                auth.logout(&token)?;
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
            clear_session(paths)?;
        }

        AuthCommands::Whoami => {
            let user = require_user(storage, settings, paths)?;
            println!("{} <{}>", user.name(), user.email);
            println!("  Username: {}", user.username);
            println!("  ID:       {}", user.id.as_uuid());
            match storage.families.find_by_member(user.id)? {
                Some(family) if family.is_head(user.id) => {
                    println!("  Family:   {} (head)", family.name)
                }
                Some(family) => println!("  Family:   {}", family.name),
                None => println!("  Family:   -"),
            }
        }

        AuthCommands::Passwd {
            password,
            new_password,
        } => {
            let user = require_user(storage, settings, paths)?;
            let current = read_password("Current password: ", password)?;
            let new = read_password("New password: ", new_password)?;
            let token = load_token(paths)?;
            auth.change_password(user.id, &current, &new, token.as_deref())?;
            println!("Password changed; other sessions were signed out");
        }

        AuthCommands::Profile { name, email } => {
            let user = require_user(storage, settings, paths)?;
            if name.is_none() && email.is_none() {
                return Err(FintrackError::Validation(
                    "Nothing to change; pass --name or --email".into(),
                ));
            }
            let user = UserService::new(storage).update_profile(
                user.id,
                name.as_deref(),
                email.as_deref(),
            )?;
            println!("Profile updated: {} <{}>", user.name(), user.email);
        }

        AuthCommands::DeleteAccount { yes, password } => {
            let user = require_user(storage, settings, paths)?;
            if !yes {
                return Err(FintrackError::Validation(
                    "This deletes every record of the account; re-run with --yes".into(),
                ));
            }
            let password = read_password("Password: ", password)?;
            UserService::new(storage).delete_account(user.id, &password)?;
            clear_session(paths)?;
            println!("Account '{}' deleted", user.username);
        }
    }

    Ok(())
}
