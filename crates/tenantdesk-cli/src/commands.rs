use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use tenantdesk_core::{
    AuthError, Config, Credentials, Navigator, Redirect, RouteGuard, SessionManager, SessionRecord,
    SessionState,
};

pub const USAGE: &str = "\
Usage: tenantdesk <command>

Commands:
  login [email]      Sign in with email and password
  callback <url>     Complete an external-provider sign-in from its redirect URL
  logout             Sign out and forget the stored session
  status             Show the current session without contacting the server
  token              Print a valid access token, refreshing it if needed
  guard [role...]    Check access to a protected route needing any of the roles
  help               Show this message";

/// Path the CLI guard pretends to protect.
const GUARDED_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Option<String>),
    Callback(String),
    Logout,
    Status,
    Token,
    Guard(Vec<String>),
    Help,
}

impl Command {
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let Some(name) = args.next() else {
            return Ok(Command::Help);
        };
        let rest: Vec<String> = args.collect();

        let no_args = |command: Command| {
            if rest.is_empty() {
                Ok(command)
            } else {
                Err(format!("'{}' takes no arguments", name))
            }
        };

        match name.as_str() {
            "login" => match rest.as_slice() {
                [] => Ok(Command::Login(None)),
                [email] => Ok(Command::Login(Some(email.clone()))),
                _ => Err("'login' takes at most one email".to_string()),
            },
            "callback" => match rest.as_slice() {
                [url] => Ok(Command::Callback(url.clone())),
                _ => Err("'callback' needs exactly one URL".to_string()),
            },
            "logout" => no_args(Command::Logout),
            "status" => no_args(Command::Status),
            "token" => no_args(Command::Token),
            "guard" => Ok(Command::Guard(rest)),
            "help" | "-h" | "--help" => Ok(Command::Help),
            other => Err(format!("Unknown command '{}'", other)),
        }
    }
}

/// Navigator for a terminal: there is nowhere to go, so say where we would go.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, redirect: &Redirect) {
        match redirect {
            Redirect::SignIn { location } => {
                println!("Not signed in. Redirecting to {} (run 'tenantdesk login').", location)
            }
            Redirect::NotAuthorized { location } => {
                println!("Access denied. Redirecting to {}.", location)
            }
        }
    }
}

pub async fn run(command: Command, manager: &SessionManager, config: &mut Config) -> Result<ExitCode> {
    match command {
        Command::Login(email) => login(manager, config, email).await,
        Command::Callback(url) => match manager.login_with_callback(&url).await {
            Ok(record) => {
                println!("Signed in as {}.", record.display_name());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                println!("Sign-in failed: {}", e);
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Logout => {
            manager.logout();
            println!("Signed out.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            print_status(manager);
            Ok(ExitCode::SUCCESS)
        }
        Command::Token => match manager.get_or_refresh_token().await {
            Ok(record) => {
                println!("{}", record.tokens.access_token);
                Ok(ExitCode::SUCCESS)
            }
            Err(AuthError::NoSession) => {
                println!("Not signed in. Run 'tenantdesk login'.");
                Ok(ExitCode::FAILURE)
            }
            Err(e) => {
                warn!(error = %e, "Could not obtain a valid token");
                println!("Your session has expired. Run 'tenantdesk login' to sign in again.");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Guard(roles) => {
            let guard = roles
                .into_iter()
                .fold(RouteGuard::new(GUARDED_PATH), |guard, role| guard.require_role(role));
            match guard.enforce(manager, &TerminalNavigator).await {
                Some(record) => {
                    println!("Access granted to {} for {}.", guard.path(), record.display_name());
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(ExitCode::FAILURE),
            }
        }
        Command::Help => {
            println!("{}", USAGE);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn login(manager: &SessionManager, config: &mut Config, email: Option<String>) -> Result<ExitCode> {
    let email = match email {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    if email.is_empty() {
        println!("Email required.");
        return Ok(ExitCode::FAILURE);
    }
    let password = rpassword::prompt_password("Password: ")?;

    match manager.login(&Credentials::new(email.clone(), password)).await {
        Ok(record) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Signed in as {}.", record.display_name());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("Sign-in failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last_email) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

fn print_status(manager: &SessionManager) {
    let state = manager.state();
    println!("State: {}", state);
    if state == SessionState::Anonymous {
        return;
    }
    if let Some(record) = manager.current() {
        print_record(&record);
    }
}

fn print_record(record: &SessionRecord) {
    println!("User:  {} ({})", record.display_name(), record.user.id);
    if let Some(tenant) = &record.user.tenant_id {
        println!("Tenant: {}", tenant);
    }
    if !record.user.roles.is_empty() {
        println!("Roles: {}", record.user.roles.join(", "));
    }
    match record.expires_at() {
        Ok(expires_at) => {
            let remaining = record.seconds_until_expiry(Utc::now().timestamp());
            let when = DateTime::<Utc>::from_timestamp(expires_at, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| expires_at.to_string());
            if remaining > 0 {
                println!("Token: expires {} ({}m left)", when, remaining / 60);
            } else {
                println!("Token: expired {} (will refresh on next use)", when);
            }
        }
        Err(e) => println!("Token: unreadable ({})", e),
    }
}
