mod common;
mod mail;
mod ui;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;

use crate::common::config::{ConfigSource, MailConfig};
use crate::common::privileges::require_root;
use crate::common::runner::SystemRunner;
use crate::mail::{AccountManager, MAILDIR_MODE, PasswordHasher, TerminalPrompter};
use crate::ui::prelude::*;

const EXAMPLES: &str = "\
Examples:
    sudo mail-mgmt create --user john@example.com
    sudo mail-mgmt create --user john@example.com --password 'SecurePass123'
    sudo mail-mgmt delete --user john@example.com --yes
    sudo mail-mgmt passwd --user john@example.com

Account commands must be run as root and need doveadm from Dovecot.";

/// Manage Dovecot virtual mail users
#[derive(Parser, Debug)]
#[command(name = "mail-mgmt", author, version, about, long_about = None, after_help = EXAMPLES)]
struct Cli {
    /// Configuration file (defaults to /etc/mail-mgmt/config.toml when present)
    #[arg(short, long, global = true, env = "MAIL_MGMT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print external commands and other debug details
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for status lines
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new mail user
    Create {
        /// Email address (user@domain)
        #[arg(short, long)]
        user: String,
        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Delete an existing mail user and their Maildir
    Delete {
        /// Email address (user@domain)
        #[arg(short, long)]
        user: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Change a user's password
    #[command(alias = "passwd")]
    ChangePassword {
        /// Email address (user@domain)
        #[arg(short, long)]
        user: String,
        /// Current password (prompted for when omitted)
        #[arg(long)]
        old_password: Option<String>,
        /// New password (prompted for when omitted)
        #[arg(long)]
        new_password: Option<String>,
    },

    /// Show version and the effective configuration
    Version,
}

impl Commands {
    fn needs_root(&self) -> bool {
        !matches!(self, Commands::Version)
    }

    fn needs_hasher(&self) -> bool {
        matches!(self, Commands::Create { .. } | Commands::ChangePassword { .. })
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too and are not failures
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let color = !cli.no_color && std::io::stdout().is_terminal();
    if !color {
        colored::control::set_override(false);
    }
    ui::init(cli.output, color);
    ui::set_debug_mode(cli.debug);

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return;
    };

    if let Err(err) = run(cli.config, command) {
        emit(Level::Error, "mail.error", &format!("{err:#}"), None);
        std::process::exit(1);
    }
}

fn run(config_path: Option<PathBuf>, command: Commands) -> Result<()> {
    if command.needs_root() {
        require_root()?;
    }

    let (config, source) = MailConfig::load(config_path.as_deref())?;
    emit(
        Level::Debug,
        "mail.config",
        &format!("Using configuration from {source}"),
        None,
    );

    let runner = SystemRunner;
    let prompter = TerminalPrompter;

    if command.needs_hasher() {
        PasswordHasher::new(&config.doveadm_cmd, &config.hash_scheme, &runner)
            .ensure_available()?;
    }

    let manager = AccountManager::new(&config, &runner, &prompter);
    match command {
        Commands::Create { user, password } => manager.create(&user, password),
        // A cancelled delete is still a clean exit
        Commands::Delete { user, yes } => manager.delete(&user, yes).map(|_| ()),
        Commands::ChangePassword {
            user,
            old_password,
            new_password,
        } => manager.change_password(&user, old_password, new_password),
        Commands::Version => {
            print_version(&config, &source);
            Ok(())
        }
    }
}

fn print_version(config: &MailConfig, source: &ConfigSource) {
    let version = env!("CARGO_PKG_VERSION");

    if get_output_format() == OutputFormat::Json {
        emit(
            Level::Info,
            "mail.version",
            &format!("mail-mgmt v{version}"),
            Some(serde_json::json!({
                "version": version,
                "config_source": source.to_string(),
                "config": config,
                "maildir_mode": format!("{MAILDIR_MODE:04o}"),
            })),
        );
        return;
    }

    println!("{} v{}", "Mail User Management Tool".bold(), version);
    println!("Built for Dovecot mail server administration");
    println!();
    println!("Configuration ({source}):");

    let mut entries = config.entries();
    entries.push(("maildir_mode", format!("{MAILDIR_MODE:04o}")));
    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0) + 1;
    for (name, value) in entries {
        println!("  {:<width$} {}", format!("{name}:"), value.cyan(), width = width);
    }
}
