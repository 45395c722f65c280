//! Formdesk CLI
//!
//! Command-line interface for the Formdesk API.
//!
//! # Usage
//!
//! ```bash
//! formdesk auth login --email ada@example.com --password '...'
//! formdesk forms create --file contact.yaml
//! formdesk fields add <form-id> --label Topic --type dropdown --option Sales --option Support
//! formdesk forms publish <form-id>
//! formdesk submissions export <form-id> -o contact.csv
//! formdesk analytics timeline --days 14 --format json
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod config;
mod output;

/// API endpoint used when neither flag, env nor config name one
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "formdesk")]
#[command(version)]
#[command(about = "Formdesk Command Line Interface", long_about = None)]
struct Cli {
    /// API endpoint URL
    #[arg(long, env = "FORMDESK_API_URL")]
    api_url: Option<String>,

    /// Bearer token (defaults to the one saved by `auth login`)
    #[arg(long, env = "FORMDESK_TOKEN")]
    token: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, register or show the current account
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Manage forms
    Forms {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Manage form fields
    Fields {
        #[command(subcommand)]
        action: FieldCommands,
    },
    /// Read, delete and export submissions
    Submissions {
        #[command(subcommand)]
        action: SubmissionCommands,
    },
    /// View analytics
    Analytics {
        #[command(subcommand)]
        action: AnalyticsCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Log in and save the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FORMDESK_PASSWORD")]
        password: String,
    },
    /// Create a client account and save the token
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FORMDESK_PASSWORD")]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the current account
    Profile,
}

#[derive(Subcommand)]
enum FormCommands {
    /// List forms
    List {
        /// Super-admin only: forms of one client
        #[arg(long)]
        client_id: Option<String>,
    },
    /// Get a form with its fields
    Get { id: String },
    /// Create a form from flags or a YAML/JSON definition
    Create {
        #[arg(long, required_unless_present = "file")]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        /// Super-admin only: owning client
        #[arg(long)]
        client_id: Option<String>,
        /// Form definition including fields
        #[arg(short, long, conflicts_with = "title")]
        file: Option<String>,
    },
    /// Start accepting submissions
    Publish { id: String },
    /// Stop accepting submissions
    Unpublish { id: String },
    /// Delete a form with its fields and submissions
    Delete { id: String },
}

#[derive(Subcommand)]
enum FieldCommands {
    /// Append a field to a form
    Add {
        form_id: String,
        #[arg(long)]
        label: String,
        /// text, dropdown, checkbox, radio or file
        #[arg(long = "type", default_value = "text")]
        field_type: String,
        #[arg(long)]
        required: bool,
        /// Choice option; repeat for several
        #[arg(long = "option")]
        options: Vec<String>,
        #[arg(long)]
        placeholder: Option<String>,
        /// Position; appended after the last field when omitted
        #[arg(long)]
        order: Option<i32>,
    },
    /// Remove a field
    Remove { form_id: String, field_id: String },
}

#[derive(Subcommand)]
enum SubmissionCommands {
    /// List submissions, optionally of one form
    List {
        #[arg(long)]
        form_id: Option<String>,
    },
    /// Get one submission
    Get { id: String },
    /// Delete one submission
    Delete { id: String },
    /// Download a form's submissions as CSV
    Export {
        form_id: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum AnalyticsCommands {
    /// Platform totals (super-admin)
    Overview,
    /// Per-client activity (super-admin)
    Clients,
    /// Statistics of one form
    Form { form_id: String },
    /// Daily submission counts
    Timeline {
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long)]
        form_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    let config = config::Config::load(profile).unwrap_or_default();
    let api_url = cli
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.into());
    let token = cli.token.or(config.token);
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(output::OutputFormat::parse))
        .unwrap_or(output::OutputFormat::Table);

    let client = commands::ApiClient::new(&api_url, token.as_deref());

    let result = match cli.command {
        Commands::Auth { action } => commands::auth::handle(action, &client, format, profile).await,
        Commands::Forms { action } => commands::forms::handle(action, &client, format).await,
        Commands::Fields { action } => commands::fields::handle(action, &client, format).await,
        Commands::Submissions { action } => commands::submissions::handle(action, &client, format).await,
        Commands::Analytics { action } => commands::analytics::handle(action, &client, format).await,
        Commands::Config { action } => commands::config::handle(action, profile).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
