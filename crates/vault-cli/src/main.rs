//! Secure Vault CLI - manage an encrypted credential vault from the terminal
//!
//! The master password is taken from `--password`, the `VAULT_MASTER_PASSWORD`
//! environment variable, or an interactive prompt. It is never written to disk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use uuid::Uuid;

use vault_core::{
    calculate_strength, generate_password, ConfigManager, FileStore, PasswordOptions,
    RecordFields, RecordPatch, Session, VaultRecord, VaultStore,
};

/// Secure Vault - client-side encrypted credential storage
#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(version)]
#[command(about = "Secure Vault - client-side encrypted credential storage")]
struct Cli {
    /// Directory holding the vault data and config
    #[arg(long, global = true, env = "VAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Vault user
    #[arg(long, global = true, env = "VAULT_USER", default_value = "default")]
    user: String,

    /// Master password (prompted for when absent)
    #[arg(
        long,
        global = true,
        env = "VAULT_MASTER_PASSWORD",
        hide_env_values = true,
        hide = true
    )]
    password: Option<String>,

    /// Log at info level instead of warn
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a new record
    Add(AddArgs),
    /// List all records
    List {
        /// Include passwords and notes in the output
        #[arg(long)]
        show_secrets: bool,
    },
    /// Show one record, secrets included
    Get { id: Uuid },
    /// Change fields of a record
    Update(UpdateArgs),
    /// Delete a record
    Delete { id: Uuid },
    /// Re-encrypt the vault under a new master password
    ChangePassword {
        /// New master password (prompted for when absent)
        #[arg(long, env = "VAULT_NEW_MASTER_PASSWORD", hide_env_values = true, hide = true)]
        new_password: Option<String>,
    },
    /// Generate a random password
    Generate(GenerateArgs),
    /// Score a password
    Strength {
        /// Password to score (prompted for when absent)
        #[arg(value_name = "PASSWORD")]
        candidate: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    username: String,
    /// Password to store (prompted for unless --generate is given)
    #[arg(long, conflicts_with = "generate")]
    secret: Option<String>,
    /// Store a freshly generated password
    #[arg(long)]
    generate: bool,
    #[arg(long, default_value = "")]
    url: String,
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: Uuid,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    secret: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(short, long, default_value_t = 16)]
    length: usize,
    #[arg(long)]
    no_lowercase: bool,
    #[arg(long)]
    no_uppercase: bool,
    #[arg(long)]
    no_numbers: bool,
    #[arg(long)]
    no_symbols: bool,
    /// Leave out look-alike characters such as 1, l and O
    #[arg(long)]
    exclude_similar: bool,
}

impl From<&GenerateArgs> for PasswordOptions {
    fn from(args: &GenerateArgs) -> Self {
        Self {
            length: args.length,
            lowercase: !args.no_lowercase,
            uppercase: !args.no_uppercase,
            numbers: !args.no_numbers,
            symbols: !args.no_symbols,
            exclude_similar: args.exclude_similar,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that never touch the vault
    match &cli.command {
        Command::Generate(args) => {
            let password = generate_password(&PasswordOptions::from(args))?;
            println!("{}", password);
            return Ok(());
        }
        Command::Strength { candidate } => {
            let password = match candidate {
                Some(candidate) => candidate.clone(),
                None => rpassword::prompt_password("Password to score: ")?,
            };
            let strength = calculate_strength(&password);
            println!("{} ({}/8)", strength.label, strength.score);
            return Ok(());
        }
        _ => {}
    }

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => FileStore::default_dir()?,
    };
    let storage = FileStore::with_dir(data_dir.clone())
        .with_context(|| format!("Failed to open vault data directory {:?}", data_dir))?;
    let config = ConfigManager::new(&data_dir).context("Failed to load vault config")?;
    let store = VaultStore::from_config(Arc::new(storage), config.get())?;
    debug!("Opened vault at {:?}", data_dir);

    let master_password = match cli.password {
        Some(password) => password,
        None => rpassword::prompt_password("Master password: ")?,
    };
    let session = Session::new(cli.user, master_password)?;

    match cli.command {
        Command::Add(args) => {
            let secret = if args.generate {
                generate_password(&PasswordOptions::default())?
            } else {
                match args.secret {
                    Some(secret) => secret,
                    None => rpassword::prompt_password("Record password: ")?,
                }
            };
            let fields =
                RecordFields::new(args.title, args.username, secret, args.url, args.notes);
            let record = store.create(&session, fields).await?;
            println!("{}", record.id);
        }
        Command::List { show_secrets } => {
            let records = store.read_all(&session).await?;
            if records.is_empty() {
                println!("No records for user {}", session.user_id());
            }
            for record in &records {
                print_record(record, show_secrets);
            }
        }
        Command::Get { id } => {
            let record = store.get(&session, id).await?;
            print_record(&record, true);
        }
        Command::Update(args) => {
            let mut patch = RecordPatch::default();
            if let Some(title) = args.title {
                patch = patch.title(title);
            }
            if let Some(username) = args.username {
                patch = patch.username(username);
            }
            if let Some(secret) = args.secret {
                patch = patch.password(secret);
            }
            if let Some(url) = args.url {
                patch = patch.url(url);
            }
            if let Some(notes) = args.notes {
                patch = patch.notes(notes);
            }
            if patch.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }

            let record = store.update(&session, args.id, patch).await?;
            println!("Updated {} at {}", record.id, format_time(record.updated_at));
        }
        Command::Delete { id } => {
            if store.delete(&session, id).await? {
                println!("Deleted {}", id);
            } else {
                println!("No record {}", id);
            }
        }
        Command::ChangePassword { new_password } => {
            let new_password = match new_password {
                Some(password) => password,
                None => {
                    let first = rpassword::prompt_password("New master password: ")?;
                    let second = rpassword::prompt_password("Repeat new master password: ")?;
                    if first != second {
                        bail!("Passwords do not match");
                    }
                    first
                }
            };
            store.change_master_password(&session, new_password).await?;
            info!("Master password changed for user {}", session.user_id());
            println!("Master password changed");
        }
        Command::Generate(_) | Command::Strength { .. } => {}
    }

    Ok(())
}

fn print_record(record: &VaultRecord, show_secrets: bool) {
    let fields = &record.fields;
    println!("{}  {}", record.id, fields.title);
    if !fields.username.is_empty() {
        println!("    username: {}", fields.username);
    }
    if !fields.url.is_empty() {
        println!("    url:      {}", fields.url);
    }
    if show_secrets {
        println!("    password: {}", fields.password);
        if !fields.notes.is_empty() {
            println!("    notes:    {}", fields.notes);
        }
    }
    println!("    updated:  {}", format_time(record.updated_at));
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list() {
        let cli = parse(&["vault", "--user", "alice", "list", "--show-secrets"]);
        assert_eq!(cli.user, "alice");
        assert!(matches!(cli.command, Command::List { show_secrets: true }));
    }

    #[test]
    fn test_add_secret_conflicts_with_generate() {
        let result = Cli::try_parse_from([
            "vault", "add", "--title", "GitHub", "--secret", "pw", "--generate",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(Cli::try_parse_from(["vault", "get", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_generate_options() {
        let cli = parse(&["vault", "generate", "--length", "24", "--no-symbols"]);
        let Command::Generate(args) = &cli.command else {
            panic!("expected generate");
        };
        let options = PasswordOptions::from(args);
        assert_eq!(options.length, 24);
        assert!(!options.symbols);
        assert!(options.lowercase);
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let base = ["vault", "--data-dir", data_dir, "--user", "alice", "--password", "pw"];

        let mut add = base.to_vec();
        add.extend(["add", "--title", "GitHub", "--secret", "s3cret"]);
        run(parse(&add)).await.unwrap();

        let mut list = base.to_vec();
        list.extend(["list", "--show-secrets"]);
        run(parse(&list)).await.unwrap();

        let storage = FileStore::with_dir(dir.path().to_path_buf()).unwrap();
        let store = VaultStore::new(Arc::new(storage));
        let session = Session::new("alice", "pw").unwrap();
        let records = store.read_all(&session).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.password, "s3cret");
    }
}
