//! Solary Wallet CLI
//!
//! Creates, unlocks and backs up the wallet stored in the user's data
//! directory. Passwords come from the environment or an interactive prompt.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use solary_core::crypto::ensure_randomness_available;
use solary_core::storage::default_data_dir;
use solary_core::{SettingsManager, Wallet, WalletState};

const NOT_INITIALIZED: &str =
    "Wallet not initialized. Run `solary create` or `solary import` first.";

/// Solary Wallet - Solana key management
#[derive(Parser, Debug)]
#[command(name = "solary")]
#[command(version)]
#[command(about = "Solary Wallet - recovery phrases, accounts and encrypted backups")]
struct Args {
    /// Wallet data directory (defaults to the platform data dir)
    #[arg(long, env = "SOLARY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Wallet password (prompted for when absent)
    #[arg(long, env = "SOLARY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new wallet and print its recovery phrase
    Create,
    /// Import a wallet from a 12-word recovery phrase
    Import,
    /// List all accounts
    Accounts,
    /// Derive the next account
    AddAccount {
        /// Display name (defaults to "Account N")
        #[arg(long)]
        name: Option<String>,
    },
    /// Rename an account
    RenameAccount { index: u32, name: String },
    /// Write an encrypted backup of all accounts
    Export {
        /// Output file (stdout when absent)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Password protecting the backup
        #[arg(long, env = "SOLARY_BACKUP_PASSWORD", hide_env_values = true)]
        backup_password: Option<String>,
    },
    /// Restore a wallet from an encrypted backup file
    Restore {
        file: PathBuf,
        /// Password the backup was exported with
        #[arg(long, env = "SOLARY_BACKUP_PASSWORD", hide_env_values = true)]
        backup_password: Option<String>,
    },
    /// Change the wallet password
    ChangePassword {
        #[arg(long, env = "SOLARY_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
    /// Show settings, optionally changing the auto-lock timeout
    Settings {
        /// Minutes of inactivity before the wallet locks (0 = never)
        #[arg(long)]
        auto_lock_minutes: Option<u32>,
    },
    /// Delete the wallet vault (irreversible without the phrase or a backup)
    Reset {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for phrases and backups
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    info!("Using data directory {:?}", data_dir);

    ensure_randomness_available().map_err(|e| format!("Cannot create keys safely: {}", e))?;

    let mut wallet = Wallet::open_dir(&data_dir)
        .await
        .map_err(|e| format!("Failed to open wallet: {}", e))?;

    match args.command {
        Command::Create => {
            let password = new_password(args.password, "New wallet password: ")?;
            let mnemonic = wallet.create(&password).await?;

            println!("Address: {}", wallet.primary_address()?);
            println!();
            println!("Write down your recovery phrase and keep it offline:");
            println!("{}", mnemonic.phrase());
        }
        Command::Import => {
            let phrase = rpassword::prompt_password("Recovery phrase: ")?;
            let password = new_password(args.password, "New wallet password: ")?;
            let account = wallet.import(&phrase, &password).await?;

            println!("Imported {}", account.public_key());
        }
        Command::Accounts => {
            unlock(&mut wallet, args.password).await?;

            for account in wallet.accounts()? {
                println!(
                    "{:>3}  {:<20}  {}",
                    account.derivation_index(),
                    account.name,
                    account.public_key()
                );
            }
        }
        Command::AddAccount { name } => {
            unlock(&mut wallet, args.password).await?;
            let account = wallet.add_account(name.as_deref()).await?;

            println!(
                "{}  {}  {}",
                account.derivation_index(),
                account.name,
                account.public_key()
            );
        }
        Command::RenameAccount { index, name } => {
            unlock(&mut wallet, args.password).await?;
            wallet.rename_account(index, &name).await?;

            println!("Account {} renamed to {}", index, name);
        }
        Command::Export {
            out,
            backup_password,
        } => {
            unlock(&mut wallet, args.password).await?;
            let backup_password = new_password(backup_password, "Backup password: ")?;
            let blob = wallet.export_backup(&backup_password).await?;

            match out {
                Some(path) => {
                    tokio::fs::write(&path, &blob).await?;
                    eprintln!("Backup written to {}", path.display());
                }
                None => println!("{}", blob),
            }
        }
        Command::Restore {
            file,
            backup_password,
        } => {
            let blob = tokio::fs::read_to_string(&file).await?;
            let backup_password = password_or_prompt(backup_password, "Backup password: ")?;
            let password = new_password(args.password, "New wallet password: ")?;
            let primary = wallet
                .restore_backup(blob.trim(), &backup_password, &password)
                .await?;

            println!(
                "Restored {} ({} accounts)",
                primary.public_key(),
                wallet.accounts()?.len()
            );
        }
        Command::ChangePassword { new_password: next } => {
            if wallet.state() == WalletState::NotInitialized {
                return Err(NOT_INITIALIZED.into());
            }
            let old = password_or_prompt(args.password, "Current password: ")?;
            let next = new_password(next, "New password: ")?;
            wallet.change_password(&old, &next).await?;

            println!("Password changed");
        }
        Command::Settings { auto_lock_minutes } => {
            let mut manager = SettingsManager::new(&data_dir);
            if let Some(minutes) = auto_lock_minutes {
                let mut settings = wallet.settings().clone();
                settings.auto_lock_timeout_minutes = minutes;
                wallet.update_settings(&mut manager, settings).await?;
            }

            println!("{}", serde_json::to_string_pretty(wallet.settings())?);
        }
        Command::Reset { yes } => {
            if !yes {
                return Err("Refusing to delete the wallet without --yes".into());
            }
            wallet.reset().await?;

            println!("Wallet deleted");
        }
    }

    wallet.lock().await?;
    Ok(())
}

async fn unlock(
    wallet: &mut Wallet,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if wallet.state() == WalletState::NotInitialized {
        return Err(NOT_INITIALIZED.into());
    }

    let password = password_or_prompt(password, "Wallet password: ")?;
    wallet
        .unlock(&password)
        .await
        .map_err(|e| format!("Failed to unlock wallet: {}", e))?;

    info!("Wallet unlocked via password");
    Ok(())
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> std::io::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password(prompt),
    }
}

/// Like [`password_or_prompt`], but interactive entry must be typed twice
fn new_password(
    password: Option<String>,
    prompt: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(password) = password {
        return Ok(password);
    }

    let first = rpassword::prompt_password(prompt)?;
    let second = rpassword::prompt_password("Confirm password: ")?;
    if first != second {
        return Err("Passwords do not match".into());
    }
    if first.is_empty() {
        return Err("Password must not be empty".into());
    }
    Ok(first)
}
