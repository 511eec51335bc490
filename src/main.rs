use std::path::PathBuf;
use std::process::{Command, ExitCode};

use chrono::Utc;
use clap::{Parser, Subcommand};

use pki_totp::codelog;
use pki_totp::config::{Config, KeyUsage};
use pki_totp::error::{PkiError, Result};
use pki_totp::server::{self, AppState};

#[derive(Parser)]
#[command(name = "pki-totp")]
#[command(about = "RSA-wrapped TOTP seeds, one-time codes and signed commit attestations")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "PKI_TOTP_BIND", default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Unwrap a base64 RSA-OAEP seed envelope and store it
    DecryptSeed {
        /// Base64 ciphertext
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        encrypted_seed: Option<String>,
        /// Read the base64 ciphertext from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Print the current code
    Generate,
    /// Check a code against the stored seed
    Verify { code: String },
    /// Sign a commit id and seal the signature for the counterparty
    Prove {
        /// 40-character commit hash; defaults to `git log -1`
        commit: Option<String>,
    },
    /// Append the current code to the code log (run once a minute)
    LogCode,
    /// Print an otpauth:// provisioning URI for the stored seed
    Uri {
        #[arg(long, default_value = "pki-totp")]
        issuer: String,
        #[arg(long, default_value = "student")]
        account: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pki_totp=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {e}");
            match e {
                PkiError::MissingCode | PkiError::InvalidCommitId | PkiError::Config(_) => {
                    ExitCode::from(2)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.config;

    match cli.command {
        Commands::Serve { bind } => {
            let service = config.build_service(KeyUsage::Own)?;
            let state = AppState {
                service,
                code_log: config.code_log.clone(),
            };
            server::serve(state, &bind).await?;
        }
        Commands::DecryptSeed {
            encrypted_seed,
            file,
        } => {
            let encrypted_seed = match (encrypted_seed, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => return Err(PkiError::Config("no encrypted seed given".into())),
            };
            let service = config.build_service(KeyUsage::Own)?;
            service.unwrap_seed(&encrypted_seed)?;
            if cli.json {
                println!("{}", serde_json::json!({ "status": "ok" }));
            } else {
                println!("Seed stored at {}", config.seed_path.display());
            }
        }
        Commands::Generate => {
            let generated = config.build_service(KeyUsage::None)?.generate_code()?;
            if cli.json {
                println!("{}", to_json(&generated)?);
            } else {
                println!("{} (valid for {}s)", generated.code, generated.valid_for);
            }
        }
        Commands::Verify { code } => {
            let valid = config.build_service(KeyUsage::None)?.verify_code(&code)?;
            if cli.json {
                println!("{}", serde_json::json!({ "valid": valid }));
            } else {
                println!("{}", if valid { "valid" } else { "invalid" });
            }
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Prove { commit } => {
            let commit = match commit {
                Some(commit) => commit,
                None => head_commit()?,
            };
            let service = config.build_service(KeyUsage::OwnAndCounterparty)?;
            let attestation = service.produce_attestation(&commit)?;
            if cli.json {
                println!("{}", to_json(&attestation)?);
            } else {
                println!("Commit Hash: {}", attestation.commit_id);
                println!("Encrypted Signature: {}", attestation.encrypted_signature);
            }
        }
        Commands::LogCode => {
            let generated = config.build_service(KeyUsage::None)?.generate_code()?;
            let line = codelog::append_code(&config.code_log, &generated.code, Utc::now())?;
            println!("{line}");
        }
        Commands::Uri { issuer, account } => {
            let uri = config
                .build_service(KeyUsage::None)?
                .provisioning_uri(&issuer, &account)?;
            println!("{uri}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn to_json(value: &impl serde::Serialize) -> Result<String> {
    serde_json::to_string(value).map_err(|e| PkiError::Encoding(e.to_string()))
}

/// Hash of `HEAD` in the current git repository.
fn head_commit() -> Result<String> {
    let output = Command::new("git")
        .args(["log", "-1", "--format=%H"])
        .output()?;
    if !output.status.success() {
        return Err(PkiError::Config(format!(
            "git log failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}
