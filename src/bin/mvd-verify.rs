use std::{path::PathBuf, process::ExitCode};

use anyhow::{bail, Context, Result};
use clap::Parser;
use mock_credentials_verifier::{
    config::{Config, PolicyConfig},
    core::{claims::ParticipantAgent, key::PublicKeyWrapper},
    policy::{engine::PolicyEngine, Constraint, Operator, Permission, Policy},
    verifier::{mock::MockCredentialsVerifier, CredentialsVerifier},
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "mvd-verify")]
#[command(about = "Run mock credential verification and region policy checks")]
#[command(version)]
struct Cli {
    /// Identity hub URL whose query string carries the claims
    ///
    /// Falls back to `identityHubUrl` from the configuration file.
    hub_url: Option<String>,

    /// JSON configuration file
    #[arg(short, long, env = "MVD_CONFIG")]
    config: Option<PathBuf>,

    /// Public JWK of the participant
    #[arg(long, env = "MVD_PUBLIC_JWK")]
    public_jwk: Option<String>,

    /// Region the participant must (or must not) be in
    #[arg(long)]
    region: Option<String>,

    /// Operator used to compare the region
    #[arg(long, default_value = "EQ")]
    operator: Operator,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Credentials were verified, no region check was requested.
    Verified,
    Granted,
    Denied,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Verified | Outcome::Granted => ExitCode::SUCCESS,
            Outcome::Denied => ExitCode::FAILURE,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level)?;

    run(cli).await.map(ExitCode::from)
}

async fn run(cli: Cli) -> Result<Outcome> {
    let config = cli.config.as_ref().map(Config::from_path).transpose()?;
    let hub_url = match (&cli.hub_url, &config) {
        (Some(url), _) => url.clone(),
        (None, Some(config)) => config.identity_hub_url.to_string(),
        (None, None) => bail!("no identity hub url given and no configuration file"),
    };
    let public_key = match &cli.public_jwk {
        Some(jwk) => PublicKeyWrapper::from_jwk_str(jwk)?,
        None => {
            warn!("No public JWK given, using an ephemeral key");
            p256::SecretKey::random(&mut rand::rngs::OsRng)
                .public_key()
                .into()
        }
    };

    let claims = MockCredentialsVerifier::new()
        .verify_credentials(&hub_url, &public_key)
        .await
        .context("credential verification failed")?;
    println!("{}", serde_json::to_string_pretty(&claims)?);

    let Some(region) = cli.region else {
        return Ok(Outcome::Verified);
    };

    let PolicyConfig { region_key } = config.map(|c| c.policy).unwrap_or_default();
    let policy = Policy::default().with_permission(
        Permission::default()
            .with_action("USE")
            .with_constraint(Constraint::atomic(&region_key, cli.operator, region)),
    );

    match PolicyEngine::with_region_key(&region_key)
        .evaluate(&policy, &ParticipantAgent::from_claims(claims))
    {
        Ok(()) => {
            info!("Access granted");
            Ok(Outcome::Granted)
        }
        Err(e) => {
            warn!("Access denied: {e}");
            Ok(Outcome::Denied)
        }
    }
}

fn setup_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("invalid log level")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
