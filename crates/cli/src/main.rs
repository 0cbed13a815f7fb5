use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use facturacion_kernel::{Secret, Settings};

#[derive(Debug, Parser)]
#[command(
    name = "facturacion-cli",
    version,
    about = "Check that the facturacion database is reachable"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the driver and open one connection (default)
    Probe(ProbeArgs),
}

#[derive(Debug, Args)]
struct ProbeArgs {
    /// Driver identifier, e.g. `mysql` or `com.mysql.cj.jdbc.Driver`
    #[arg(long)]
    driver: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    username: Option<String>,

    /// Read the password from this environment variable
    #[arg(long, value_name = "VAR")]
    password_env: Option<String>,

    /// Give up opening the connection after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Run this many independent probes in sequence
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,

    /// Exit with status 1 unless every probe connected
    #[arg(long)]
    strict: bool,
}

impl Default for ProbeArgs {
    fn default() -> Self {
        Self {
            driver: None,
            host: None,
            port: None,
            database: None,
            username: None,
            password_env: None,
            timeout_ms: None,
            repeat: 1,
            strict: false,
        }
    }
}

impl ProbeArgs {
    fn apply(&self, settings: &mut Settings) -> anyhow::Result<()> {
        let database = &mut settings.database;
        if let Some(driver) = &self.driver {
            database.driver = driver.clone();
        }
        if let Some(host) = &self.host {
            database.host = host.clone();
        }
        if let Some(port) = self.port {
            database.port = port;
        }
        if let Some(name) = &self.database {
            database.name = name.clone();
        }
        if let Some(username) = &self.username {
            database.username = username.clone();
        }
        if let Some(var) = &self.password_env {
            let password = std::env::var(var)
                .with_context(|| format!("password variable '{}' is not set", var))?;
            database.password = Secret::new(password);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            database.connect_timeout_ms = Some(timeout_ms);
        }
        Ok(())
    }
}

async fn probe(args: ProbeArgs) -> anyhow::Result<ExitCode> {
    let settings = facturacion_app::bootstrap_with(|settings| args.apply(settings))?;
    let probe = facturacion_app::build_probe(&settings);

    let mut stdout = std::io::stdout().lock();
    let mut failures = 0u32;
    for attempt in 1..=args.repeat {
        let outcome = probe.probe(&mut stdout).await;
        tracing::info!(attempt, ?outcome, "probe finished");
        if !outcome.is_connected() {
            failures += 1;
        }
    }
    stdout.flush().ok();

    if args.strict && failures > 0 {
        tracing::warn!(failures, attempts = args.repeat, "strict mode: probe failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Probe(args)) => probe(args).await,
        None => probe(ProbeArgs::default()).await,
    }
}
