use clap::{Parser, Subcommand};
use optimum_support_rs::config::{CheckerConfig, ServerConfig, SnapshotSource};
use optimum_support_rs::hub::{DEFAULT_ENDPOINT, HttpHub, HubConfig};
use optimum_support_rs::logging::init_logging;
use optimum_support_rs::server::{self, AppState};
use optimum_support_rs::snapshot::{CompatibilitySnapshot, DEFAULT_REPO_URL};
use optimum_support_rs::sync::SyncPolicy;
use optimum_support_rs::version::Version;
use optimum_support_rs::ModelSupportChecker;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "optimum-support",
    version,
    about = "Check if a model is supported by optimum-intel[openvino]",
    subcommand_negates_reqs = true
)]
struct Cli {
    /// Hugging Face model id, e.g. openai/whisper-small
    #[arg(required = true)]
    model_id: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web form
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 7860)]
        port: u16,
    },
    /// Print the active compatibility snapshot as JSON
    Snapshot {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List supported architectures for one transformers version, or for
    /// all probed versions combined
    Architectures {
        #[arg(long)]
        transformers_version: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// Scan this optimum-intel checkout instead of the vendored snapshot
    #[arg(long, global = true, env = "OPTIMUM_INTEL_CHECKOUT")]
    checkout: Option<PathBuf>,

    #[arg(long, global = true, default_value = DEFAULT_REPO_URL)]
    repo_url: String,

    /// Do not clone or pull the checkout before scanning it
    #[arg(long, global = true)]
    no_sync: bool,

    /// What to do when the checkout cannot be refreshed
    #[arg(long, global = true, value_enum, default_value_t = SyncPolicy::Warn)]
    sync_policy: SyncPolicy,

    #[arg(long, global = true, env = "HF_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    hub_endpoint: String,

    #[arg(long, global = true, env = "HF_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Hub request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// trace, debug, info, warn, error or off
    #[arg(long, global = true, default_value = "info", value_parser = parse_level)]
    log_level: log::LevelFilter,
}

impl GlobalArgs {
    fn config(&self, server: ServerConfig) -> CheckerConfig {
        let source = match &self.checkout {
            Some(dir) => SnapshotSource::Checkout {
                dir: dir.clone(),
                repo_url: self.repo_url.clone(),
                sync: !self.no_sync,
                policy: self.sync_policy,
            },
            None => SnapshotSource::Vendored,
        };
        CheckerConfig {
            source,
            hub: HubConfig {
                endpoint: self.hub_endpoint.clone(),
                token: self.token.clone(),
                timeout_secs: self.timeout,
            },
            server,
        }
    }
}

fn parse_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("invalid log level '{}'", s))
}

fn build_checker(
    config: &CheckerConfig,
    snapshot: Arc<CompatibilitySnapshot>,
) -> anyhow::Result<ModelSupportChecker<HttpHub>> {
    Ok(ModelSupportChecker::new(HttpHub::new(&config.hub)?, snapshot))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.log_level);

    let server_config = match &cli.command {
        Some(Command::Serve { host, port }) => ServerConfig {
            host: host.clone(),
            port: *port,
        },
        _ => ServerConfig::default(),
    };
    let config = cli.global.config(server_config);
    config.validate()?;
    let snapshot = Arc::new(config.source.load()?);

    match cli.command {
        Some(Command::Serve { .. }) => {
            let app_state = AppState::new(build_checker(&config, snapshot)?);
            actix_web::rt::System::new().block_on(server::startup(config.server, app_state))?;
        }
        Some(Command::Snapshot { output }) => {
            let json = snapshot.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json + "\n")?;
                    log::info!("Wrote snapshot to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Some(Command::Architectures {
            transformers_version,
        }) => {
            let architectures = match transformers_version {
                Some(version) => snapshot.resolve_architectures(&version.parse::<Version>()?),
                None => snapshot.aggregate().architectures,
            };
            for arch in architectures {
                println!("{}", arch);
            }
        }
        None => {
            let model_id = cli
                .model_id
                .ok_or_else(|| anyhow::anyhow!("a model id is required"))?;
            let checker = build_checker(&config, snapshot)?;
            let classification =
                actix_web::rt::System::new().block_on(checker.check(&model_id))?;
            println!("{}", classification);
        }
    }
    Ok(())
}
