use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use devserve::config::{self, Config, Overrides};
use devserve::error::StartupError;
use devserve::handler::{Handler, ServeOptions, StaticDirResolver};
use devserve::logger::{self, GlobalSink};
use devserve::server::{self, ServerLoopConfig};

/// Local development file server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file path (without extension)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Host to bind (default: localhost)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (default: 8000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory to serve (default: the directory of this executable)
    #[arg(short, long)]
    root: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_startup_failure(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StartupError> {
    let overrides = Overrides {
        host: cli.host,
        port: cli.port,
        root: cli.root.map(|p| p.to_string_lossy().into_owned()),
    };
    let cfg = Config::load_from(&cli.config, &overrides)?;
    logger::init(&cfg).map_err(StartupError::Logger)?;

    let root = cfg.served_directory()?;

    // One thread, one connection at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(cfg, root))
}

async fn async_main(cfg: Config, root: PathBuf) -> Result<(), StartupError> {
    logger::log_root_directory(&root);
    if cfg.logging.list_files {
        logger::log_served_files(&server::list_served_files(&root));
    }

    let addr = cfg.get_socket_addr()?;
    let listener = server::bind_listener(addr)?;
    logger::log_server_start(&cfg);

    let options = ServeOptions::from_config(&cfg, Arc::new(GlobalSink));
    let handler = Arc::new(Handler::new(StaticDirResolver::new(root), options));

    server::start_server_loop(
        listener,
        handler,
        ServerLoopConfig::from_secs(cfg.performance.connection_timeout),
        server::shutdown_signal(),
    )
    .await;

    Ok(())
}
