//! Deploys a demo annotated endpoint and a demo programmatic endpoint into an
//! in-memory router, then reports the mappings and the effective policy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wsmount_core::{
    BindingSet, Endpoint, EndpointConfig, HandlerClass, MethodDecl, ParamKind, ServerEndpoint,
    Session, UpgradeRequest,
};
use wsmount_server::{ContainerConfig, EndpointRouter, MappedRouter, ServerContainer};

#[derive(Parser, Debug)]
#[command(name = "deploy-check", about = "Deploy demo websocket endpoints and report the result")]
struct Args {
    /// JSON container config file.
    #[arg(long, env = "WSMOUNT_CONFIG")]
    config: Option<PathBuf>,
    /// Mount path of the annotated echo endpoint.
    #[arg(long, env = "WSMOUNT_ECHO_PATH", default_value = "/echo")]
    echo_path: String,
    /// Mount path of the programmatic heartbeat endpoint.
    #[arg(long, env = "WSMOUNT_HEARTBEAT_PATH", default_value = "/heartbeat")]
    heartbeat_path: String,
    /// Overrides both text and binary message size limits, in bytes.
    #[arg(long, env = "WSMOUNT_MAX_MESSAGE_SIZE")]
    max_message_size: Option<usize>,
    /// Overrides the session idle timeout, in milliseconds.
    #[arg(long, env = "WSMOUNT_IDLE_TIMEOUT_MS")]
    idle_timeout_ms: Option<u64>,
    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,
}

#[derive(Default)]
struct Echo;

#[derive(Default)]
struct Heartbeat {
    beats: u64,
}

impl Endpoint for Heartbeat {
    fn on_open(&mut self, session: &Session, _config: &EndpointConfig) {
        self.beats += 1;
        info!(session = %session.id, beats = self.beats, "heartbeat opened");
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ContainerConfig::from_file(path)?,
        None => ContainerConfig::default(),
    };

    let router = Arc::new(MappedRouter::new());
    let container =
        ServerContainer::with_config(Arc::clone(&router) as Arc<dyn EndpointRouter>, &config)?;
    if let Some(size) = args.max_message_size {
        container.set_default_max_text_message_buffer_size(size)?;
        container.set_default_max_binary_message_buffer_size(size)?;
    }
    if let Some(ms) = args.idle_timeout_ms {
        container.set_default_max_session_idle_timeout(Duration::from_millis(ms))?;
    }
    container.start();

    let echo = Arc::new(
        HandlerClass::of::<Echo>()
            .with_marker(ServerEndpoint::new(args.echo_path.as_str()))
            .with_method(MethodDecl::on_open("opened", [ParamKind::Session]))
            .with_method(MethodDecl::on_message("echo", [ParamKind::Session, ParamKind::Text])),
    );
    container.add_endpoint_class(&echo)?;

    let heartbeat = Arc::new(HandlerClass::programmatic::<Heartbeat>());
    container.add_endpoint_config(EndpointConfig::new(heartbeat, args.heartbeat_path.as_str()))?;

    for path in router.paths() {
        let Some(factory) = router.factory(&path) else {
            continue;
        };
        let mut instance = factory.create(&UpgradeRequest::new(path.as_str()))?;
        info!(
            path = %path,
            variant = ?instance.metadata.variant(),
            bindings = instance.metadata.bindings().map_or(0, BindingSet::len),
            "mapped endpoint"
        );
        let session = Session {
            id: instance.id.to_string(),
            path: path.clone(),
            path_params: BTreeMap::new(),
            subprotocol: instance.config.subprotocols.first().cloned(),
        };
        let config = instance.config.clone();
        if let Some(endpoint) = instance.endpoint_mut() {
            endpoint.on_open(&session, &config);
        }
    }

    let policy = container.policy();
    let policy = policy.read();
    info!(
        async_write_timeout_ms = policy.async_write_timeout().as_millis(),
        idle_timeout_ms = policy.idle_timeout().as_millis(),
        max_text_message_size = policy.max_text_message_size(),
        max_text_message_buffer_size = policy.max_text_message_buffer_size(),
        max_binary_message_size = policy.max_binary_message_size(),
        max_binary_message_buffer_size = policy.max_binary_message_buffer_size(),
        "effective websocket policy"
    );
    drop(policy);

    container.stop();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.json_logs);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("deployment check failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
