use certsync::config::Settings;
use certsync::error::{CertSyncError, Result};
use certsync::pipeline::{print_next_steps, Pipeline, RunSummary};
use certsync::prompt::{ParamCollector, ProvidedParams, TerminalPrompter};
use certsync::runner::SystemRunner;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use secrecy::SecretString;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PASSWORD_ENV: &str = "CERTSYNC_SSH_PASSWORD";

fn cli() -> Command {
    let value = |id: &'static str, long: &'static str, name: &'static str, env: &'static str, help: &'static str| {
        Arg::new(id).long(long).value_name(name).env(env).help(help)
    };

    Command::new("certsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Copies a node's TLS certificates to the panel host, mounts them into the panel's compose service and restarts it. Anything not given as a flag or environment variable is asked for interactively.")
        .arg(value("config", "config", "PATH", "CERTSYNC_CONFIG", "Settings file (YAML)"))
        .arg(value("compose_dir", "compose-dir", "DIR", "CERTSYNC_COMPOSE_DIR", "Directory containing docker-compose.yml"))
        .arg(value("panel_cert_dir", "panel-cert-dir", "DIR", "CERTSYNC_PANEL_CERT_DIR", "Base directory for certificates on the panel host"))
        .arg(value("container_cert_dir", "container-cert-dir", "DIR", "CERTSYNC_CONTAINER_CERT_DIR", "Base directory for certificates inside the container"))
        .arg(value("service", "service", "NAME", "CERTSYNC_SERVICE", "Compose service that gets the mount"))
        .arg(value("node_ip", "node-ip", "IP", "CERTSYNC_NODE_IP", "Node VPS IP address"))
        .arg(value("node_domain", "node-domain", "DOMAIN", "CERTSYNC_NODE_DOMAIN", "Node VPS domain name"))
        .arg(value("node_user", "node-user", "USER", "CERTSYNC_NODE_USER", "Node VPS SSH username"))
        .arg(value("auth", "auth", "METHOD", "CERTSYNC_AUTH", "Authentication method: 1/key or 2/password"))
        .arg(value("ssh_key", "ssh-key", "PATH", "CERTSYNC_SSH_KEY", "SSH private key for key authentication"))
        .arg(Arg::new("no_sudo").long("no-sudo").action(ArgAction::SetTrue).help("Run mkdir and docker without sudo"))
        .arg(Arg::new("no_prompt").long("no-prompt").action(ArgAction::SetTrue).help("Fail instead of prompting for missing values"))
        .arg(Arg::new("verbose").short('v').long("verbose").action(ArgAction::SetTrue).help("Debug logging"))
}

fn load_settings(matches: &ArgMatches) -> Result<Settings> {
    let mut settings = match matches.get_one::<String>("config") {
        Some(path) => Settings::load(Path::new(path))?,
        None => Settings::default(),
    };
    if let Some(service) = matches.get_one::<String>("service") {
        settings.service_name = service.clone();
    }
    if matches.get_flag("no_sudo") {
        settings.use_sudo = false;
    }
    Ok(settings)
}

fn provided_params(matches: &ArgMatches) -> ProvidedParams {
    let get = |id: &str| matches.get_one::<String>(id).cloned();
    ProvidedParams {
        compose_dir: get("compose_dir"),
        panel_cert_base: get("panel_cert_dir"),
        container_cert_base: get("container_cert_dir"),
        node_ip: get("node_ip"),
        node_domain: get("node_domain"),
        node_user: get("node_user"),
        auth: get("auth"),
        ssh_key: get("ssh_key"),
        ssh_password: std::env::var(PASSWORD_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .map(SecretString::from),
    }
}

fn init_logging(settings: &Settings, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level))
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

async fn run(matches: &ArgMatches, defaults: &Settings) -> Result<RunSummary> {
    let interactive = !matches.get_flag("no_prompt");
    let mut prompter = TerminalPrompter;
    let (settings, node) =
        ParamCollector::new(&mut prompter, interactive).collect(defaults, provided_params(matches))?;

    let runner = SystemRunner::new();
    Pipeline::new(&settings, &runner).run(&node).await
}

fn report(error: &CertSyncError) {
    eprintln!("{} {}", "Error:".red().bold(), error.to_string().red());
    if let Some(output) = error.captured_output() {
        eprintln!("{}", output);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let matches = cli().get_matches();

    let settings = match load_settings(&matches) {
        Ok(settings) => settings,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings, matches.get_flag("verbose"));

    println!(
        "{}",
        "--- Xray Node SSL Certificate Automation (for Remnawave Panel) ---".bold()
    );

    match run(&matches, &settings).await {
        Ok(summary) => {
            print_next_steps(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
