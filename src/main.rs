//! R2k Installer - interactive installer and lifecycle dashboard for the
//! R2k background services.

use std::env;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use r2k_installer::audit::AuditLogger;
use r2k_installer::config::Settings;
use r2k_installer::dashboard::{self, Controller};
use r2k_installer::privileges::is_elevated;
use r2k_installer::services::{
    DirectoryAssetStore, InstallLayout, LifecycleContext, LifecyclePolicy, ScServiceControl,
    VariantRegistry,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");
const DEFAULT_CONFIG: &str = "r2k-installer.toml";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let (config_path, explicit) = get_config_path(&args);
    let skip_privilege_check = args.iter().any(|a| a == "--skip-privilege-check");

    let settings = match Settings::load_or_default(&config_path, explicit) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting {} v{}", NAME, VERSION);
    info!(
        config = %config_path,
        defaults = !explicit && !std::path::Path::new(&config_path).exists(),
        "Configuration loaded"
    );

    if skip_privilege_check {
        warn!("Privilege check skipped");
    } else if !is_elevated() {
        eprintln!("{} must be run with administrator (root) privileges.", NAME);
        return ExitCode::FAILURE;
    }

    let assets = DirectoryAssetStore::new(&settings.paths.assets_dir);
    let registry = match VariantRegistry::from_settings(&settings, &assets) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Variant registry could not be built");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        families = ?registry.list_families(),
        variants = registry.count(),
        assets = %assets.root().display(),
        "Variant registry ready"
    );

    let control = Arc::new(ScServiceControl::new(settings.timeouts.command_timeout()));
    let ctx = Arc::new(LifecycleContext::new(
        control,
        InstallLayout::from(&settings.paths),
        LifecyclePolicy::from(&settings),
        settings.timeouts.poll_interval(),
    ));

    let audit = if settings.audit.enabled {
        let path = settings.audit_log_path();
        match AuditLogger::new(&path) {
            Ok(logger) => Some(logger),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Audit log unavailable, continuing without it");
                None
            }
        }
    } else {
        None
    };

    let controller = Arc::new(Controller::new(registry, ctx, audit));
    let refresh = Duration::from_secs(settings.dashboard.refresh_interval_seconds);

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let result = runtime.block_on(dashboard::run(controller, refresh));
    // The stdin reader thread may still be parked on a read.
    runtime.shutdown_timeout(Duration::from_millis(500));

    match result {
        Ok(()) => {
            info!("Installer exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Dashboard failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Installs and manages the R2k Local/Remote background services.

USAGE:
    {} [OPTIONS]

OPTIONS:
    -c, --config <PATH>         Path to configuration file
                                [default: {}]
        --skip-privilege-check  Run without administrator rights
    -h, --help                  Print help information
    -V, --version               Print version information
"#,
        NAME, VERSION, NAME, DEFAULT_CONFIG
    );
}

/// Configuration file path, and whether it was given explicitly.
fn get_config_path(args: &[String]) -> (String, bool) {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return (args[i + 1].clone(), true);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return (path.to_string(), true);
        }
    }
    (DEFAULT_CONFIG.to_string(), false)
}

/// Initialize logging based on settings.
///
/// Output goes to the configured file, or stderr, so it never lands in
/// the dashboard on stdout.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let (writer, ansi) = match &settings.logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer))
                .try_init()?;
        }
    }

    Ok(())
}
