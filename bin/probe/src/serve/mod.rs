use probe_config::{ConfigError, ServiceConfig};
use probe_server::{Operator, ProbeServer};
use tokio::sync::broadcast;
use tracing_subscriber::FmtSubscriber;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("serve")
            .about("runs the probe HTTP service until interrupted")
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .help("TOML file to load settings from")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String)),
            )
            .arg(
                clap::Arg::new("addr")
                    .long("addr")
                    .help("address to listen on [default: 127.0.0.1]")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String)),
            )
            .arg(
                clap::Arg::new("port")
                    .long("port")
                    .help("port to listen on [default: 1323]")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(u16)),
            )
            .arg(
                clap::Arg::new("log_level")
                    .long("log-level")
                    .help("error, warn, info, debug or trace [default: info]")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String)),
            ),
    )
}

/// File values first, then any flag given on the command line.
fn resolve_config(args: &clap::ArgMatches) -> std::result::Result<ServiceConfig, ConfigError> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => probe_config::service_config_from_path(path)?,
        None => ServiceConfig::default(),
    };

    if let Some(addr) = args.get_one::<String>("addr") {
        config.addr.clone_from(addr);
    }
    if let Some(port) = args.get_one::<u16>("port") {
        config.port = *port;
    }
    if let Some(level) = args.get_one::<String>("log_level") {
        config.log_level.clone_from(level);
    }

    config.validate()?;
    Ok(config)
}

pub async fn run(args: &clap::ArgMatches) -> std::result::Result<(), BoxedError> {
    let config = resolve_config(args)?;

    let level = probe_trace::parse_level(&config.log_level).ok_or_else(|| {
        ConfigError::InvalidValue(format!("unknown log level: {}", config.log_level))
    })?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    probe_trace::info!("Starting probe on {}", config.bind_address());

    let server = ProbeServer::new(config)?.shared();
    let (cancel_sender, cancel_receiver) = broadcast::channel::<()>(1);

    let interrupt = cancel_sender.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                probe_trace::info!("interrupted, shutting down");
                let _ = interrupt.send(());
            }
            Err(err) => probe_trace::error!("unable to listen for ctrl-c: {}", err),
        }
    });

    let waiter = server.run(cancel_receiver);
    waiter.await??;

    drop(cancel_sender);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(argv: &[&str]) -> clap::ArgMatches {
        let matches = register(clap::Command::new("probe"))
            .try_get_matches_from(argv)
            .expect("arguments should parse");
        matches
            .subcommand_matches("serve")
            .expect("serve subcommand")
            .clone()
    }

    #[test]
    fn defaults_without_flags() {
        let config = resolve_config(&matches(&["probe", "serve"])).expect("valid config");
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = resolve_config(&matches(&[
            "probe",
            "serve",
            "--addr",
            "0.0.0.0",
            "--port",
            "8080",
            "--log-level",
            "debug",
        ]))
        .expect("valid config");

        assert_eq!(config.addr, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = resolve_config(&matches(&["probe", "serve", "--config", "/no/such/probe.toml"]))
            .expect_err("file does not exist");
        assert!(matches!(err, ConfigError::InvalidPath(_)));
    }
}
