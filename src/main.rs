use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use log::warn;
use netvector::{
    config::ScanConfig,
    output::{OutputConfig, OutputFormat, OutputManager},
    scanner::DiscoveryEngine,
    top_ports::get_top_ports,
};
use std::path::PathBuf;

// Ulimit adjustment for Unix systems
#[cfg(unix)]
fn raise_nofile_limit(wanted: u64) -> u64 {
    use rlimit::Resource;

    match Resource::NOFILE.get() {
        Ok((soft, hard)) if soft < wanted => {
            let target = wanted.min(hard);
            match Resource::NOFILE.set(target, hard) {
                Ok(()) => {
                    log::debug!("raised open file limit from {} to {}", soft, target);
                    target
                }
                Err(e) => {
                    warn!("Could not raise open file limit ({}): {}", soft, e);
                    soft
                }
            }
        }
        Ok((soft, _)) => soft,
        Err(e) => {
            warn!("Could not read open file limit: {}", e);
            wanted
        }
    }
}

#[cfg(not(unix))]
fn raise_nofile_limit(wanted: u64) -> u64 {
    wanted
}

/// Descriptors wanted for `threads` concurrent probes plus headroom
fn descriptor_budget(threads: usize) -> u64 {
    (threads as u64).saturating_mul(2).saturating_add(64)
}

fn print_header(config: &ScanConfig) {
    let toggle = |enabled: bool| if enabled { "on".green() } else { "off".red() };

    println!("{}", "netvector - network discovery".truecolor(57, 255, 20).bold());
    println!("{}", "------------------------------------------------------".bright_blue());
    println!("{} {}", "Target:".bright_blue(), config.targets.join(", ").bright_cyan());
    println!("{} {}", "Ports:".bright_blue(), config.ports.len().to_string().bright_cyan());
    println!(
        "{} {}s",
        "Timeout:".bright_blue(),
        (config.timeout_ms as f64 / 1000.0).to_string().bright_cyan()
    );
    println!("{} {}", "Threads:".bright_blue(), config.max_threads.to_string().bright_cyan());
    println!("{} {}", "Hostname resolution:".bright_blue(), toggle(config.resolve_hostnames));
    println!("{} {}", "Share enumeration:".bright_blue(), toggle(config.enumerate_shares));
    println!("{} {}", "Randomized order:".bright_blue(), toggle(config.randomize));
    println!("{}", "------------------------------------------------------".bright_blue());
    println!();
}

fn build_cli() -> Command {
    Command::new("netvector")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Concurrent TCP discovery with OS guessing and SMB share enumeration")
        .arg(
            Arg::new("target")
                .value_name("TARGET")
                .help("Target network in CIDR notation or single IP, comma-separated for several")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECS")
                .help("Connection timeout in seconds [default: 0.5]")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("COUNT")
                .help("Maximum concurrent probes per host [default: 1000]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("ports")
                .short('p')
                .long("ports")
                .value_name("PORT")
                .help("Specific ports to scan")
                .num_args(1..)
                .value_delimiter(',')
                .value_parser(clap::value_parser!(u16).range(1..))
                .conflicts_with("top-ports"),
        )
        .arg(
            Arg::new("top-ports")
                .long("top-ports")
                .value_name("COUNT")
                .help("Scan only the first COUNT ports of the default list")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("no-resolve-hostnames")
                .long("no-resolve-hostnames")
                .help("Disable reverse DNS hostname resolution")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-enumerate-shares")
                .long("no-enumerate-shares")
                .help("Disable SMB share enumeration")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-randomize")
                .long("no-randomize")
                .help("Probe hosts and ports in order")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-delay")
                .long("max-delay")
                .value_name("SECS")
                .help("Upper bound of the random pause before each host")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write results to FILE instead of stdout"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["text", "json", "csv"])
                .default_value("text"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue),
        )
}

fn secs_to_millis(secs: f64, flag: &str) -> anyhow::Result<u64> {
    if !secs.is_finite() || secs < 0.0 {
        anyhow::bail!("--{} must be a non-negative number of seconds", flag);
    }
    Ok((secs * 1000.0).round() as u64)
}

/// Config file (explicit, then `~/.netvector.toml`), overridden by flags
fn resolve_config(matches: &ArgMatches) -> anyhow::Result<ScanConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ScanConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path))?,
        None => ScanConfig::load_default_config(),
    };

    if let Some(target) = matches.get_one::<String>("target") {
        config = config.with_target_list(target);
    }
    if let Some(secs) = matches.get_one::<f64>("timeout") {
        config = config.with_timeout(secs_to_millis(*secs, "timeout")?);
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config = config.with_threads(*threads);
    }
    if let Some(ports) = matches.get_many::<u16>("ports") {
        config = config.with_ports(ports.copied().collect());
    } else if let Some(count) = matches.get_one::<usize>("top-ports") {
        config = config.with_ports(get_top_ports(*count));
    }
    if matches.get_flag("no-resolve-hostnames") {
        config = config.with_hostname_resolution(false);
    }
    if matches.get_flag("no-enumerate-shares") {
        config = config.with_share_enumeration(false);
    }
    if matches.get_flag("no-randomize") {
        config = config.with_randomization(false);
    }
    if let Some(secs) = matches.get_one::<f64>("max-delay") {
        config = config.with_max_delay(secs_to_millis(*secs, "max-delay")?);
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(matches: &ArgMatches) {
    let level = if matches.get_flag("verbose") {
        "debug"
    } else if matches.get_flag("quiet") {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    init_logging(&matches);

    let config = resolve_config(&matches)?;

    let format: OutputFormat = matches
        .get_one::<String>("format")
        .map(|f| f.parse::<OutputFormat>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or(OutputFormat::Text);
    let file = matches.get_one::<String>("output").map(PathBuf::from);
    let output = OutputManager::new(OutputConfig {
        format,
        colored: !matches.get_flag("no-color") && file.is_none(),
        file: file.clone(),
    });

    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }
    if format == OutputFormat::Text || file.is_some() {
        print_header(&config);
    }

    let wanted = descriptor_budget(config.max_threads);
    let limit = raise_nofile_limit(wanted);
    if limit < config.max_threads as u64 {
        warn!(
            "Open file limit {} is below the thread count {}; some probes may fail",
            limit, config.max_threads
        );
    }

    let engine = DiscoveryEngine::new(config)?;

    let token = engine.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight hosts");
            token.cancel();
        }
    });

    let results = engine.scan().await?;
    if results.cancelled {
        warn!("Scan interrupted, reporting partial results");
    }

    output.write_results(&results, engine.config())?;
    Ok(())
}
