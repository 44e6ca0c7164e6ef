use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use colored::*;
use lanscout::{
    config::DiscoveryConfig,
    discovery::DiscoveryEngine,
    output::{ssdp_hint, Descriptions, OutputFormat, OutputManager},
    utils::Logger,
};

/// Wireshark's manufacturer database, the format `--oui-db` expects
const MANUF_URL: &str = "https://www.wireshark.org/download/automated/data/manuf";

fn print_banner() {
    println!("{}", " _                                   _   ".truecolor(46, 204, 113).bold());
    println!("{}", "| | __ _ _ __  ___  ___ ___  _   _| |_ ".truecolor(46, 204, 113).bold());
    println!("{}", "| |/ _` | '_ \\/ __|/ __/ _ \\| | | | __|".truecolor(46, 204, 113).bold());
    println!("{}", "| | (_| | | | \\__ \\ (_| (_) | |_| | |_ ".truecolor(46, 204, 113).bold());
    println!("{}", "|_|\\__,_|_| |_|___/\\___\\___/ \\__,_|\\__|".truecolor(46, 204, 113).bold());
    println!();
    println!("{}", "------------------------------------------------------".bright_blue());
    println!("{}", ": ARP cache + OUI vendors + SSDP/UPNP on your LAN    :".bright_blue());
    println!("{}", "------------------------------------------------------".bright_blue());
    println!();
}

/// Accepts `1500`, `1500ms` or `2s`
fn parse_window(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let parsed = if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().map(Duration::from_secs)
    } else {
        value.parse::<u64>().map(Duration::from_millis)
    };

    match parsed {
        Ok(window) if !window.is_zero() => Ok(window),
        Ok(_) => Err("SSDP window must be greater than 0".to_string()),
        Err(_) => Err(format!("Invalid duration: {}", value)),
    }
}

fn build_cli() -> Command {
    Command::new("lanscout")
        .version(env!("CARGO_PKG_VERSION"))
        .author("ibrahimsql")
        .about("Discover devices on the local network from the ARP cache and SSDP")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: ~/.lanscout.toml)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Resolve vendors from the offline OUI database only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("oui-db")
                .long("oui-db")
                .value_name("FILE")
                .help("Tab-separated OUI database used for offline lookups (default: <data dir>/lanscout/manuf)")
                .long_help(
                    "Tab-separated OUI database used when the remote vendor lookup fails. \
                     lanscout does not ship one; download Wireshark's manuf file from \
                     https://www.wireshark.org/download/automated/data/manuf and either \
                     pass its path here or save it as <data dir>/lanscout/manuf \
                     (~/.local/share/lanscout/manuf on Linux).",
                )
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("ssdp-window")
                .long("ssdp-window")
                .value_name("DURATION")
                .help("How long to listen for SSDP responses (e.g. 3000, 1500ms, 2s)")
                .value_parser(parse_window),
        )
        .arg(
            Arg::new("no-upnp")
                .long("no-upnp")
                .help("Skip SSDP discovery and UPNP correlation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("details")
                .short('d')
                .long("details")
                .help("Fetch UPNP device descriptions for correlated devices")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-banner")
                .long("no-banner")
                .help("Suppress the banner")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v, -vv, -vvv)")
                .action(ArgAction::Count),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();

    Logger::init(Logger::level_for_verbosity(matches.get_count("verbose")));

    let json = matches.get_flag("json");
    if !json && !matches.get_flag("no-banner") {
        print_banner();
    }

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => DiscoveryConfig::from_toml_file(path)?,
        None => DiscoveryConfig::load_default_config(),
    };
    if matches.get_flag("offline") {
        config = config.with_offline(true);
    }
    if let Some(path) = matches.get_one::<PathBuf>("oui-db") {
        config = config.with_oui_database(path.clone());
    }
    if let Some(window) = matches.get_one::<Duration>("ssdp-window") {
        config = config.with_ssdp_window(*window);
    }
    if matches.get_flag("no-upnp") {
        config = config.with_ssdp_enabled(false);
    }

    let engine = DiscoveryEngine::new(config)?;

    if let Some(path) = engine.config().oui_database_path().filter(|p| !p.exists()) {
        let level = if engine.config().offline { log::Level::Warn } else { log::Level::Info };
        log::log!(
            level,
            "No offline OUI database at {}; download {} there or pass --oui-db",
            path.display(),
            MANUF_URL
        );
    }

    if !json {
        let step = if engine.config().ssdp_enabled {
            "[~] Reading ARP cache and listening for SSDP responses..."
        } else {
            "[~] Reading ARP cache..."
        };
        println!("{}", step.bright_blue());
    }

    let start = Instant::now();
    let report = engine.scan().await;

    let mut descriptions = Descriptions::new();
    if matches.get_flag("details") {
        let locations: Vec<&String> = report
            .devices
            .iter()
            .flat_map(|device| device.upnp_locations.iter())
            .collect();
        descriptions.extend(engine.describe_all(locations).await);
    }

    let format = if json { OutputFormat::Json } else { OutputFormat::Text };
    let rendered = OutputManager::new(format).render(&report, &descriptions)?;
    println!("{}", rendered);

    if json {
        if let Some(hint) = ssdp_hint(&report.ssdp_status) {
            eprintln!("{} {}", "[!]".bright_yellow(), hint);
        }
    } else {
        println!(
            "{} {} devices, {} UPNP locations",
            "[✓]".green(),
            report.devices.len(),
            report.ssdp_locations
        );
    }

    Logger::log_scan_complete(start.elapsed(), report.devices.len(), report.ssdp_locations);
    Ok(())
}
