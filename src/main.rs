use clap::{Parser, Subcommand};
use log::LevelFilter;
use rideprompt::config::Config;
use rideprompt::deeplink::{self, Provider};
use rideprompt::link::{
    handle_shared_link, is_short_link, parse_google_maps_link, LinkResolver, ParseError, Resolution, SharedLocation,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// RidePrompt: open a shared Google Maps destination in a ride app.
///
/// Parses a Google Maps link (short links are followed), prints the
/// destination, and builds a deep link only after you confirm.
///
/// Examples:
///   rideprompt parse "https://maps.app.goo.gl/abc123"
///   rideprompt parse "https://maps.google.com/?q=Taj+Mahal,27.1751,78.0421" --provider uber
///   rideprompt classify "https://goo.gl/maps/xyz"
///   rideprompt serve --port 8080
#[derive(Parser)]
#[command(name = "rideprompt", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level: off, error, warn, info, debug, trace. Overrides RUST_LOG.
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    /// Config file. Defaults to ~/.rideprompt/config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the destination from a shared link.
    Parse {
        /// The shared or pasted link.
        url: String,

        /// Do not follow short links.
        #[arg(long)]
        no_resolve: bool,

        /// Build a deep link for this provider: uber, ola, google_maps.
        #[arg(long, short = 'p', value_parser = parse_provider)]
        provider: Option<Provider>,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Report whether a link is a shortened Google Maps link.
    Classify {
        url: String,
    },
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    s.parse()
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = rideprompt::logging::init_logger(cli.log_level) {
        eprintln!("Warning: logger not initialized: {}", e);
    }

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match cli.command {
        Command::Parse { url, no_resolve, provider, yes } => run_parse(&config, &url, no_resolve, provider, yes),
        Command::Classify { url } => {
            let short = is_short_link(&url);
            println!("{}", serde_json::json!({ "url": url, "short_link": short }));
        }
        Command::Serve { host, port } => run_serve(config, host, port),
    }
}

fn run_parse(config: &Config, url: &str, no_resolve: bool, provider: Option<Provider>, yes: bool) {
    let shared = if no_resolve {
        parse_only(url)
    } else {
        let resolver = LinkResolver::from_config(&config.resolver);
        handle_shared_link(url, &resolver)
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // ── Banner ──────────────────────────────────────────────────

    eprintln!("  {}", shared.location.display_line());
    if let Resolution::Fallback { reason, .. } = &shared.resolution {
        eprintln!("  \u{26A0}\u{FE0F}  Short link not resolved ({}); parsed as shared.", reason);
    }

    // JSON to stdout
    match serde_json::to_string_pretty(&shared) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: cannot encode result: {}", e);
            std::process::exit(1);
        }
    }

    // ── Deep link, only after explicit confirmation ─────────────

    let Some(provider) = provider else {
        return;
    };

    let prompt = format!("Open \"{}\" in {}?", shared.location.place_name(), provider);
    let confirmed = yes
        || confirm(&prompt).unwrap_or_else(|e| {
            eprintln!("Error: cannot read confirmation: {}", e);
            false
        });

    if confirmed {
        println!("{}", deeplink::build(provider, &shared.location));
    } else {
        eprintln!("  Cancelled.");
    }
}

fn parse_only(url: &str) -> Result<SharedLocation, ParseError> {
    let location = parse_google_maps_link(url)?;
    Ok(SharedLocation {
        resolution: Resolution::Passthrough { url: url.to_string() },
        location,
    })
}

fn confirm(prompt: &str) -> io::Result<bool> {
    eprint!("  {} [y/N] ", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn run_serve(mut config: Config, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Error: cannot start runtime: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = runtime.block_on(rideprompt::server::start(&config)) {
        eprintln!(
            "Error: server on {}:{} failed: {}",
            config.server.host, config.server.port, e
        );
        std::process::exit(1);
    }
}
