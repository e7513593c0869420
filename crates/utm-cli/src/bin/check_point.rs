//! CLI tool to check a point against the registered airspace.

use clap::Parser;
use utm_cli::auth::{generate_operator_token, TokenConfig};
use utm_cli::ZoneClient;
use utm_core::VerdictStatus;

/// Ask the UTM server whether a point lies in restricted airspace
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// UTM Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    /// Altitude in meters
    #[arg(long, default_value_t = 50.0)]
    altitude: f64,

    /// Bearer token; minted from --secret when omitted
    #[arg(long, env = "UTM_TOKEN")]
    token: Option<String>,

    /// Signing secret used to mint a token
    #[arg(long, env = "UTM_JWT_SECRET", default_value = "utm-dev-secret-change-me")]
    secret: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let token = match args.token {
        Some(token) => token,
        None => generate_operator_token(&TokenConfig {
            secret: args.secret,
            ..TokenConfig::default()
        })?,
    };

    let client = ZoneClient::new(&args.url, token);
    let verdict = client.check_point(args.lat, args.lng, args.altitude)?;

    println!(
        "({:.6}, {:.6}) @ {:.1}m: {:?} - {}",
        args.lat, args.lng, args.altitude, verdict.status, verdict.message
    );
    for zone in &verdict.zones {
        println!(
            "  {} [{}] {} ({:.0}-{:.0}m)",
            zone.id,
            zone.zone_type.as_str(),
            zone.name,
            zone.min_altitude,
            zone.max_altitude
        );
    }

    if verdict.status == VerdictStatus::NoFly {
        std::process::exit(2);
    }
    Ok(())
}
