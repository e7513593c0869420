//! CLI tool to mint a bearer token for the UTM server.

use clap::Parser;
use utm_cli::auth::{generate_operator_token, TokenConfig};
use utm_core::Role;

/// Generate a signed operator token
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// User id placed in the `userId` claim
    #[arg(long, default_value = "utm-admin")]
    user_id: String,

    /// Role: UTM_ADMIN, INDIVIDUAL_OPERATOR or FLEET_OPERATOR
    #[arg(long, default_value = "UTM_ADMIN")]
    role: String,

    /// Signing secret (must match the server's UTM_JWT_SECRET)
    #[arg(long, env = "UTM_JWT_SECRET", default_value = "utm-dev-secret-change-me")]
    secret: String,

    /// Token validity in hours
    #[arg(long, default_value_t = 24)]
    expiry_hours: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let role = Role::parse(&args.role.to_ascii_uppercase())
        .ok_or_else(|| anyhow::anyhow!("Unknown role: {}", args.role))?;

    let token = generate_operator_token(&TokenConfig {
        user_id: args.user_id,
        role,
        secret: args.secret,
        expiry_hours: args.expiry_hours,
    })?;

    println!("{}", token);
    Ok(())
}
