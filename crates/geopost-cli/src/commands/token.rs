use anyhow::{Context, Result};
use chrono::Duration;
use geopost_api::auth::JwtService;
use geopost_api::config::DEV_JWT_SECRET;
use serde::Serialize;

use crate::cli::TokenArgs;
use crate::output::OutputWriter;

#[derive(Serialize)]
struct TokenOutput {
    username: String,
    token: String,
    expires_in_hours: i64,
}

pub fn execute(args: &TokenArgs, output: &OutputWriter) -> Result<()> {
    if args.ttl_hours <= 0 {
        anyhow::bail!("--ttl-hours must be positive");
    }

    let secret = match &args.secret {
        Some(secret) => secret.as_str(),
        None => {
            output.warning("GEOPOST_JWT_SECRET not set, signing with the development secret");
            DEV_JWT_SECRET
        }
    };

    let token = JwtService::new(secret)
        .issue(&args.user, Duration::hours(args.ttl_hours))
        .context("Failed to sign token")?;

    if output.is_json() {
        output.result(TokenOutput {
            username: args.user.clone(),
            token,
            expires_in_hours: args.ttl_hours,
        })
    } else {
        println!("{}", token);
        Ok(())
    }
}
