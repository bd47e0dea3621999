//! Taskboard stub server: the task API held in memory.
//!
//! Nothing is persisted; restarting the server forgets every account and
//! task. Useful for trying the `taskboard` client without a real backend.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 127.0.0.1:5000
//! cargo run --bin taskboard-stub
//!
//! # Custom address, listings wrapped as {"data": [...]}
//! cargo run --bin taskboard-stub -- --bind 127.0.0.1:8080 --listing-shape data
//!
//! # Or via environment variable
//! TASKBOARD_STUB_ADDR=127.0.0.1:8080 cargo run --bin taskboard-stub
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_stub::config::{StubCliArgs, StubConfig};
use taskboard_stub::server::{self, StubState};

#[tokio::main]
async fn main() {
    let cli = StubCliArgs::parse();

    let config = match StubConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        addr = %config.bind_addr,
        shape = ?config.listing_shape,
        signup_signs_in = config.signup_signs_in,
        "starting taskboard stub server"
    );

    let state = Arc::new(StubState::new());
    state.store.set_listing_shape(config.listing_shape).await;
    state.store.set_signup_signs_in(config.signup_signs_in).await;

    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "stub server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "stub server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start stub server");
            std::process::exit(1);
        }
    }
}
