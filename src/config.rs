// src/config.rs
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "car-bidding", about = "Dealer bid placement engine for a car marketplace")]
pub struct Config {
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1")]
    pub bind_address: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Retry budget for the optimistic bid commit.
    #[arg(long, env = "BID_COMMIT_ATTEMPTS", default_value_t = 5)]
    pub commit_attempts: u32,

    /// Time budget for a single place-bid request, in milliseconds.
    #[arg(long, env = "BID_TIMEOUT_MS", default_value_t = 5000)]
    pub bid_timeout_ms: u64,
}

impl Config {
    pub fn bid_timeout(&self) -> Duration {
        Duration::from_millis(self.bid_timeout_ms)
    }
}
