// crates/server/src/config.rs
//! Command-line and environment configuration for the server binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use baton_core::config::{DEFAULT_CHECKER_PERIOD, DEFAULT_TICK_BUDGET, DEFAULT_WORK_DURATION};
use baton_core::BatonConfig;
use clap::Parser;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 47900;

/// Serve asynchronous requests tracked by a periodic checker.
///
/// Every flag can also be set through the environment variable shown in
/// `--help`; flags win over the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "baton", version, about)]
pub struct ServerArgs {
    /// Address to bind.
    #[arg(long, env = "BATON_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "BATON_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Milliseconds between checker ticks.
    #[arg(long, env = "BATON_CHECKER_PERIOD_MS", default_value_t = DEFAULT_CHECKER_PERIOD.as_millis() as u64)]
    pub checker_period_ms: u64,

    /// Progress ticks before a request times out.
    #[arg(long, env = "BATON_TICK_BUDGET", default_value_t = DEFAULT_TICK_BUDGET)]
    pub tick_budget: u32,

    /// Milliseconds the placeholder work unit runs for.
    #[arg(long, env = "BATON_WORK_DURATION_MS", default_value_t = DEFAULT_WORK_DURATION.as_millis() as u64)]
    pub work_duration_ms: u64,
}

impl ServerArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn baton_config(&self) -> BatonConfig {
        BatonConfig::new(
            Duration::from_millis(self.checker_period_ms),
            self.tick_budget,
            Duration::from_millis(self.work_duration_ms),
        )
    }
}
