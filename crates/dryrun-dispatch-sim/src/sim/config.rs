use crate::sim::endpoint::EndpointProfile;
use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use dryrun_dispatch::DispatchConfig;
use std::collections::HashSet;

/// Largest batch a single run will submit.
pub const MAX_REQUESTS: u64 = 1_000_000;

/// Upper bound for the simulated latency and for its jitter, one hour each.
pub const MAX_LATENCY_MS: u64 = 60 * 60 * 1_000;

/// Runtime configuration for the `dryrun-dispatch-sim` binary.
///
/// Every value can be given on the command line or through the environment
/// (a `.env` file in the working directory is loaded first). Defaults describe
/// a small three-node deployment with the standard half-second cooldown.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dryrun-dispatch-sim",
    version,
    about = "Drive simulated dry-run endpoints through the dispatch queue and report what happened"
)]
pub struct CliArgs {
    /// Comma-separated names of the simulated endpoints.
    ///
    /// One worker is created per name, in the order given. Names must be
    /// unique.
    ///
    /// Environment variable: `DRYRUN_ENDPOINTS`
    #[arg(
        long,
        env = "DRYRUN_ENDPOINTS",
        value_delimiter = ',',
        default_value = "node-a,node-b,node-c"
    )]
    pub endpoints: Vec<String>,

    /// Number of requests to submit, at most 1,000,000.
    ///
    /// Environment variable: `DRYRUN_REQUESTS`
    #[arg(long, env = "DRYRUN_REQUESTS", default_value_t = 32)]
    pub requests: u64,

    /// Pause, in milliseconds, between a worker finishing one request and
    /// becoming eligible for the next.
    ///
    /// Environment variable: `DRYRUN_COOLDOWN_MS`
    #[arg(long, env = "DRYRUN_COOLDOWN_MS", default_value_t = 500)]
    pub cooldown_ms: u64,

    /// Base time, in milliseconds, each simulated evaluation takes. At most
    /// one hour.
    ///
    /// Environment variable: `DRYRUN_LATENCY_MS`
    #[arg(long, env = "DRYRUN_LATENCY_MS", default_value_t = 200)]
    pub latency_ms: u64,

    /// Upper bound, in milliseconds, of the uniform jitter added to the base
    /// latency. At most one hour.
    ///
    /// Environment variable: `DRYRUN_JITTER_MS`
    #[arg(long, env = "DRYRUN_JITTER_MS", default_value_t = 100)]
    pub jitter_ms: u64,

    /// Probability in `[0, 1]` that a simulated evaluation fails.
    ///
    /// Environment variable: `DRYRUN_FAILURE_RATE`
    #[arg(long, env = "DRYRUN_FAILURE_RATE", default_value_t = 0.05)]
    pub failure_rate: f64,

    /// Delay, in milliseconds, between consecutive submissions. Zero submits
    /// the whole batch at once.
    ///
    /// Environment variable: `DRYRUN_SUBMIT_INTERVAL_MS`
    #[arg(long, env = "DRYRUN_SUBMIT_INTERVAL_MS", default_value_t = 0)]
    pub submit_interval_ms: u64,

    /// Seed for the endpoints' random number generators. Runs with the same
    /// seed see the same latencies and failures.
    ///
    /// Environment variable: `DRYRUN_SEED`
    #[arg(long, env = "DRYRUN_SEED")]
    pub seed: Option<u64>,

    /// Print the final report as JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub endpoints: Vec<String>,
    pub requests: u64,
    pub dispatch: DispatchConfig,
    pub profile: EndpointProfile,
    pub submit_interval: Duration,
    pub seed: Option<u64>,
    pub json: bool,
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let endpoints: Vec<String> = args
            .endpoints
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        if endpoints.is_empty() {
            bail!("DRYRUN_ENDPOINTS must name at least one endpoint");
        }

        let mut seen = HashSet::with_capacity(endpoints.len());
        for name in &endpoints {
            if !seen.insert(name.as_str()) {
                bail!("DRYRUN_ENDPOINTS lists `{name}` more than once");
            }
        }

        if !(0.0..=1.0).contains(&args.failure_rate) {
            bail!(
                "DRYRUN_FAILURE_RATE ({}) must be between 0 and 1",
                args.failure_rate
            );
        }

        if args.requests == 0 {
            bail!("DRYRUN_REQUESTS must be greater than 0");
        }
        if args.requests > MAX_REQUESTS {
            bail!(
                "DRYRUN_REQUESTS ({}) must not exceed {MAX_REQUESTS}",
                args.requests
            );
        }

        if args.latency_ms > MAX_LATENCY_MS {
            bail!(
                "DRYRUN_LATENCY_MS ({}) must not exceed {MAX_LATENCY_MS}",
                args.latency_ms
            );
        }
        if args.jitter_ms > MAX_LATENCY_MS {
            bail!(
                "DRYRUN_JITTER_MS ({}) must not exceed {MAX_LATENCY_MS}",
                args.jitter_ms
            );
        }

        Ok(Self {
            endpoints,
            requests: args.requests,
            dispatch: DispatchConfig::new(Duration::from_millis(args.cooldown_ms)),
            profile: EndpointProfile {
                latency: Duration::from_millis(args.latency_ms),
                jitter: Duration::from_millis(args.jitter_ms),
                failure_rate: args.failure_rate,
            },
            submit_interval: Duration::from_millis(args.submit_interval_ms),
            seed: args.seed,
            json: args.json,
        })
    }
}
