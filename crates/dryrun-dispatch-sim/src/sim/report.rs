use crate::sim::endpoint::{DryRunOutcome, EndpointError};
use core::{fmt, time::Duration};
use dryrun_dispatch::DispatchError;
use serde::Serialize;
use std::collections::BTreeMap;

/// The observed fate of one submitted request.
#[derive(Debug)]
pub struct RequestRecord {
    /// Time from submission until the outcome arrived.
    pub latency: Duration,
    pub outcome: dryrun_dispatch::Result<DryRunOutcome, EndpointError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
}

/// Summary of one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimReport {
    pub requested: u64,
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub abandoned: u64,
    /// Requests served by each endpoint, successful or not.
    pub per_endpoint: BTreeMap<String, u64>,
    /// Whether evaluations started in submission order.
    pub dispatch_in_order: bool,
    pub peak_in_flight: usize,
    pub latency: Option<LatencySummary>,
    pub wall_time_ms: f64,
    pub cancelled: bool,
}

impl SimReport {
    /// Aggregates per-request records.
    ///
    /// `endpoints` seeds the per-endpoint table so idle endpoints show up with
    /// a zero count. `starts` lists request ids in the order their evaluations
    /// began.
    pub fn from_records<'a>(
        requested: u64,
        endpoints: impl IntoIterator<Item = &'a str>,
        records: &[RequestRecord],
        starts: &[u64],
        peak_in_flight: usize,
        wall_time: Duration,
    ) -> Self {
        let mut per_endpoint: BTreeMap<String, u64> = endpoints
            .into_iter()
            .map(|name| (name.to_owned(), 0))
            .collect();
        let (mut succeeded, mut failed, mut abandoned) = (0, 0, 0);

        for record in records {
            let endpoint = match &record.outcome {
                Ok(outcome) => {
                    succeeded += 1;
                    Some(&*outcome.endpoint)
                }
                Err(DispatchError::Invocation(err)) => {
                    failed += 1;
                    Some(err.endpoint())
                }
                Err(_) => {
                    abandoned += 1;
                    None
                }
            };
            if let Some(endpoint) = endpoint {
                *per_endpoint.entry(endpoint.to_owned()).or_default() += 1;
            }
        }

        Self {
            requested,
            submitted: records.len() as u64,
            succeeded,
            failed,
            abandoned,
            per_endpoint,
            dispatch_in_order: starts.windows(2).all(|w| w[0] < w[1]),
            peak_in_flight,
            latency: summarize(records.iter().map(|r| r.latency)),
            wall_time_ms: as_millis(wall_time),
            cancelled: (records.len() as u64) < requested,
        }
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

fn summarize(latencies: impl Iterator<Item = Duration>) -> Option<LatencySummary> {
    let mut count = 0u32;
    let mut total = Duration::ZERO;
    let mut min = Duration::MAX;
    let mut max = Duration::ZERO;

    for latency in latencies {
        count += 1;
        total += latency;
        min = min.min(latency);
        max = max.max(latency);
    }

    (count > 0).then(|| LatencySummary {
        min_ms: as_millis(min),
        max_ms: as_millis(max),
        mean_ms: as_millis(total / count),
    })
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "submitted {}/{} requests{}",
            self.submitted,
            self.requested,
            if self.cancelled { " (cancelled)" } else { "" }
        )?;
        writeln!(
            f,
            "  succeeded: {}  failed: {}  abandoned: {}",
            self.succeeded, self.failed, self.abandoned
        )?;
        writeln!(
            f,
            "  dispatch order: {}",
            if self.dispatch_in_order {
                "fifo"
            } else {
                "OUT OF ORDER"
            }
        )?;
        writeln!(f, "  peak in flight: {}", self.peak_in_flight)?;
        if let Some(latency) = &self.latency {
            writeln!(
                f,
                "  latency ms: min {:.1}  mean {:.1}  max {:.1}",
                latency.min_ms, latency.mean_ms, latency.max_ms
            )?;
        }
        writeln!(f, "  wall time: {:.1} ms", self.wall_time_ms)?;
        writeln!(f, "  per endpoint:")?;
        for (endpoint, count) in &self.per_endpoint {
            writeln!(f, "    {endpoint}: {count}")?;
        }
        Ok(())
    }
}
