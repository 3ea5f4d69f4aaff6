use crate::sim::{
    config::SimConfig,
    endpoint::{DryRunRequest, SimulatedEndpoint, StartLog},
    report::{RequestRecord, SimReport},
    telemetry,
};
use dryrun_dispatch::{TokioDispatchQueue, TokioResourcePool};
use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs one simulation to completion and summarizes it.
///
/// Requests are submitted in id order, `config.submit_interval` apart. Once
/// `shutdown` is cancelled no further requests are submitted, but those
/// already queued still run and are included in the report.
pub async fn run(config: &SimConfig, shutdown: CancellationToken) -> SimReport {
    let starts = StartLog::default();
    let endpoints = config.endpoints.iter().enumerate().map(|(i, name)| {
        let seed = config.seed.map(|seed| seed.wrapping_add(i as u64));
        SimulatedEndpoint::new(name, config.profile, seed, starts.clone())
    });

    let pool = TokioResourcePool::new(endpoints);
    let queue = TokioDispatchQueue::new(pool, config.dispatch);
    let began = Instant::now();

    let mut pending = Vec::new();
    for id in 0..config.requests {
        if id > 0 && !config.submit_interval.is_zero() {
            tokio::select! {
                () = shutdown.cancelled() => {}
                () = tokio::time::sleep(config.submit_interval) => {}
            }
        }
        if shutdown.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::warn!(submitted = id, "cancelled, no further requests will be submitted");
            break;
        }

        telemetry::increment_submissions();
        let submission = queue.submit(DryRunRequest::new(id));
        let submitted_at = Instant::now();

        // Each outcome is awaited on its own task so latency is measured when
        // the outcome arrives, not when the collector gets around to it.
        pending.push(tokio::spawn(async move {
            let outcome = submission.await;
            RequestRecord {
                latency: submitted_at.elapsed(),
                outcome,
            }
        }));
    }

    let mut records = Vec::with_capacity(pending.len());
    for joined in join_all(pending).await {
        match joined {
            Ok(record) => records.push(record),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("outcome collector failed: {:?}", _e);
            }
        }
    }

    for record in &records {
        telemetry::record_request_duration(record.latency.as_secs_f64() * 1_000.0);
        if let Err(_e) = &record.outcome {
            telemetry::increment_failures();

            #[cfg(feature = "tracing")]
            tracing::info!("request failed: {}", _e);
        }
    }

    let peak_in_flight = queue.pool().stats().peak_checked_out;
    telemetry::record_peak_in_flight(peak_in_flight);

    SimReport::from_records(
        config.requests,
        config.endpoints.iter().map(String::as_str),
        &records,
        &starts.snapshot(),
        peak_in_flight,
        began.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::endpoint::EndpointProfile;
    use core::time::Duration;
    use dryrun_dispatch::DispatchConfig;

    fn config(endpoints: &[&str], requests: u64, failure_rate: f64) -> SimConfig {
        SimConfig {
            endpoints: endpoints.iter().map(|e| (*e).to_owned()).collect(),
            requests,
            dispatch: DispatchConfig::default(),
            profile: EndpointProfile {
                latency: Duration::from_millis(200),
                jitter: Duration::from_millis(100),
                failure_rate,
            },
            submit_interval: Duration::ZERO,
            seed: Some(42),
            json: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reliable_run_serves_everything_in_order() {
        let config = config(&["node-a", "node-b", "node-c"], 12, 0.0);
        let report = run(&config, CancellationToken::new()).await;

        assert_eq!(report.submitted, 12);
        assert_eq!(report.succeeded, 12);
        assert_eq!(report.failed + report.abandoned, 0);
        assert!(report.dispatch_in_order);
        assert_eq!(report.peak_in_flight, 3);
        assert_eq!(report.per_endpoint.values().sum::<u64>(), 12);
        assert!(!report.cancelled);

        // Four rounds on three workers, each at least 200 ms of work plus
        // 500 ms of cooldown between rounds.
        assert!(report.wall_time_ms >= 4.0 * 200.0 + 3.0 * 500.0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_endpoints_are_counted_not_fatal() {
        let config = config(&["node-a", "node-b"], 6, 1.0);
        let report = run(&config, CancellationToken::new()).await;

        assert_eq!(report.submitted, 6);
        assert_eq!(report.failed, 6);
        assert_eq!(report.succeeded, 0);
        assert!(report.dispatch_in_order);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_run_submits_nothing_further() {
        let mut config = config(&["node-a"], 10, 0.0);
        config.submit_interval = Duration::from_millis(100);

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            trigger.cancel();
        });

        let report = run(&config, shutdown).await;
        assert_eq!(report.submitted, 3);
        assert_eq!(report.succeeded, 3);
        assert!(report.cancelled);
    }
}
