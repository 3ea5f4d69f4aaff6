//! Simulated dry-run endpoints.
//!
//! A [`SimulatedEndpoint`] stands in for one remote evaluator. It sleeps for a
//! jittered latency and then either reports a result or fails, with the
//! failure probability taken from its [`EndpointProfile`].

use core::time::Duration;
use dryrun_dispatch::Invoke;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Arc;

/// Timing and reliability shared by every simulated endpoint in a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EndpointProfile {
    pub latency: Duration,
    pub jitter: Duration,
    pub failure_rate: f64,
}

/// One request for a dry-run evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DryRunRequest {
    pub id: u64,
    pub payload: String,
}

impl DryRunRequest {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            payload: format!("tx-{id:06}"),
        }
    }
}

/// What an endpoint reports for a successful evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DryRunOutcome {
    pub request: u64,
    pub endpoint: Arc<str>,
    pub evaluated: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("{endpoint} rejected request {request}: simulated failure")]
    Rejected { endpoint: Arc<str>, request: u64 },
}

impl EndpointError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Rejected { endpoint, .. } => endpoint,
        }
    }
}

/// Request ids in the order their evaluations started, across all endpoints.
#[derive(Clone, Debug, Default)]
pub struct StartLog(Arc<Mutex<Vec<u64>>>);

impl StartLog {
    fn record(&self, request: u64) {
        self.0.lock().push(request);
    }

    pub fn snapshot(&self) -> Vec<u64> {
        self.0.lock().clone()
    }
}

pub struct SimulatedEndpoint {
    name: Arc<str>,
    profile: EndpointProfile,
    rng: Mutex<StdRng>,
    starts: StartLog,
}

impl SimulatedEndpoint {
    /// Creates an endpoint. With a seed, its latencies and failures are
    /// reproducible; without one, they are drawn from the thread RNG.
    pub fn new(name: &str, profile: EndpointProfile, seed: Option<u64>, starts: StartLog) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        Self {
            name: Arc::from(name),
            profile,
            rng: Mutex::new(rng),
            starts,
        }
    }

    /// Draws this evaluation's latency and whether it fails.
    fn roll(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock();
        let jitter_ms = self.profile.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.random_range(0..=jitter_ms))
        };
        let fails = rng.random_bool(self.profile.failure_rate);
        (self.profile.latency.saturating_add(jitter), fails)
    }
}

impl Invoke<DryRunRequest> for SimulatedEndpoint {
    type Output = DryRunOutcome;
    type Error = EndpointError;

    fn invoke(
        &self,
        request: DryRunRequest,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        self.starts.record(request.id);
        let (latency, fails) = self.roll();
        let endpoint = Arc::clone(&self.name);

        #[cfg(feature = "tracing")]
        tracing::debug!(%endpoint, request = request.id, ?latency, "evaluating");

        async move {
            tokio::time::sleep(latency).await;

            if fails {
                return Err(EndpointError::Rejected {
                    endpoint,
                    request: request.id,
                });
            }

            Ok(DryRunOutcome {
                request: request.id,
                evaluated: format!("{}@{endpoint}", request.payload),
                endpoint,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn profile(failure_rate: f64) -> EndpointProfile {
        EndpointProfile {
            latency: Duration::from_millis(100),
            jitter: Duration::from_millis(50),
            failure_rate,
        }
    }

    #[test]
    fn payload_is_derived_from_id() {
        assert_eq!(DryRunRequest::new(42).payload, "tx-000042");
    }

    #[tokio::test(start_paused = true)]
    async fn reliable_endpoint_succeeds_within_latency_bounds() {
        let starts = StartLog::default();
        let endpoint = SimulatedEndpoint::new("node-a", profile(0.0), Some(1), starts.clone());

        for id in 0..10 {
            let began = Instant::now();
            let outcome = endpoint.invoke(DryRunRequest::new(id)).await.unwrap();
            let took = began.elapsed();

            assert_eq!(outcome.request, id);
            assert_eq!(&*outcome.endpoint, "node-a");
            assert_eq!(outcome.evaluated, format!("tx-{id:06}@node-a"));
            assert!(took >= Duration::from_millis(100));
            assert!(took <= Duration::from_millis(151));
        }

        assert_eq!(starts.snapshot(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_endpoint_rejects() {
        let endpoint = SimulatedEndpoint::new("node-b", profile(1.0), None, StartLog::default());

        let err = endpoint.invoke(DryRunRequest::new(3)).await.unwrap_err();
        assert_eq!(err.endpoint(), "node-b");
        assert_eq!(
            err.to_string(),
            "node-b rejected request 3: simulated failure"
        );
    }

    #[test]
    fn extreme_latency_saturates_instead_of_overflowing() {
        let profile = EndpointProfile {
            latency: Duration::MAX,
            jitter: Duration::from_millis(10),
            failure_rate: 0.0,
        };
        let endpoint = SimulatedEndpoint::new("slow", profile, Some(3), StartLog::default());

        for _ in 0..10 {
            assert_eq!(endpoint.roll(), (Duration::MAX, false));
        }
    }

    #[test]
    fn same_seed_rolls_the_same_sequence() {
        let a = SimulatedEndpoint::new("a", profile(0.5), Some(7), StartLog::default());
        let b = SimulatedEndpoint::new("b", profile(0.5), Some(7), StartLog::default());

        let rolls_a: Vec<_> = (0..20).map(|_| a.roll()).collect();
        let rolls_b: Vec<_> = (0..20).map(|_| b.roll()).collect();
        assert_eq!(rolls_a, rolls_b);
    }
}
