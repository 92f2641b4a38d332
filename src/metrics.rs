use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::weights::{Modality, ModalityWeights};

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and publish the
    /// effective fusion weights as gauges.
    pub fn init(weights: &ModalityWeights) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe();
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();

        for m in Modality::ALL {
            gauge!("fusion_weight", "modality" => m.as_str()).set(weights.get(m).unwrap_or(0.0));
        }

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("sessions_total", "Sessions finished, by status.");
    describe_counter!(
        "session_stage_failures_total",
        "Sessions aborted, by failing stage."
    );
    describe_counter!(
        "visualization_failures_total",
        "Charts that could not be rendered (non-fatal)."
    );
    describe_histogram!("session_duration_ms", "Wall time of one session in milliseconds.");
    describe_gauge!("fusion_weight", "Effective normalized weight per modality.");
}
