use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Safe to call more than once: only the first call installs the global
/// recorder, later handles render an empty payload.
pub fn init_metrics() -> PrometheusHandle {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if metrics::set_global_recorder(recorder).is_err() {
        tracing::debug!("Metrics recorder already installed");
    }

    // Pre-register counters so they appear even before the first increment.
    counter!("sweep_runs_total").absolute(0);
    counter!("markets_closed_total").absolute(0);
    counter!("verdicts_total", "result" => "yes").absolute(0);
    counter!("verdicts_total", "result" => "no").absolute(0);
    counter!("verdict_parse_failures_total").absolute(0);
    counter!("ledger_builds_total").absolute(0);
    counter!("ledger_logs_not_found_total").absolute(0);
    counter!("totals_users_updated_total").absolute(0);
    counter!("followups_completed_total").absolute(0);
    counter!("followups_failed_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("judge_latency_seconds").record(0.0);

    handle
}
