use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub cache_lookups_total: IntCounterVec,
    pub cod_checks_total: IntCounterVec,
    pub settlements_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Station assignments by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let cache_lookups_total = IntCounterVec::new(
            Opts::new(
                "cache_lookups_total",
                "Assignment cache lookups by result (hit/invalidated/miss)",
            ),
            &["result"],
        )
        .expect("valid cache_lookups_total metric");

        let cod_checks_total = IntCounterVec::new(
            Opts::new("cod_checks_total", "COD eligibility checks by result"),
            &["result"],
        )
        .expect("valid cod_checks_total metric");

        let settlements_total = IntCounterVec::new(
            Opts::new("settlements_total", "Settlements produced by service type"),
            &["service"],
        )
        .expect("valid settlements_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of station assignment in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(cache_lookups_total.clone()))
            .expect("register cache_lookups_total");
        registry
            .register(Box::new(cod_checks_total.clone()))
            .expect("register cod_checks_total");
        registry
            .register(Box::new(settlements_total.clone()))
            .expect("register settlements_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");

        Self {
            registry,
            assignments_total,
            cache_lookups_total,
            cod_checks_total,
            settlements_total,
            assignment_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
