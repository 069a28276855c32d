use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with operation, status.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const BACKEND_REQUESTS: MetricDef = MetricDef {
    name: "backend.requests",
    metric_type: MetricType::Counter,
    description: "Outbound backend calls. Tagged with backend, role, operation, result.",
};

pub const SECONDARY_FAILURES: MetricDef = MetricDef {
    name: "secondary.failures",
    metric_type: MetricType::Counter,
    description: "Secondary backend calls that failed and were discarded. Tagged with backend.",
};

pub const STATUS_FALLBACK: MetricDef = MetricDef {
    name: "status.fallback",
    metric_type: MetricType::Counter,
    description: "Status reads answered with the empty payload because the primary failed",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    BACKEND_REQUESTS,
    SECONDARY_FAILURES,
    STATUS_FALLBACK,
];
