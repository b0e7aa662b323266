//! Prometheus metrics collection and exposition endpoint.

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder, core::Collector,
};
use salvo::{
    Request, Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

use storefront_app::domain::events::ShopEvent;

#[derive(Debug)]
struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    events_total: IntCounterVec,
    order_transitions_total: IntCounterVec,
    stock_rejections_total: IntCounter,
    cart_clear_failures_total: IntCounter,
}

static METRICS: OnceLock<Option<Metrics>> = OnceLock::new();

#[derive(Debug)]
pub(super) struct InFlightRequestGuard {
    tracked: bool,
}

impl InFlightRequestGuard {
    pub(super) fn track() -> Self {
        if let Some(metrics) = metrics() {
            metrics.requests_in_flight.inc();
            return Self { tracked: true };
        }

        Self { tracked: false }
    }
}

impl Drop for InFlightRequestGuard {
    fn drop(&mut self) {
        if self.tracked
            && let Some(metrics) = metrics()
        {
            metrics.requests_in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status_code: u16, duration_seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status_class = status_class(status_code);
    let status_code = status_code.to_string();

    metrics
        .requests_total
        .with_label_values(&[method, route, status_class, status_code.as_str()])
        .inc();

    metrics
        .request_duration_seconds
        .with_label_values(&[method, route])
        .observe(duration_seconds);
}

/// Count a domain event.
pub(super) fn record_event(event: &ShopEvent) {
    let Some(metrics) = metrics() else {
        return;
    };

    metrics.events_total.with_label_values(&[event.name()]).inc();

    if let Some(status) = event.order_status() {
        metrics
            .order_transitions_total
            .with_label_values(&[status.as_str()])
            .inc();
    }

    match event {
        ShopEvent::StockRejected { .. } => metrics.stock_rejections_total.inc(),
        ShopEvent::CartClearFailed { .. } => metrics.cart_clear_failures_total.inc(),
        _ => {}
    }
}

#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };

    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();

    let mut encoded = Vec::new();

    if let Err(source) = encoder.encode(&metric_families, &mut encoded) {
        error!("failed to encode metrics response: {source}");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    }

    let content_type = match HeaderValue::from_str(encoder.format_type()) {
        Ok(value) => value,
        Err(source) => {
            error!("failed to encode metrics content type header: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

            return;
        }
    };

    res.headers_mut().insert(CONTENT_TYPE, content_type);
    res.render(String::from_utf8_lossy(&encoded).into_owned());
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get_or_init(build_metrics).as_ref()
}

fn build_metrics() -> Option<Metrics> {
    let registry = Registry::new();

    let requests_total = match IntCounterVec::new(
        Opts::new(
            "storefront_json_http_requests_total",
            "Total HTTP requests partitioned by method, route, status class, and status code.",
        ),
        &["method", "route", "status_class", "status_code"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create requests_total metric: {source}");
            return None;
        }
    };

    let request_duration_seconds = match HistogramVec::new(
        HistogramOpts::new(
            "storefront_json_http_request_duration_seconds",
            "HTTP request duration in seconds partitioned by method and route.",
        )
        .buckets(vec![
            0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "route"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create request_duration metric: {source}");
            return None;
        }
    };

    let requests_in_flight = match IntGauge::with_opts(Opts::new(
        "storefront_json_http_requests_in_flight",
        "Current number of in-flight HTTP requests.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create in-flight gauge metric: {source}");
            return None;
        }
    };

    let events_total = match IntCounterVec::new(
        Opts::new(
            "storefront_events_total",
            "Domain events observed on the event bus, partitioned by event.",
        ),
        &["event"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create events_total metric: {source}");
            return None;
        }
    };

    let order_transitions_total = match IntCounterVec::new(
        Opts::new(
            "storefront_order_transitions_total",
            "Orders entering each status, including creation and cancellation.",
        ),
        &["status"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create order_transitions_total metric: {source}");
            return None;
        }
    };

    let stock_rejections_total = match IntCounter::with_opts(Opts::new(
        "storefront_stock_rejections_total",
        "Cart or checkout requests rejected for insufficient stock.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create stock_rejections_total metric: {source}");
            return None;
        }
    };

    let cart_clear_failures_total = match IntCounter::with_opts(Opts::new(
        "storefront_cart_clear_failures_total",
        "Checkouts whose order was committed but whose cart could not be emptied.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create cart_clear_failures_total metric: {source}");
            return None;
        }
    };

    register(&registry, "requests_total", &requests_total)?;
    register(&registry, "request_duration", &request_duration_seconds)?;
    register(&registry, "in-flight gauge", &requests_in_flight)?;
    register(&registry, "events_total", &events_total)?;
    register(&registry, "order_transitions_total", &order_transitions_total)?;
    register(&registry, "stock_rejections_total", &stock_rejections_total)?;
    register(&registry, "cart_clear_failures_total", &cart_clear_failures_total)?;

    Some(Metrics {
        registry,
        requests_total,
        request_duration_seconds,
        requests_in_flight,
        events_total,
        order_transitions_total,
        stock_rejections_total,
        cart_clear_failures_total,
    })
}

fn register<C>(registry: &Registry, name: &str, metric: &C) -> Option<()>
where
    C: Collector + Clone + 'static,
{
    if let Err(source) = registry.register(Box::new(metric.clone())) {
        error!("failed to register {name} metric: {source}");
        return None;
    }

    Some(())
}

fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
