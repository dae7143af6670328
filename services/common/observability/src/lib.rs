use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct InventoryMetrics {
    pub registry: Registry,
    pub product_operations_total: IntCounterVec,
    pub store_duration_seconds: HistogramVec,
    pub store_ready: IntGauge,
}

impl InventoryMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let product_operations_total = IntCounterVec::new(
            Opts::new(
                "inventory_product_operations_total",
                "Product operations handled, by operation and outcome",
            ),
            &["operation", "outcome"],
        ).unwrap();
        let store_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "inventory_store_duration_seconds",
                "Time spent in a single store statement"
            ).buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        ).unwrap();
        let store_ready = IntGauge::new(
            "inventory_store_ready",
            "1 while the product store is open and serving requests",
        ).unwrap();
        let _ = registry.register(Box::new(product_operations_total.clone()));
        let _ = registry.register(Box::new(store_duration_seconds.clone()));
        let _ = registry.register(Box::new(store_ready.clone()));
        InventoryMetrics { registry, product_operations_total, store_duration_seconds, store_ready }
    }

    pub fn record_operation(&self, operation: &str, outcome: &str) {
        self.product_operations_total.with_label_values(&[operation, outcome]).inc();
    }

    pub fn observe_store(&self, operation: &str, seconds: f64) {
        self.store_duration_seconds.with_label_values(&[operation]).observe(seconds);
    }

    /// Text exposition of this registry followed by any `extra` registries.
    pub fn encode(&self, extra: &[&Registry]) -> Result<String, prometheus::Error> {
        let mut families = self.registry.gather();
        for registry in extra {
            families.extend(registry.gather());
        }
        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for InventoryMetrics {
    fn default() -> Self { Self::new() }
}
