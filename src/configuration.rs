use crate::data::Snapshot;
use crate::sampler::Sampler;
use std::time::Duration;

/// A configuration builder for `Sampler`.
pub struct Configuration {
    pub(crate) stripe_count: usize,
    pub(crate) sample_interval: Duration,
    pub(crate) exporter: Option<Box<dyn FnMut(Snapshot) + Send>>,
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            stripe_count: num_cpus::get(),
            sample_interval: Duration::from_secs(1),
            exporter: None,
        }
    }
}

impl Configuration {
    /// Creates a new `Configuration` with default values.
    pub fn new() -> Configuration { Default::default() }

    /// Sets the number of stripes each distribution is spread over.
    ///
    /// Defaults to the number of logical CPUs, probed once when the builder
    /// is created; it is never re-evaluated per call.  Values below 1 are
    /// clamped to 1.
    ///
    /// More stripes mean less lock contention between concurrent writers at
    /// the cost of a slightly longer read fold.  One stripe per CPU means
    /// that, in expectation, writers running at the same time land on
    /// different stripes.
    pub fn stripe_count(mut self, stripe_count: usize) -> Self {
        self.stripe_count = stripe_count.max(1);
        self
    }

    /// Sets the sampling interval.
    ///
    /// Defaults to `1s`.
    ///
    /// Every interval, the sampler reads the whole registry and hands the
    /// snapshot to the exporter.  Sampling cost is proportional to the
    /// number of registered metrics, so very short intervals with very large
    /// registries will spend measurable time reading.
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Sets the exporter invoked with each periodic snapshot.
    ///
    /// Without an exporter, periodic snapshots are still taken (and logged
    /// at debug level) but otherwise dropped; on-demand snapshots through
    /// the controller work either way.
    pub fn exporter<F>(mut self, exporter: F) -> Self
    where
        F: FnMut(Snapshot) + Send + 'static,
    {
        self.exporter = Some(Box::new(exporter));
        self
    }

    /// Create a `Sampler` based on this configuration.
    pub fn build(self) -> Sampler { Sampler::from_config(self) }
}
