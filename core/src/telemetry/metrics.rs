use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

struct Metrics {
    analyses: usize,
    failures: usize,
    narrative_errors: usize,
}

/// Counter snapshot: (analyses, failures, narrative errors).
pub type MetricsSnapshot = (usize, usize, usize);

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics {
                analyses: 0,
                failures: 0,
                narrative_errors: 0,
            }),
        }
    }

    pub fn record_analysis(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.analyses += 1;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failures += 1;
        }
    }

    pub fn record_narrative_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.narrative_errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            (metrics.analyses, metrics.failures, metrics.narrative_errors)
        } else {
            (0, 0, 0)
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_analysis();
        metrics.record_analysis();
        metrics.record_narrative_error();
        assert_eq!(metrics.snapshot(), (2, 0, 1));
    }
}
