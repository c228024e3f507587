use bon::Builder;
use std::path::PathBuf;
use std::time::Duration;

/// Explicit configuration handed to each component at construction. Nothing
/// in the harness reads ambient process state, so several configs can coexist
/// in one process.
#[derive(Clone, Debug, Builder)]
pub struct HarnessConfig {
    #[builder(default = "http://localhost:8000".to_string())]
    pub base_url: String,
    #[builder(default = "memprobe_suite".to_string())]
    pub project_id: String,
    /// Per-request network timeout.
    #[builder(default = 60)]
    pub request_timeout_secs: u64,
    /// Poll attempts before a read-back check is declared timed out.
    #[builder(default = 3)]
    pub max_attempts: u32,
    /// Sleep between poll attempts. The backend's processing latency is
    /// bounded and known empirically (seconds), so a fixed interval keeps
    /// run time predictable.
    #[builder(default = 2000)]
    pub poll_interval_ms: u64,
    #[builder(default = PathBuf::from("test_results.json"))]
    pub results_path: PathBuf,
}

impl HarnessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_bounded() {
        let config = HarnessConfig::builder().build();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert!(config.request_timeout() > Duration::ZERO);
    }

    #[test]
    fn builder_overrides() {
        let config = HarnessConfig::builder()
            .base_url("http://10.0.0.5:8000".to_string())
            .max_attempts(5)
            .build();
        assert_eq!(config.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.max_attempts, 5);
    }
}
