use crate::scan::ScanOutputFormat;

/// Settings for one pipeline run, fixed once the build configuration is resolved
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineConfig {
    /// Upload/scan parallelism; 0 leaves it to the collaborators
    pub threads: usize,
    pub detailed_summary_requested: bool,
    pub scan_requested: bool,
    pub deployment_disabled: bool,
    pub scan_format: ScanOutputFormat,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_detailed_summary(mut self, requested: bool) -> Self {
        self.detailed_summary_requested = requested;
        self
    }

    pub fn with_scan(mut self, requested: bool) -> Self {
        self.scan_requested = requested;
        self
    }

    pub fn with_deployment_disabled(mut self, disabled: bool) -> Self {
        self.deployment_disabled = disabled;
        self
    }

    pub fn with_scan_format(mut self, format: ScanOutputFormat) -> Self {
        self.scan_format = format;
        self
    }
}
