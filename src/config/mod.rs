mod loader;

pub use loader::{CacheConfig, Config, ReportConfig, AAPT_IGNORE_ENV, DEFAULT_AAPT_IGNORE};
