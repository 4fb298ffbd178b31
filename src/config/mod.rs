pub mod study_config;

pub use study_config::{
    ConfigError, RuleConfig, SignalMode, SizingPolicy, StudyConfig, SweepEntry, MAX_DURATION_DAYS,
};
