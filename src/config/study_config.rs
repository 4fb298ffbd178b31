use crate::data::Interval;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

//about a century of trading days
pub const MAX_DURATION_DAYS: u32 = 25_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sweep entry '{tag}': {reason}")]
    InvalidRule { tag: String, reason: String },
    #[error("duplicate sweep column '{0}'")]
    DuplicateTag(String),
    #[error("sweep column tag is empty")]
    EmptyTag,
    #[error("order ratio must be in (0, 1], got {0}")]
    InvalidRatio(f64),
    #[error("window duration must be at least one trading day")]
    EmptyWindow,
    #[error("window duration of {0} trading days is too long")]
    WindowTooLong(u32),
    #[error("initial cash must be positive, got {0}")]
    InvalidCash(f64),
}

//how a band condition turns into a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    //true on every bar the condition holds
    Level,
    //true only on the bar where close crosses the line
    Cross,
}

//trading rule with its parameters, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    //buy below the lower band, sell above the upper band
    Bollinger {
        period: usize,
        inner_devfactor: f64,
        outer_devfactor: f64,
        mode: SignalMode,
    },
    //buy above the upper band, sell below the lower band
    InverseBollinger {
        period: usize,
        inner_devfactor: f64,
        outer_devfactor: f64,
        mode: SignalMode,
    },
    //buy below the sma, sell above it
    SmaCrossover { period: usize, mode: SignalMode },
    BuyAndHoldLong,
    BuyAndHoldShort,
}

impl RuleConfig {
    pub fn bollinger(period: usize, inner_devfactor: f64) -> Self {
        RuleConfig::Bollinger {
            period,
            inner_devfactor,
            outer_devfactor: 2.0,
            mode: SignalMode::Cross,
        }
    }

    pub fn inverse_bollinger(period: usize, inner_devfactor: f64) -> Self {
        RuleConfig::InverseBollinger {
            period,
            inner_devfactor,
            outer_devfactor: 2.0,
            mode: SignalMode::Cross,
        }
    }

    pub fn sma(period: usize, mode: SignalMode) -> Self {
        RuleConfig::SmaCrossover { period, mode }
    }

    //parse rule kind from string, using default parameters
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bollinger" | "boll" => Some(RuleConfig::bollinger(20, 0.5)),
            "inverse_bollinger" | "inverse" => Some(RuleConfig::inverse_bollinger(20, 0.5)),
            "sma" | "sma_crossover" => Some(RuleConfig::sma(20, SignalMode::Level)),
            "hodl_long" | "buy_and_hold_long" | "long" => Some(RuleConfig::BuyAndHoldLong),
            "hodl_short" | "buy_and_hold_short" | "short" => Some(RuleConfig::BuyAndHoldShort),
            _ => None,
        }
    }

    //indicator lookback, zero for rules without indicators
    pub fn period(&self) -> usize {
        match self {
            RuleConfig::Bollinger { period, .. }
            | RuleConfig::InverseBollinger { period, .. }
            | RuleConfig::SmaCrossover { period, .. } => *period,
            RuleConfig::BuyAndHoldLong | RuleConfig::BuyAndHoldShort => 0,
        }
    }

    pub fn mode(&self) -> SignalMode {
        match self {
            RuleConfig::Bollinger { mode, .. }
            | RuleConfig::InverseBollinger { mode, .. }
            | RuleConfig::SmaCrossover { mode, .. } => *mode,
            RuleConfig::BuyAndHoldLong | RuleConfig::BuyAndHoldShort => SignalMode::Level,
        }
    }

    //only the short buy-and-hold rule may sell what it does not own
    pub fn permits_short(&self) -> bool {
        matches!(self, RuleConfig::BuyAndHoldShort)
    }

    //column name used when a sweep entry has no explicit tag
    pub fn default_tag(&self) -> String {
        let mode = |m: &SignalMode| match m {
            SignalMode::Level => "level",
            SignalMode::Cross => "cross",
        };
        match self {
            RuleConfig::Bollinger {
                period,
                inner_devfactor,
                mode: m,
                ..
            } => format!("bollinger_{}_{}_{}", period, inner_devfactor, mode(m)),
            RuleConfig::InverseBollinger {
                period,
                inner_devfactor,
                mode: m,
                ..
            } => format!("inverse_bollinger_{}_{}_{}", period, inner_devfactor, mode(m)),
            RuleConfig::SmaCrossover { period, mode: m } => format!("sma_{}_{}", period, mode(m)),
            RuleConfig::BuyAndHoldLong => "hodl_long".to_string(),
            RuleConfig::BuyAndHoldShort => "hodl_short".to_string(),
        }
    }

    fn validate(&self, tag: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRule {
            tag: tag.to_string(),
            reason: reason.to_string(),
        };

        match self {
            RuleConfig::Bollinger {
                period,
                inner_devfactor,
                outer_devfactor,
                ..
            }
            | RuleConfig::InverseBollinger {
                period,
                inner_devfactor,
                outer_devfactor,
                ..
            } => {
                //sample std needs two points
                if *period < 2 {
                    return Err(invalid("bollinger period must be at least 2"));
                }
                if !(*inner_devfactor >= 0.0 && *outer_devfactor >= 0.0) {
                    return Err(invalid("devfactors must be non-negative"));
                }
                Ok(())
            }
            RuleConfig::SmaCrossover { period, .. } => {
                if *period == 0 {
                    return Err(invalid("sma period must be at least 1"));
                }
                Ok(())
            }
            RuleConfig::BuyAndHoldLong | RuleConfig::BuyAndHoldShort => Ok(()),
        }
    }
}

//one output column of the study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    #[serde(default)]
    pub tag: Option<String>,
    pub rule: RuleConfig,
}

impl SweepEntry {
    pub fn new(rule: RuleConfig) -> Self {
        SweepEntry { tag: None, rule }
    }

    pub fn tagged(tag: impl Into<String>, rule: RuleConfig) -> Self {
        SweepEntry {
            tag: Some(tag.into()),
            rule,
        }
    }

    pub fn column(&self) -> String {
        self.tag.clone().unwrap_or_else(|| self.rule.default_tag())
    }
}

//fraction of portfolio value a single order may use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SizingPolicy {
    Fixed { ratio: f64 },
    //ratio = 1 - Phi(devfactor): how often a normal close lands beyond one side of the band
    SigmaTail { devfactor: f64 },
}

impl Default for SizingPolicy {
    fn default() -> Self {
        SizingPolicy::Fixed { ratio: 0.10 }
    }
}

impl SizingPolicy {
    pub fn order_ratio(&self) -> Result<f64, ConfigError> {
        let ratio = match *self {
            SizingPolicy::Fixed { ratio } => ratio,
            SizingPolicy::SigmaTail { devfactor } => {
                let normal =
                    Normal::new(0.0, 1.0).map_err(|_| ConfigError::InvalidRatio(f64::NAN))?;
                //far tails round to zero, keep a sliver so the run still sizes
                (1.0 - normal.cdf(devfactor)).clamp(f64::MIN_POSITIVE, 1.0)
            }
        };

        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::InvalidRatio(ratio));
        }
        Ok(ratio)
    }
}

//complete study configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub initial_cash: f64,

    //window length in trading days, centered on the event date
    pub duration_days: u32,

    pub interval: Interval,
    pub sizing: SizingPolicy,

    //run events on the rayon pool
    pub parallel: bool,

    //where per-run chart data goes, none disables plotting
    pub plot_dir: Option<PathBuf>,

    pub sweep: Vec<SweepEntry>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        StudyConfig {
            initial_cash: 10_000_000.0,
            duration_days: 60,
            interval: Interval::Daily,
            sizing: SizingPolicy::default(),
            parallel: true,
            plot_dir: None,
            sweep: vec![
                SweepEntry::new(RuleConfig::bollinger(20, 0.5)),
                SweepEntry::new(RuleConfig::bollinger(20, 1.0)),
                SweepEntry::new(RuleConfig::inverse_bollinger(20, 0.5)),
                SweepEntry::new(RuleConfig::inverse_bollinger(20, 1.0)),
                SweepEntry::new(RuleConfig::sma(10, SignalMode::Level)),
                SweepEntry::new(RuleConfig::sma(20, SignalMode::Cross)),
            ],
        }
    }
}

impl StudyConfig {
    //load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: StudyConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_cash > 0.0) {
            return Err(ConfigError::InvalidCash(self.initial_cash));
        }
        if self.duration_days == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.duration_days > MAX_DURATION_DAYS {
            return Err(ConfigError::WindowTooLong(self.duration_days));
        }
        self.sizing.order_ratio()?;

        let mut seen = HashSet::new();
        for entry in &self.sweep {
            let column = entry.column();
            if column.trim().is_empty() {
                return Err(ConfigError::EmptyTag);
            }
            entry.rule.validate(&column)?;
            if !seen.insert(column.clone()) {
                return Err(ConfigError::DuplicateTag(column));
            }
        }
        Ok(())
    }

    //sweep column names in declaration order
    pub fn columns(&self) -> Vec<String> {
        self.sweep.iter().map(SweepEntry::column).collect()
    }
}
