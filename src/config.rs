//! Rearrangement configuration

use serde::{Deserialize, Serialize};

/// Which copy kernel carries out a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// ndarray reshape and axis permutation
    #[default]
    Generic,
    /// rayon-parallel gather
    Parallel,
    /// single-threaded strided gather
    Native,
}

impl std::str::FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(ExecutorKind::Generic),
            "parallel" => Ok(ExecutorKind::Parallel),
            "native" => Ok(ExecutorKind::Native),
            other => Err(format!(
                "Unknown executor '{}' (expected generic, parallel or native)",
                other
            )),
        }
    }
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorKind::Generic => write!(f, "generic"),
            ExecutorKind::Parallel => write!(f, "parallel"),
            ExecutorKind::Native => write!(f, "native"),
        }
    }
}

/// Configuration for a [`Rearranger`](crate::Rearranger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RearrangeConfig {
    pub executor: ExecutorKind,
    /// Below this many elements the parallel executor copies on one thread
    pub parallel_min_len: usize,
}

impl RearrangeConfig {
    pub fn new(executor: ExecutorKind) -> Self {
        Self {
            executor,
            ..Self::default()
        }
    }

    pub fn with_parallel_min_len(mut self, parallel_min_len: usize) -> Self {
        self.parallel_min_len = parallel_min_len;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for RearrangeConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorKind::Generic,
            parallel_min_len: 1 << 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_kind_parsing() {
        assert_eq!("native".parse::<ExecutorKind>().unwrap(), ExecutorKind::Native);
        assert_eq!("Parallel".parse::<ExecutorKind>().unwrap(), ExecutorKind::Parallel);
        assert!("eigen".parse::<ExecutorKind>().is_err());
    }

    #[test]
    fn test_json_defaults() {
        let config = RearrangeConfig::from_json(r#"{ "executor": "native" }"#).unwrap();
        assert_eq!(config.executor, ExecutorKind::Native);
        assert_eq!(config.parallel_min_len, 32768);

        let config = RearrangeConfig::from_json("{}").unwrap();
        assert_eq!(config, RearrangeConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = RearrangeConfig::new(ExecutorKind::Parallel).with_parallel_min_len(16);
        let back = RearrangeConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
