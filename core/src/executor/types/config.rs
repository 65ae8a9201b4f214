use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Maximum number of tasks allowed to be `Running` at the same time.
///
/// Deserializes from the same shapes the `concurrent` option accepts:
/// `false` is sequential, `true` is unbounded and a positive integer is an
/// explicit limit. Zero is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConcurrencyRepr", into = "ConcurrencyRepr")]
pub enum Concurrency {
    Limited(NonZeroUsize),
    Unbounded,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConcurrencyRepr {
    Flag(bool),
    Limit(usize),
}

impl Concurrency {
    pub const SEQUENTIAL: Concurrency = Concurrency::Limited(NonZeroUsize::MIN);

    pub fn limited(limit: usize) -> Result<Self, SchedulerError> {
        NonZeroUsize::new(limit)
            .map(Self::Limited)
            .ok_or_else(|| SchedulerError::Config("concurrency must be at least 1".to_string()))
    }

    /// The numeric cap, or `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Limited(n) => Some(n.get()),
            Self::Unbounded => None,
        }
    }

    /// Whether one more task may start while `running` tasks are in flight.
    pub fn allows(&self, running: usize) -> bool {
        match self {
            Self::Limited(n) => running < n.get(),
            Self::Unbounded => true,
        }
    }

    pub fn is_sequential(&self) -> bool {
        self.limit() == Some(1)
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self::SEQUENTIAL
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl TryFrom<ConcurrencyRepr> for Concurrency {
    type Error = SchedulerError;

    fn try_from(value: ConcurrencyRepr) -> Result<Self, Self::Error> {
        match value {
            ConcurrencyRepr::Flag(true) => Ok(Self::Unbounded),
            ConcurrencyRepr::Flag(false) => Ok(Self::SEQUENTIAL),
            ConcurrencyRepr::Limit(n) => Self::limited(n),
        }
    }
}

impl From<Concurrency> for ConcurrencyRepr {
    fn from(value: Concurrency) -> Self {
        match value {
            Concurrency::Limited(n) => Self::Limit(n.get()),
            Concurrency::Unbounded => Self::Flag(true),
        }
    }
}

impl FromStr for Concurrency {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unbounded" | "true" | "all" => Ok(Self::Unbounded),
            "false" | "sequential" => Ok(Self::SEQUENTIAL),
            other => {
                let n = other.parse::<usize>().map_err(|_| {
                    SchedulerError::Config(format!("invalid concurrency value: {s}"))
                })?;
                Self::limited(n)
            }
        }
    }
}

/// Options for one task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub concurrency: Concurrency,

    /// Forwarded to execution wrappers, which decide whether a failure aborts
    /// the run. `None` lets the wrapper apply its own default.
    pub exit_on_error: Option<bool>,

    /// Nested subtask lists share the parent's renderer when set.
    pub show_subtasks: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::default(),
            exit_on_error: None,
            show_subtasks: true,
        }
    }
}

impl ListOptions {
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = Some(exit_on_error);
        self
    }

    pub fn with_show_subtasks(mut self, show_subtasks: bool) -> Self {
        self.show_subtasks = show_subtasks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        concurrent: Concurrency,
    }

    fn parse(src: &str) -> Result<Concurrency, toml::de::Error> {
        toml::from_str::<Holder>(src).map(|h| h.concurrent)
    }

    #[test]
    fn test_concurrency_from_toml_shapes() {
        assert_eq!(parse("concurrent = false").unwrap(), Concurrency::SEQUENTIAL);
        assert_eq!(parse("concurrent = true").unwrap(), Concurrency::Unbounded);
        assert_eq!(parse("concurrent = 4").unwrap().limit(), Some(4));
        assert!(parse("concurrent = 0").is_err());
    }

    #[test]
    fn test_concurrency_allows() {
        let two = Concurrency::limited(2).unwrap();
        assert!(two.allows(0));
        assert!(two.allows(1));
        assert!(!two.allows(2));
        assert!(Concurrency::Unbounded.allows(10_000));
    }

    #[test]
    fn test_concurrency_from_str() {
        assert_eq!("unbounded".parse::<Concurrency>().unwrap(), Concurrency::Unbounded);
        assert_eq!("3".parse::<Concurrency>().unwrap().to_string(), "3");
        assert!("0".parse::<Concurrency>().unwrap_err().to_string().contains("at least 1"));
        assert!("lots".parse::<Concurrency>().is_err());
    }
}
