//! Judge registry and judge resolution.
//!
//! The registry is built once at startup and is read-only afterwards. Judges
//! are keyed by unique name; registration order is kept only for listing.
//! The default judge is explicit: a configured name, or the first registered
//! judge when none is configured.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{CanaryConfig, JudgeError, Result};
use crate::judge::{CanaryJudge, JudgeDescriptor};

pub struct JudgeRegistry {
    judges: Vec<Arc<dyn CanaryJudge>>,
    by_name: HashMap<String, usize>,
    default_index: Option<usize>,
}

impl JudgeRegistry {
    /// Build a registry, rejecting duplicate names.
    pub fn new(judges: Vec<Arc<dyn CanaryJudge>>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(judges.len());
        for (index, judge) in judges.iter().enumerate() {
            if by_name.insert(judge.name().to_string(), index).is_some() {
                return Err(JudgeError::DuplicateJudge {
                    name: judge.name().to_string(),
                });
            }
        }
        let default_index = if judges.is_empty() { None } else { Some(0) };
        Ok(Self {
            judges,
            by_name,
            default_index,
        })
    }

    /// Make the named judge the default. The name must be registered.
    pub fn with_default(mut self, name: &str) -> Result<Self> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| JudgeError::JudgeNotFound {
                name: name.to_string(),
            })?;
        self.default_index = Some(index);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.judges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judges.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CanaryJudge>> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.judges[i]))
    }

    /// Descriptors of every registered judge, in registration order.
    pub fn list(&self) -> Vec<JudgeDescriptor> {
        self.judges
            .iter()
            .map(|j| JudgeDescriptor::of(j.as_ref()))
            .collect()
    }

    pub fn default_judge(&self) -> Result<Arc<dyn CanaryJudge>> {
        self.default_index
            .map(|i| Arc::clone(&self.judges[i]))
            .ok_or(JudgeError::NoJudgesRegistered)
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Pick the judge for a configuration: its preference, else the default.
    pub fn resolve(&self, config: &CanaryConfig) -> Result<Arc<dyn CanaryJudge>> {
        self.resolve_with_override(None, config)
    }

    /// Like [`resolve`](Self::resolve), but a non-empty `override_name` wins
    /// over the configuration's preference.
    pub fn resolve_with_override(
        &self,
        override_name: Option<&str>,
        config: &CanaryConfig,
    ) -> Result<Arc<dyn CanaryJudge>> {
        let requested = override_name
            .filter(|name| !name.is_empty())
            .or_else(|| config.judge_preference());

        match requested {
            Some(name) => self.get(name).ok_or_else(|| JudgeError::JudgeNotFound {
                name: name.to_string(),
            }),
            None => self.default_judge(),
        }
    }
}

impl fmt::Debug for JudgeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeRegistry")
            .field(
                "judges",
                &self.judges.iter().map(|j| j.name()).collect::<Vec<_>>(),
            )
            .field("default_index", &self.default_index)
            .finish()
    }
}
