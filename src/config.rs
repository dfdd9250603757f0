//! Engine configuration.
//!
//! [`EngineConfig`] is the validated set of knobs the pipeline runs with. The
//! binary assembles it from persisted defaults ([`AppConfig`]) and CLI flags.

use crate::error::ConfigError;
use crate::ingest::StealPolicy;
use crate::tokenize::TokenizerKind;
use crate::utils::app_data::AppConfig;

/// Upper bound on tokenizer threads
const MAX_THREADS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Tokenizer worker count for phase 2
    pub num_threads: usize,
    /// Pin phase-2 workers to their node (loaders always pin)
    pub affinity: bool,
    pub tokenizer: TokenizerKind,
    pub steal_policy: StealPolicy,
    /// Advise the kernel to drop file pages after loading
    pub drop_page_cache: bool,
    pub show_progress: bool,
}

impl EngineConfig {
    /// Validate the two required parameters; everything else takes defaults
    pub fn new(num_threads: usize, affinity_flag: u8) -> Result<Self, ConfigError> {
        let affinity = match affinity_flag {
            0 => false,
            1 => true,
            other => return Err(ConfigError::InvalidAffinityFlag(other)),
        };
        let config = Self {
            num_threads,
            affinity,
            tokenizer: TokenizerKind::default(),
            steal_policy: StealPolicy::default(),
            drop_page_cache: true,
            show_progress: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Required parameters plus persisted defaults
    pub fn from_app_config(
        app: &AppConfig,
        num_threads: usize,
        affinity_flag: u8,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            tokenizer: app.tokenizer,
            steal_policy: app.steal_policy,
            drop_page_cache: app.drop_page_cache,
            show_progress: app.show_progress,
            ..Self::new(num_threads, affinity_flag)?
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads == 0 {
            return Err(ConfigError::InvalidThreadCount(self.num_threads));
        }
        if self.num_threads > MAX_THREADS {
            return Err(ConfigError::TooManyThreads {
                requested: self.num_threads,
                max: MAX_THREADS,
            });
        }
        Ok(())
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizerKind) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_steal_policy(mut self, steal_policy: StealPolicy) -> Self {
        self.steal_policy = steal_policy;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_drop_page_cache(mut self, drop_page_cache: bool) -> Self {
        self.drop_page_cache = drop_page_cache;
        self
    }
}
