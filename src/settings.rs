use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

use crate::driver::Paging;

pub const DEFAULT_BASE_URL: &str = "http://tunearch.org";

/// Runtime settings. Every key can be overridden with a `TUNEARCH_` env var.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub out_dir: PathBuf,
    pub page_size: usize,
    pub max_pages_per_code: usize,
    pub progress: bool,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_builder(Config::builder().add_source(Environment::with_prefix("TUNEARCH").try_parsing(true)))
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("out_dir", ".")?
            .set_default("page_size", 10_i64)?
            .set_default("max_pages_per_code", 10_i64)?
            .set_default("progress", true)?
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.page_size >= 1, "page_size must be at least 1");
        ensure!(self.max_pages_per_code >= 1, "max_pages_per_code must be at least 1");
        Ok(())
    }

    pub fn paging(&self) -> Paging {
        Paging {
            page_size: self.page_size,
            max_pages_per_code: self.max_pages_per_code,
        }
    }
}
