//! Settings for a client session.
//!
//! Read with the `config` crate from an optional `TodoEndpoints.{toml,json,yaml}`
//! in the working directory, then from `TODO_ENDPOINTS_*` environment
//! variables (`TODO_ENDPOINTS_BASE_URL`, `TODO_ENDPOINTS_REFRESH_DELAY_MS`, ...).
//! Later sources win.

use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::controller::ControllerConfig;
use crate::error::ApiError;
use crate::types::ApiDescriptor;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub api: String,
    pub version: String,
    pub refresh_delay_ms: u64,
    pub list_retries: u32,
    pub refresh_after_toggle: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ApiError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("TodoEndpoints").required(false))
                .add_source(environment()),
        )
    }

    /// Layer defaults under whatever sources `builder` carries.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ApiError> {
        let settings = builder
            .set_default("base_url", "http://localhost:3000")?
            .set_default("api", "todo")?
            .set_default("version", "v1")?
            .set_default("refresh_delay_ms", 500_i64)?
            .set_default("list_retries", 2_i64)?
            .set_default("refresh_after_toggle", false)?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn api(&self) -> ApiDescriptor {
        ApiDescriptor::new(&self.api, &self.version)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            refresh_delay: Duration::from_millis(self.refresh_delay_ms),
            list_retries: self.list_retries,
            refresh_after_toggle: self.refresh_after_toggle,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TODO_ENDPOINTS")
}
