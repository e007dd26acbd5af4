//! Core engine configuration

pub mod config;

pub use config::{
    ApplicationConfig, Config, ConfigError, CullingConfig, EditConfig, EngineConfig, GridConfig, PoolConfig,
};
