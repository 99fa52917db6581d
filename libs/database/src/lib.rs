//! Database connectors for PostgreSQL and Redis.
//!
//! Provides a unified interface for connecting to the databases the pipeline
//! depends on, with startup retry and env-backed configuration.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL support with SeaORM
//! - `redis` (default) - Redis support
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Examples
//!
//! ```ignore
//! use database::redis;
//!
//! let conn = redis::connect("redis://127.0.0.1:6379").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;
