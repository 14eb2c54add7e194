//! Shared types, errors, and configuration for Mercato.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - JWT claims, token service, and the role capability table

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;


pub use auth::{Capability, Claims, Role};
pub use config::{AppConfig, JwtConfig, LoggingConfig};
pub use error::AppError;
pub use jwt::{JwtError, JwtService};
