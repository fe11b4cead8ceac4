//! Configuration utility functions
//!
//! Helpers for overlaying environment values on configuration defaults.
//! Values are read through a lookup function so the same code serves
//! `std::env` and in-memory maps.

use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Get a f64 value from the lookup or use the default
pub(super) fn get_env_f64<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => match val.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => parsed,
            _ => {
                log::warn!("Ignoring unparseable value '{val}' for {key}, using {default}");
                default
            }
        },
        None => default,
    }
}

/// Get a u32 value from the lookup or use the default
pub(super) fn get_env_u32<F>(lookup: &F, key: &str, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable value '{val}' for {key}, using {default}");
            default
        }),
        None => default,
    }
}

/// Parse a value with its `FromStr` impl, propagating parse failures
pub(super) fn get_env_parsed<F, T>(lookup: &F, key: &str, default: T) -> CoreResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = CoreError>,
{
    match lookup(key) {
        Some(val) => val.parse(),
        None => Ok(default),
    }
}
