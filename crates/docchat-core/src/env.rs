//! Helpers for reading configuration from environment variables
//!
//! Config structs take a lookup function instead of reading `std::env`
//! directly so tests can feed them a plain map.

use std::str::FromStr;

use crate::{Error, Result};

/// Read a variable from the process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Fetch a variable, treating blank values as unset
pub fn read<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Fetch a variable or fall back to `default`
pub fn read_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    read(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when unset
pub fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match read(lookup, key) {
        Some(raw) => raw.parse::<T>().map_err(|e| {
            Error::Configuration(format!("Invalid value '{}' for {}: {}", raw, key, e))
        }),
        None => Ok(default),
    }
}
