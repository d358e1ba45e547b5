// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration.
//!
//! [`CodecConfig::default`] is fixed. [`CodecConfig::from_env`] applies
//! these overrides on top of it:
//!
//! - `DINOBYTES_MAX_DEPTH`: maximum nesting of records and containers (default: 64)
//! - `DINOBYTES_RECOVER_NESTED`: `0`/`false` disables nested-record recovery (default: on)
//! - `DINOBYTES_MAX_CONTAINER_LEN`: maximum elements per sequence/map and bytes
//!   per string on decode (default: 16 Mi)

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default per-container length limit on decode.
pub const DEFAULT_MAX_CONTAINER_LEN: usize = 16 * 1024 * 1024;

/// Limits and switches for [`TaggedCodec`](crate::TaggedCodec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Records and containers nested deeper than this are rejected.
    pub max_depth: usize,

    /// Reinterpret byte strings as nested envelopes on decode.
    pub recover_nested: bool,

    /// Largest length prefix accepted by the decoder.
    pub max_container_len: usize,
}

impl Default for CodecConfig {
    /// Built-in limits with recovery on. The environment is not consulted.
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            recover_nested: true,
            max_container_len: DEFAULT_MAX_CONTAINER_LEN,
        }
    }
}

impl CodecConfig {
    /// Built-in defaults overridden by `DINOBYTES_*` environment variables.
    ///
    /// Unset or unparsable variables keep the built-in value.
    pub fn from_env() -> Self {
        let builtin = Self::default();
        Self {
            max_depth: std::env::var("DINOBYTES_MAX_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(builtin.max_depth),
            recover_nested: std::env::var("DINOBYTES_RECOVER_NESTED")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(builtin.recover_nested),
            max_container_len: std::env::var("DINOBYTES_MAX_CONTAINER_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(builtin.max_container_len),
        }
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable nested-record recovery.
    pub fn with_recover_nested(mut self, recover_nested: bool) -> Self {
        self.recover_nested = recover_nested;
        self
    }

    /// Set the decode length limit.
    pub fn with_max_container_len(mut self, max_container_len: usize) -> Self {
        self.max_container_len = max_container_len;
        self
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
