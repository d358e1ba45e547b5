// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide registry slot.
//!
//! Most code should own a [`TypeRegistry`] per serialization context. The
//! slot is for programs that want one registry shared by every module,
//! with explicit setup and teardown.

use crate::registry::TypeRegistry;
use arc_swap::ArcSwapOption;
use std::sync::{Arc, OnceLock};

static GLOBAL_REGISTRY: OnceLock<ArcSwapOption<TypeRegistry>> = OnceLock::new();

fn slot() -> &'static ArcSwapOption<TypeRegistry> {
    GLOBAL_REGISTRY.get_or_init(ArcSwapOption::empty)
}

/// Install `registry` as the global registry, replacing any previous one.
pub fn init_global(registry: TypeRegistry) -> Arc<TypeRegistry> {
    let registry = Arc::new(registry);
    if let Some(previous) = slot().swap(Some(registry.clone())) {
        log::warn!(
            "[dinobytes] global registry replaced ({} types dropped)",
            previous.len()
        );
    }
    registry
}

/// Current global registry, if one is installed.
pub fn global() -> Option<Arc<TypeRegistry>> {
    slot().load_full()
}

/// Remove the global registry and return it.
pub fn teardown_global() -> Option<Arc<TypeRegistry>> {
    slot().swap(None)
}
