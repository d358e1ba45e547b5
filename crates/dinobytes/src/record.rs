// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record instances.

use crate::error::{CodecError, Result};
use crate::registry::RecordDescriptor;
use crate::value::Value;
use std::sync::Arc;

/// An instance of one registered record type.
///
/// Carries the descriptor it was built under; field values are stored in
/// the descriptor's field order. Built through
/// [`RecordType::instantiate`](crate::RecordType::instantiate) or by decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    descriptor: Arc<RecordDescriptor>,
    fields: Vec<Value>,
}

impl Record {
    /// Arity must already match the descriptor.
    pub(crate) fn from_parts(descriptor: Arc<RecordDescriptor>, fields: Vec<Value>) -> Self {
        debug_assert_eq!(descriptor.arity(), fields.len());
        Self { descriptor, fields }
    }

    pub fn descriptor(&self) -> &Arc<RecordDescriptor> {
        &self.descriptor
    }

    pub fn type_id(&self) -> u32 {
        self.descriptor.type_id()
    }

    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Field values in declaration order.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.descriptor
            .field_index(name)
            .and_then(|i| self.fields.get(i))
    }

    /// Mutable field access. Values stored this way are canonicalised on
    /// encode, not here.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let index = self.descriptor.field_index(name)?;
        self.fields.get_mut(index)
    }

    /// Replace a field value by name, returning the previous one.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<Value> {
        let value: Value = value.into();
        let value = value.into_canonical()?;
        let slot = self
            .get_mut(name)
            .ok_or_else(|| CodecError::FieldNotFound(name.to_string()))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Nested record stored directly in a field.
    pub fn record(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(Value::as_record)
    }
}
