/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Descriptor-driven field dispatch: given an [`ObjectDescriptor`] describing the shape
//! a generated type expects, [`FieldDispatcher`] turns the next object key in a
//! [`crate::reader::JsonTokenReader`] into a field index a generated deserializer can
//! `match` on, skipping unknown or explicitly ignored fields automatically.

use crate::error::DeserializeError;
use crate::reader::JsonTokenReader;
use crate::token::JsonToken;

/// A trait attached to a [`FieldDescriptor`] that changes how it's matched, independent
/// of the wire shape it deserializes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTrait {
    /// This field's JSON name differs from what the protocol would derive from the
    /// member name by default (already reflected in `serial_name`, but callers that
    /// need to know *why* can check for this trait).
    JsonName,
    /// This field is ignored even when present in the model and even when its key
    /// matches; see [`IgnoreKey`].
    Ignore,
}

/// One field a generated type expects to find in a JSON object, keyed by its wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The index a generated `match` dispatches on; stable for the lifetime of one
    /// model version, not necessarily contiguous.
    pub index: usize,
    /// The exact JSON object key this field is serialized under.
    pub serial_name: &'static str,
    /// Traits modifying how this field is matched.
    pub traits: &'static [FieldTrait],
}

/// The full set of fields a generated object deserializer expects, used to resolve each
/// JSON key encountered to a `FieldDescriptor::index` (or report it as unknown).
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    fields: &'static [FieldDescriptor],
}

impl ObjectDescriptor {
    /// Describes an object type by its full field list.
    pub const fn new(fields: &'static [FieldDescriptor]) -> Self {
        Self { fields }
    }

    fn find(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.serial_name == name)
    }
}

/// A key that should be skipped regardless of whether the model declares a field with
/// that name — used to drop fields a service started sending that a given generated
/// type predates, without that type needing to know the field ever existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoreKey(pub &'static str);

/// The outcome of resolving one JSON object key against an [`ObjectDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch {
    /// The key matched a known field; dispatch on this index.
    Field(usize),
    /// The key matched no known field (or matched one explicitly ignored); the reader
    /// has already been advanced past the key and its skipped value.
    Unknown,
    /// The object has no more keys; `EndObject` was consumed.
    EndOfObject,
}

/// Drives a [`JsonTokenReader`] positioned just after `StartObject`, resolving each key
/// against `descriptor` and recursively skipping unknown or ignored field values.
pub struct FieldDispatcher<'d> {
    descriptor: &'d ObjectDescriptor,
    ignore: &'d [IgnoreKey],
}

impl<'d> FieldDispatcher<'d> {
    /// Builds a dispatcher for `descriptor`, additionally forcing every key in `ignore`
    /// to be skipped regardless of whether `descriptor` declares it.
    pub fn new(descriptor: &'d ObjectDescriptor, ignore: &'d [IgnoreKey]) -> Self {
        Self { descriptor, ignore }
    }

    /// Advances `reader` past the next key (and, if unknown/ignored, its value),
    /// returning which field to populate, or that the object is exhausted.
    pub fn next_field(&self, reader: &mut JsonTokenReader<'_>) -> Result<FieldMatch, DeserializeError> {
        match reader.next_token()? {
            JsonToken::EndObject => Ok(FieldMatch::EndOfObject),
            JsonToken::Name(name) => {
                if self.ignore.iter().any(|k| k.0 == name) {
                    reader.skip_next()?;
                    return Ok(FieldMatch::Unknown);
                }
                match self.descriptor.find(&name) {
                    Some(field) if !field.traits.contains(&FieldTrait::Ignore) => Ok(FieldMatch::Field(field.index)),
                    Some(_) => {
                        reader.skip_next()?;
                        Ok(FieldMatch::Unknown)
                    }
                    None => {
                        reader.skip_next()?;
                        Ok(FieldMatch::Unknown)
                    }
                }
            }
            other => Err(DeserializeError::custom(format!(
                "expected an object key or end of object, found {other:?}"
            ))),
        }
    }
}
