/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A type-erased box for carrying the operation's input/output across phase boundaries,
//! where the concrete type is known to the caller but not to the generic pipeline
//! machinery.

use std::any::Any;

/// Holds any `Send + Sync + 'static` value behind a type-erased handle, downcast back to
/// its concrete type by whichever phase produced or expects it (`Initialize` stores the
/// caller's input this way; `Deserialize` produces the modeled output this way).
#[derive(Debug)]
pub struct TypeErasedBox {
    inner: Box<dyn Any + Send + Sync>,
}

impl TypeErasedBox {
    /// Erases `value`'s concrete type.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    /// Recovers the original value if it was erased from type `T`, or returns `self`
    /// unchanged if it wasn't.
    pub fn downcast<T: 'static>(self) -> Result<Box<T>, Self> {
        match self.inner.downcast() {
            Ok(t) => Ok(t),
            Err(inner) => Err(Self { inner }),
        }
    }

    /// Borrows the value as `T`, if it was erased from that type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Mutably borrows the value as `T`, if it was erased from that type.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut()
    }
}
