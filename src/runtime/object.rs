//! Objects and classes
//!
//! An [`Object`] is a handle to some state `S` plus its own function slots.
//! A [`Class`] is a handle to a method table shared by every object created
//! from it. Looking up a slot on an object checks its own slots first and
//! then its class, and writing a slot on an object only ever touches the
//! object's own slots. Intercepting through the class therefore reaches every
//! instance, while intercepting through an object shadows the class method
//! for that object alone.
//!
//! # Example
//!
//! ```
//! use exedore::abi::Value;
//! use exedore::runtime::Class;
//!
//! struct Pair { left: i64, right: i64 }
//!
//! let pairs = Class::<Pair>::new("Pair").method("sum", |this, _args| {
//!     let pair = this.read();
//!     Ok(Value::S64(pair.left + pair.right))
//! });
//!
//! let pair = pairs.instantiate(Pair { left: 2, right: 3 });
//! assert_eq!(pair.call("sum", vec![]).unwrap(), Value::S64(5));
//! ```

use super::{Anchor, CallError, CallResult, Function, MethodTable, Slots};
use crate::abi::Args;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::{Arc, Weak};

// ============================================================================
// Class
// ============================================================================

struct ClassInner<S> {
    name: String,
    methods: RwLock<MethodTable<Object<S>>>,
}

/// A named, shared method table.
pub struct Class<S> {
    inner: Arc<ClassInner<S>>,
}

impl<S: Send + Sync + 'static> Class<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ClassInner {
                name: name.into(),
                methods: RwLock::new(MethodTable::new()),
            }),
        }
    }

    /// Register a method shared by every instance.
    pub fn method<F>(self, name: &str, method: F) -> Self
    where
        F: Fn(&Object<S>, Args) -> CallResult + Send + Sync + 'static,
    {
        self.inner.methods.write().insert(name, method);
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn method_names(&self) -> Vec<String> {
        self.inner.methods.read().names()
    }

    /// Create an object whose slot lookups fall back to this class.
    pub fn instantiate(&self, state: S) -> Object<S> {
        Object::from_parts(state, Some(self.clone()))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S> Clone for Class<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Class<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("methods", &self.inner.methods.read().names())
            .finish()
    }
}

/// Classes never pin a receiver: class-wide advice always sees the instance.
impl<S: Send + Sync + 'static> Slots<Object<S>> for Class<S> {
    fn get(&self, name: &str) -> Option<Function<Object<S>>> {
        self.inner.methods.read().get(name)
    }

    fn set(&mut self, name: &str, function: Function<Object<S>>) {
        self.inner.methods.write().set(name, function);
    }
}

// ============================================================================
// Object
// ============================================================================

struct ObjectInner<S> {
    state: RwLock<S>,
    slots: RwLock<MethodTable<Object<S>>>,
    class: Option<Class<S>>,
}

/// Handle to an object: state plus its own slots. Clones share both.
pub struct Object<S> {
    inner: Arc<ObjectInner<S>>,
}

impl<S: Send + Sync + 'static> Object<S> {
    /// An object with no class; every slot is its own.
    pub fn new(state: S) -> Self {
        Self::from_parts(state, None)
    }

    fn from_parts(state: S, class: Option<Class<S>>) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                state: RwLock::new(state),
                slots: RwLock::new(MethodTable::new()),
                class,
            }),
        }
    }

    /// Register a method on this object only.
    pub fn with_method<F>(self, name: &str, method: F) -> Self
    where
        F: Fn(&Object<S>, Args) -> CallResult + Send + Sync + 'static,
    {
        self.inner.slots.write().insert(name, method);
        self
    }

    pub fn class(&self) -> Option<&Class<S>> {
        self.inner.class.as_ref()
    }

    /// True when `name` is one of the object's own slots (not inherited)
    pub fn has_own(&self, name: &str) -> bool {
        self.inner.slots.read().contains(name)
    }

    /// Shared access to the object's state.
    ///
    /// Do not hold the guard across a call that writes the same state.
    pub fn read(&self) -> RwLockReadGuard<'_, S> {
        self.inner.state.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.inner.state.write()
    }

    /// Resolve `name` and invoke it with this object as receiver.
    pub fn call(&self, name: &str, args: Args) -> CallResult {
        let function = self
            .get(name)
            .ok_or_else(|| CallError::MethodNotFound(name.to_string()))?;
        function.call(self, args)
    }

    pub fn downgrade(&self) -> WeakObject<S> {
        WeakObject {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S> Clone for Object<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Object<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.inner.class.as_ref().map(|c| c.inner.name.clone()))
            .field("slots", &self.inner.slots.read().names())
            .finish()
    }
}

impl<S: Send + Sync + 'static> Slots<Object<S>> for Object<S> {
    fn get(&self, name: &str) -> Option<Function<Object<S>>> {
        // Own slot guard is dropped before the class lock is taken.
        let own = self.inner.slots.read().get(name);
        own.or_else(|| self.inner.class.as_ref().and_then(|class| class.get(name)))
    }

    fn set(&mut self, name: &str, function: Function<Object<S>>) {
        self.inner.slots.write().set(name, function);
    }

    /// Pins to this object through a weak reference, so a layer stored in the
    /// object's own slots does not keep the object alive.
    fn anchor(&self) -> Anchor<Object<S>> {
        let weak = self.downgrade();
        Anchor::pinned(move || weak.upgrade())
    }
}

/// Non-owning handle to an [`Object`].
pub struct WeakObject<S> {
    inner: Weak<ObjectInner<S>>,
}

impl<S> WeakObject<S> {
    pub fn upgrade(&self) -> Option<Object<S>> {
        self.inner.upgrade().map(|inner| Object { inner })
    }
}

impl<S> Clone for WeakObject<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for WeakObject<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
