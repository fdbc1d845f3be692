//! Value type definitions for the digest core.
//!
//! This module defines the `Value` enum which represents anything a watch
//! function can observe. Primitives are plain data. Composites (`List`, `Map`)
//! are shared handles: cloning a composite value clones the handle, so two
//! clones observe each other's in-place mutations, exactly like a reference
//! held by caller code.
//!
//! Two comparisons are offered:
//!
//! - [`Value::identical`]: primitive equality for primitives, handle identity
//!   for composites.
//! - [`Value::deep_eq`]: recursive structural equality.
//!
//! [`Value::snapshot`] produces an independent deep copy that shares no handle
//! with the original.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use hashbrown::{HashMap, HashSet};

/// Shared, in-place mutable list.
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared, in-place mutable string-keyed map.
pub type MapRef = Rc<RefCell<HashMap<String, Value>>>;

/// A value observed by a watcher.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Shared ordered list
    List(ListRef),
    /// Shared string-keyed map
    Map(MapRef),
}

impl Value {
    /// Creates a list value owning a fresh handle.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Creates a map value owning a fresh handle.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for `List` and `Map`.
    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is an Int64, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the f64 value if this is a Float64, None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the list handle if this is a List.
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the map handle if this is a Map.
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the list contents.
    ///
    /// Panics if the list is currently mutably borrowed.
    pub fn items(&self) -> Option<Ref<'_, Vec<Value>>> {
        self.as_list().map(|l| l.borrow())
    }

    /// Mutably borrows the list contents, for in-place mutation.
    pub fn items_mut(&self) -> Option<RefMut<'_, Vec<Value>>> {
        self.as_list().map(|l| l.borrow_mut())
    }

    /// Mutably borrows the map entries, for in-place mutation.
    pub fn entries_mut(&self) -> Option<RefMut<'_, HashMap<String, Value>>> {
        self.as_map().map(|m| m.borrow_mut())
    }

    /// Identity comparison.
    ///
    /// Primitives compare by value; composites compare by handle, so two
    /// structurally equal lists built separately are not identical. NaN is
    /// identical to NaN so that a watcher returning NaN can settle.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            _ => primitive_eq(self, other),
        }
    }

    /// Structural comparison, recursing into composites.
    ///
    /// Cyclic composites are supported: a pair of handles met again while
    /// it is still being compared counts as equal, so two cycles compare
    /// equal when they unfold to the same structure.
    pub fn deep_eq(&self, other: &Value) -> bool {
        let mut in_progress = HashSet::new();
        deep_eq_with(self, other, &mut in_progress)
    }

    /// Deep copy: every composite in the result gets a fresh handle.
    ///
    /// Handles shared inside `self`, cycles included, stay shared in the
    /// copy.
    pub fn snapshot(&self) -> Value {
        let mut copies = HashMap::new();
        snapshot_with(self, &mut copies)
    }
}

/// Address of a composite handle, used to track visited handles.
type HandleAddr = *const ();

fn list_addr(list: &ListRef) -> HandleAddr {
    Rc::as_ptr(list) as HandleAddr
}

fn map_addr(map: &MapRef) -> HandleAddr {
    Rc::as_ptr(map) as HandleAddr
}

fn deep_eq_with(a: &Value, b: &Value, in_progress: &mut HashSet<(HandleAddr, HandleAddr)>) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let key = (list_addr(x), list_addr(y));
            if !in_progress.insert(key) {
                return true;
            }
            let (xs, ys) = (x.borrow(), y.borrow());
            let equal = xs.len() == ys.len()
                && xs.iter().zip(ys.iter()).all(|(p, q)| deep_eq_with(p, q, in_progress));
            in_progress.remove(&key);
            equal
        }
        (Value::Map(x), Value::Map(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let key = (map_addr(x), map_addr(y));
            if !in_progress.insert(key) {
                return true;
            }
            let (xs, ys) = (x.borrow(), y.borrow());
            let equal = xs.len() == ys.len()
                && xs.iter().all(|(k, v)| {
                    ys.get(k)
                        .map(|w| deep_eq_with(v, w, in_progress))
                        .unwrap_or(false)
                });
            in_progress.remove(&key);
            equal
        }
        _ => primitive_eq(a, b),
    }
}

fn snapshot_with(value: &Value, copies: &mut HashMap<HandleAddr, Value>) -> Value {
    match value {
        Value::List(items) => {
            let key = list_addr(items);
            if let Some(copy) = copies.get(&key) {
                return copy.clone();
            }
            // Registered before recursing so a cycle resolves to this copy.
            let copy = Value::list(Vec::new());
            copies.insert(key, copy.clone());
            let copied: Vec<Value> = items
                .borrow()
                .iter()
                .map(|v| snapshot_with(v, copies))
                .collect();
            if let Some(mut target) = copy.items_mut() {
                *target = copied;
            }
            copy
        }
        Value::Map(entries) => {
            let key = map_addr(entries);
            if let Some(copy) = copies.get(&key) {
                return copy.clone();
            }
            let copy = Value::Map(Rc::new(RefCell::new(HashMap::new())));
            copies.insert(key, copy.clone());
            let copied: HashMap<String, Value> = entries
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), snapshot_with(v, copies)))
                .collect();
            if let Some(mut target) = copy.entries_mut() {
                *target = copied;
            }
            copy
        }
        other => other.clone(),
    }
}

fn primitive_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Int64(a), Value::Int64(b)) => a == b,
        (Value::Float64(a), Value::Float64(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

/// Structural equality, so tests and callers can use `==` on snapshots.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.deep_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = RefCell::new(Vec::new());
        Tracked {
            value: self,
            open: &open,
        }
        .fmt(f)
    }
}

/// Debug view that prints a composite already being printed as `[...]` or
/// `{...}` instead of recursing into it again.
struct Tracked<'a> {
    value: &'a Value,
    open: &'a RefCell<Vec<HandleAddr>>,
}

impl Tracked<'_> {
    fn child<'b>(&'b self, value: &'b Value) -> Tracked<'b> {
        Tracked {
            value,
            open: self.open,
        }
    }

    fn is_open(&self, key: HandleAddr) -> bool {
        self.open.borrow().contains(&key)
    }
}

impl fmt::Debug for Tracked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => write!(f, "Null"),
            Value::Boolean(v) => write!(f, "Boolean({})", v),
            Value::Int64(v) => write!(f, "Int64({})", v),
            Value::Float64(v) => write!(f, "Float64({})", v),
            Value::String(v) => write!(f, "String({:?})", v),
            Value::List(list) => {
                let key = list_addr(list);
                if self.is_open(key) {
                    return write!(f, "[...]");
                }
                let Ok(items) = list.try_borrow() else {
                    return write!(f, "List(<borrowed>)");
                };
                self.open.borrow_mut().push(key);
                let result = f
                    .debug_list()
                    .entries(items.iter().map(|v| self.child(v)))
                    .finish();
                self.open.borrow_mut().pop();
                result
            }
            Value::Map(map) => {
                let key = map_addr(map);
                if self.is_open(key) {
                    return write!(f, "{{...}}");
                }
                let Ok(entries) = map.try_borrow() else {
                    return write!(f, "Map(<borrowed>)");
                };
                self.open.borrow_mut().push(key);
                let result = f
                    .debug_map()
                    .entries(entries.iter().map(|(k, v)| (k, self.child(v))))
                    .finish();
                self.open.borrow_mut().pop();
                result
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            composite => write!(f, "{:?}", composite),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::list(v)
    }
}
