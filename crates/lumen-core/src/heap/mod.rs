//! Object heap for the Lumen virtual machine
//!
//! Every heap object lives in a single arena owned by [`Heap`]. Values refer
//! to objects through [`ObjRef`] handles, which are plain indices into that
//! arena and never own anything. Dropping the heap releases every object it
//! ever allocated, which is how the interpreter frees memory on shutdown.
//!
//! Strings are interned: [`Heap::copy_string`] and [`Heap::take_string`]
//! return the existing object when one with identical content already
//! exists, so handle equality doubles as string equality.
//!
//! The arena is enumerable through [`Heap::objects`], which is the hook a
//! collector would need to walk live objects.

#![allow(clippy::cast_possible_truncation)] // handles are u32 indices

mod table;

pub use table::Table;

use std::fmt;

use tracing::trace;

use crate::bytecode::Value;

/// FNV-1a 32-bit offset basis
pub const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
/// FNV-1a 32-bit prime
pub const FNV_PRIME: u32 = 16_777_619;

/// Hash a string with 32-bit FNV-1a over its UTF-8 bytes
#[must_use]
pub fn hash_string(chars: &str) -> u32 {
    chars.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Discriminant of a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    String,
}

impl ObjKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ObjKind::String => "string",
        }
    }
}

/// Non-owning handle to an object in a [`Heap`]
///
/// The handle carries the object's kind and cached hash so that type checks
/// and hash-table probing never need to consult the arena. Two handles are
/// equal exactly when they name the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: u32,
    hash: u32,
    kind: ObjKind,
}

impl ObjRef {
    pub(crate) const fn new(index: u32, hash: u32, kind: ObjKind) -> Self {
        Self { index, hash, kind }
    }

    /// Position of the object in its heap's registry
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Cached hash of the object's content
    #[must_use]
    pub const fn hash(self) -> u32 {
        self.hash
    }

    #[must_use]
    pub const fn kind(self) -> ObjKind {
        self.kind
    }
}

/// An immutable interned string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjString {
    chars: Box<str>,
    hash: u32,
}

impl ObjString {
    fn new(chars: Box<str>, hash: u32) -> Self {
        Self { chars, hash }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.chars
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[must_use]
    pub fn hash(&self) -> u32 {
        self.hash
    }
}

/// A heap-allocated object
#[derive(Debug, Clone, PartialEq)]
pub enum Obj {
    String(ObjString),
}

impl Obj {
    #[must_use]
    pub fn kind(&self) -> ObjKind {
        match self {
            Obj::String(_) => ObjKind::String,
        }
    }

    #[must_use]
    pub fn as_string(&self) -> Option<&ObjString> {
        match self {
            Obj::String(s) => Some(s),
        }
    }

    fn hash(&self) -> u32 {
        match self {
            Obj::String(s) => s.hash,
        }
    }

    fn to_str(&self) -> &str {
        match self {
            Obj::String(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Obj::String(s) => f.write_str(s.as_str()),
        }
    }
}

/// Owner of every object allocated while compiling and running code
#[derive(Debug, Default)]
pub struct Heap {
    /// Registry of all live objects, indexed by `ObjRef::index`
    objects: Vec<Obj>,
    /// Intern table; keys are the canonical string objects, values are nil
    strings: Table,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a borrowed string, allocating only if no equal string exists
    pub fn copy_string(&mut self, chars: &str) -> ObjRef {
        let hash = hash_string(chars);
        if let Some(interned) = self.find_interned(chars, hash) {
            return interned;
        }
        self.allocate_string(chars.into(), hash)
    }

    /// Intern an owned string, reusing its buffer when it is new
    ///
    /// If an equal string is already interned the buffer is dropped and the
    /// existing handle is returned.
    pub fn take_string(&mut self, chars: String) -> ObjRef {
        let hash = hash_string(&chars);
        if let Some(interned) = self.find_interned(&chars, hash) {
            return interned;
        }
        self.allocate_string(chars.into_boxed_str(), hash)
    }

    fn find_interned(&self, chars: &str, hash: u32) -> Option<ObjRef> {
        let objects = &self.objects;
        self.strings
            .find_string(chars, hash, |key| objects[key.index()].to_str())
    }

    fn allocate_string(&mut self, chars: Box<str>, hash: u32) -> ObjRef {
        let handle = self.allocate(Obj::String(ObjString::new(chars, hash)));
        self.strings.set(handle, Value::Nil);
        handle
    }

    /// Register a new object and hand back its handle
    fn allocate(&mut self, obj: Obj) -> ObjRef {
        let handle = ObjRef::new(self.objects.len() as u32, obj.hash(), obj.kind());
        trace!(index = handle.index, kind = obj.kind().name(), "allocate object");
        self.objects.push(obj);
        handle
    }

    /// Resolve a handle
    ///
    /// # Panics
    /// Panics if `handle` was produced by a different heap.
    #[must_use]
    pub fn get(&self, handle: ObjRef) -> &Obj {
        &self.objects[handle.index()]
    }

    /// Content of a string object
    #[must_use]
    pub fn as_str(&self, handle: ObjRef) -> &str {
        self.get(handle).to_str()
    }

    /// Number of objects currently owned by the heap
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Walk every registered object
    pub fn objects(&self) -> impl Iterator<Item = (ObjRef, &Obj)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, obj)| (ObjRef::new(index as u32, obj.hash(), obj.kind()), obj))
    }

    /// The intern table
    #[must_use]
    pub fn strings(&self) -> &Table {
        &self.strings
    }
}
