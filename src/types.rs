/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains some common types and low-level structures used throughout the library:
//! cursors, handles, and the maps that make up the various indices.

use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::StamError;

/// A cursor points to a specific point in a text. I
/// Used to select offsets. Units are unicode codepoints (not bytes!)
/// and are 0-indexed.
///
/// The cursor can be either begin-aligned or end-aligned. Where BeginAlignedCursor(0)
/// is the first unicode codepoint in a referenced text, and EndAlignedCursor(0) the position right after the last one.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(tag = "@type", content = "value")]
pub enum Cursor {
    /// Cursor relative to the start of a text. Has a value of 0 or higher
    #[serde(rename = "BeginAlignedCursor")]
    BeginAligned(usize),
    /// Cursor relative to the end of a text. Has a value of 0 or lower. The last character of a text begins at EndAlignedCursor(-1) and ends at EndAlignedCursor(0)
    #[serde(rename = "EndAlignedCursor")]
    EndAligned(isize),
}

impl From<usize> for Cursor {
    fn from(cursor: usize) -> Self {
        Self::BeginAligned(cursor)
    }
}

impl TryFrom<isize> for Cursor {
    type Error = StamError;
    fn try_from(cursor: isize) -> Result<Self, Self::Error> {
        if cursor > 0 {
            Err(StamError::ValueError(
                cursor.to_string(),
                "Cursor is a signed integer and converts to EndAlignedCursor, expected a value <= 0. Convert from an unsigned integer for a normal BeginAlignedCursor",
            ))
        } else {
            Ok(Self::EndAligned(cursor))
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BeginAligned(cursor) => write!(f, "{}", cursor),
            Self::EndAligned(0) => write!(f, "-0"),
            Self::EndAligned(cursor) => write!(f, "{}", cursor),
        }
    }
}

impl Cursor {
    pub fn is_beginaligned(&self) -> bool {
        matches!(self, Self::BeginAligned(_))
    }

    pub fn is_endaligned(&self) -> bool {
        matches!(self, Self::EndAligned(_))
    }
}

/// The handle trait is implemented on various handle types. They have in common that refer to the internal id
/// a [`crate::Storable`] item in a [`crate::Store`] by index. Types implementing this are lightweight and do not borrow anything, they can be passed and copied freely.
/// To get an actual reference to the item from a handle type, call the `get()` method on the store that holds it.
/// This is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))] //<-- this ensures nobody outside this crate can implement the trait
pub trait Handle:
    Clone + Copy + core::fmt::Debug + PartialEq + Eq + PartialOrd + Ord + Hash
{
    /// Create a new handle for an internal ID. You shouldn't need to use this as handles will always be generated for you by higher-level functions.
    fn new(intid: usize) -> Self;
    /// Returns the internal index for this handle
    fn as_usize(&self) -> usize;
}

/// A map mapping public IDs to internal ids, implemented as a HashMap.
/// Used to resolve public IDs to internal ones.
#[derive(Debug, Clone)]
pub struct IdMap<HandleType> {
    /// The actual map
    pub(crate) data: HashMap<String, HandleType>,

    /// A prefix that automatically generated IDs will get when added to this map
    pub(crate) autoprefix: String,
}

impl<HandleType> Default for IdMap<HandleType>
where
    HandleType: Handle,
{
    fn default() -> Self {
        Self {
            data: HashMap::new(),
            autoprefix: "_".to_string(),
        }
    }
}

impl<HandleType> IdMap<HandleType>
where
    HandleType: Handle,
{
    pub fn new(autoprefix: String) -> Self {
        Self {
            autoprefix,
            ..Self::default()
        }
    }

    /// Sets a prefix that automatically generated IDs will get when added to this map
    pub fn set_autoprefix(&mut self, autoprefix: String) {
        self.autoprefix = autoprefix;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// This models relations or 'edges' in graph terminology, between handles. It acts as a reverse index is used for various purposes.
#[derive(Debug, Clone)]
pub struct RelationMap<A, B> {
    /// The actual map
    pub(crate) data: Vec<Vec<B>>,
    _marker: PhantomData<A>, //zero-size, only needed to bind generic A
}

impl<A, B> Default for RelationMap<A, B>
where
    A: Handle,
    B: Handle,
{
    fn default() -> Self {
        Self {
            data: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<A, B> RelationMap<A, B>
where
    A: Handle,
    B: Handle,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a relation into the map, duplicates are ignored
    pub fn insert(&mut self, x: A, y: B) {
        if x.as_usize() >= self.data.len() {
            //expand the map
            self.data.resize_with(x.as_usize() + 1, Default::default);
        }
        let values = &mut self.data[x.as_usize()];
        if !values.contains(&y) {
            values.push(y);
        }
    }

    /// Remove a relation from the map
    pub fn remove(&mut self, x: A, y: B) {
        if let Some(values) = self.data.get_mut(x.as_usize()) {
            if let Some(pos) = values.iter().position(|z| *z == y) {
                values.remove(pos); //note: this shifts the array and may take O(n)
            }
        }
    }

    /// Remove all relations for `x`
    pub fn remove_all(&mut self, x: A) {
        if let Some(values) = self.data.get_mut(x.as_usize()) {
            values.clear();
        }
    }

    pub fn get(&self, x: A) -> Option<&Vec<B>> {
        self.data.get(x.as_usize())
    }

    pub fn count(&self, x: A) -> usize {
        self.data.get(x.as_usize()).map(|v| v.len()).unwrap_or(0)
    }

    /// Returns the total number of relations in this map
    pub fn totalcount(&self) -> usize {
        self.data.iter().map(|v| v.len()).sum()
    }
}

impl<A, B> Extend<(A, B)> for RelationMap<A, B>
where
    A: Handle,
    B: Handle,
{
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (A, B)>,
    {
        for (x, y) in iter {
            self.insert(x, y);
        }
    }
}

/// A relation map with a two-part key, used for example to map (resource, textselection) to annotations.
#[derive(Debug, Clone)]
pub struct TripleRelationMap<A, B, C> {
    /// The actual map
    pub(crate) data: Vec<RelationMap<B, C>>,
    _marker: PhantomData<A>,
}

impl<A, B, C> Default for TripleRelationMap<A, B, C> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<A, B, C> TripleRelationMap<A, B, C>
where
    A: Handle,
    B: Handle,
    C: Handle,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, x: A, y: B, z: C) {
        if x.as_usize() >= self.data.len() {
            //expand the map
            self.data.resize_with(x.as_usize() + 1, Default::default);
        }
        self.data[x.as_usize()].insert(y, z);
    }

    pub fn remove(&mut self, x: A, y: B, z: C) {
        if let Some(map) = self.data.get_mut(x.as_usize()) {
            map.remove(y, z);
        }
    }

    /// Remove all relations under the first key
    pub fn remove_second(&mut self, x: A) {
        if let Some(map) = self.data.get_mut(x.as_usize()) {
            *map = RelationMap::default();
        }
    }

    pub fn get(&self, x: A, y: B) -> Option<&Vec<C>> {
        if let Some(v) = self.data.get(x.as_usize()) {
            v.get(y)
        } else {
            None
        }
    }

    pub fn count(&self, x: A, y: B) -> usize {
        if let Some(v) = self.data.get(x.as_usize()) {
            v.count(y)
        } else {
            0
        }
    }

    pub fn totalcount(&self) -> usize {
        self.data.iter().map(|v| v.totalcount()).sum()
    }
}

impl<A, B, C> Extend<(A, B, C)> for TripleRelationMap<A, B, C>
where
    A: Handle,
    B: Handle,
    C: Handle,
{
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (A, B, C)>,
    {
        for (x, y, z) in iter {
            self.insert(x, y, z);
        }
    }
}

/// Enumeration of all the types in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    AnnotationStore,
    Annotation,
    AnnotationDataSet,
    AnnotationData,
    DataKey,
    DataValue,
    TextResource,
    TextSelection,
    Selector,
    AnnotationSubStore,
    Config,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::AnnotationStore => "AnnotationStore",
            Self::Annotation => "Annotation",
            Self::AnnotationDataSet => "AnnotationDataSet",
            Self::AnnotationData => "AnnotationData",
            Self::DataKey => "DataKey",
            Self::DataValue => "DataValue",
            Self::TextResource => "TextResource",
            Self::TextSelection => "TextSelection",
            Self::Selector => "Selector",
            Self::AnnotationSubStore => "AnnotationSubStore",
            Self::Config => "Config",
        };
        write!(f, "{}", s)
    }
}

/// Implemented by all types in the model, provides type introspection
#[sealed(pub(crate))]
pub trait TypeInfo {
    fn typeinfo() -> Type;
}

/// Prints a debug message to standard error, the message is only constructed when debugging is enabled in the configuration.
pub(crate) fn debug<F>(config: &Config, message_func: F)
where
    F: FnOnce() -> String,
{
    if config.debug {
        eprintln!("[STAM DEBUG] {}", message_func());
    }
}

/// Get a file for reading, this resolves relative files more intelligently
pub(crate) fn get_filepath(filename: &str, workdir: Option<&Path>) -> Result<PathBuf, StamError> {
    if filename.starts_with("https://") || filename.starts_with("http://") {
        return Err(StamError::OtherError("Loading URLs is not supported"));
    }
    let path = if let Some(stripped) = filename.strip_prefix("file://") {
        PathBuf::from(stripped)
    } else {
        PathBuf::from(filename)
    };
    if path.is_absolute() {
        Ok(path)
    } else {
        //check whether we can find one in our workdir first
        if let Some(workdir) = workdir {
            let path = workdir.join(&path);
            if path.is_file() {
                //should also work with symlinks
                return Ok(path);
            }
        }

        //final fallback is simply relative to the current working directly
        // we don't test for existance here
        Ok(path)
    }
}
