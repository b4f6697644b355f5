/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the low-level storage abstractions: the [`Storable`] and [`StoreFor`]
//! traits that all stores in this library implement, the [`BuildItem`] reference type used by
//! builders, and [`ResultItem`], the wrapper around which the high-level API is built.

use nanoid::nanoid;
use sealed::sealed;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::slice::Iter;

use crate::annotationstore::AnnotationStore;
use crate::config::Configurable;
use crate::error::StamError;
use crate::types::*;

/// Type for Store elements. The struct that owns a field of this type should implement the trait [`StoreFor<T>`].
pub type Store<T> = Vec<Option<T>>;
//                       ^------- may be None when an element gets deleted

#[sealed(pub(crate))] //<-- this ensures nobody outside this crate can implement the trait
pub trait Storable: PartialEq + TypeInfo
where
    Self: Sized,
{
    type HandleType: Handle;
    type StoreType: StoreFor<Self>;

    /// Retrieve the internal (numeric) id. For any type T uses in `StoreFor<T>`, this may be None only in the initial
    /// stage when it is still unbounded to a store.
    fn handle(&self) -> Option<Self::HandleType> {
        None
    }

    /// Like [`Self::handle()`] but returns a [`StamError::Unbound`] error if there is no internal id.
    fn handle_or_err(&self) -> Result<Self::HandleType, StamError> {
        self.handle().ok_or(StamError::Unbound("handle_or_err"))
    }

    /// Get the public ID
    fn id(&self) -> Option<&str> {
        None
    }

    /// Like [`Self::id()`] but returns a [`StamError::NoIdError`] error if there is no public id.
    fn id_or_err(&self) -> Result<&str, StamError> {
        self.id().ok_or(StamError::NoIdError("id_or_err"))
    }

    /// Builder pattern to set the public Id
    #[allow(unused_variables)]
    fn with_id(self, id: String) -> Self {
        //no-op
        self
    }

    /// Does this type support an ID?
    fn carries_id() -> bool;

    /// Set the internal ID. May only be called once (though currently not enforced).
    #[allow(unused_variables)]
    fn set_handle(&mut self, handle: <Self as Storable>::HandleType) {
        //no-op in default implementation
    }

    /// Callback function that is called after an item is bound to a store
    fn bound(&mut self) {
        //no-op by default
    }

    /// Generate a random ID in a given idmap (adds it to the map and assigns it to the item)
    fn generate_id(self, idmap: Option<&mut IdMap<Self::HandleType>>) -> Self {
        if let Some(intid) = self.handle() {
            if let Some(idmap) = idmap {
                loop {
                    let id = format!("{}{}", idmap.autoprefix, nanoid!());
                    if !idmap.data.contains_key(&id) {
                        //checks for collisions (extremely unlikely)
                        idmap.data.insert(id.clone(), intid);
                        return self.with_id(id);
                    }
                }
            }
        }
        // if the item is not bound or has no IDmap, we can't check collisions, but that's okay
        self.with_id(format!("X{}", nanoid!()))
    }

    /// Wraps the item in a [`ResultItem`], which provides the high-level API.
    /// The item must be bound, i.e. it must have been obtained from the store.
    fn as_resultitem<'store>(
        &'store self,
        store: &'store Self::StoreType,
        rootstore: &'store AnnotationStore,
    ) -> ResultItem<'store, Self> {
        ResultItem::new(self, store, rootstore)
    }
}

/// This trait is implemented on types that provide storage for a certain other generic type (T)
/// It is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))] //<-- this ensures nobody outside this crate can implement the trait
pub trait StoreFor<T: Storable>: Configurable {
    /// Get a reference to the entire store for the associated type
    fn store(&self) -> &Store<T>;
    /// Get a mutable reference to the entire store for the associated type
    fn store_mut(&mut self) -> &mut Store<T>;
    /// Get a reference to the id map for the associated type, mapping global ids to internal ids
    fn idmap(&self) -> Option<&IdMap<T::HandleType>> {
        None
    }
    /// Get a mutable reference to the id map for the associated type, mapping global ids to internal ids
    fn idmap_mut(&mut self) -> Option<&mut IdMap<T::HandleType>> {
        None
    }

    fn store_typeinfo() -> &'static str;

    /// Adds an item to the store. Returns a handle to it upon success.
    fn insert(&mut self, mut item: T) -> Result<T::HandleType, StamError> {
        debug(self.config(), || {
            format!("StoreFor<{}>.insert: new item", Self::store_typeinfo())
        });

        if T::carries_id() {
            if let Some(id) = item.id() {
                //check if public ID does not already exist
                if let Ok(existing_handle) = self.resolve_id(id) {
                    //ok. the already ID exists, now is the existing item exactly the same as the item we're about to insert?
                    //in that case we can discard this error and just return the existing handle without actually inserting a new one
                    let existing_item = self.get(&BuildItem::Handle(existing_handle))?;
                    if *existing_item == item {
                        return Ok(existing_handle);
                    }
                    //in all other cases, we return an error
                    return Err(StamError::DuplicateIdError(
                        id.to_string(),
                        Self::store_typeinfo(),
                    ));
                }
            }
        }

        let handle = if let Some(intid) = item.handle() {
            intid
        } else {
            // item has no internal id yet, i.e. it is unbound
            // we generate an id and bind it now
            let intid = self.next_handle();
            item = self.bind(item)?;
            intid
        };

        //let the store do its checks and bookkeeping before anything is committed
        self.preinsert(&mut item)?;

        if T::carries_id() {
            if let Some(id) = item.id().map(|x| x.to_string()) {
                debug(self.config(), || {
                    format!(
                        "StoreFor<{}>.insert: ^--- id={:?}",
                        Self::store_typeinfo(),
                        id
                    )
                });
                if let Some(idmap) = self.idmap_mut() {
                    idmap.data.insert(id, handle);
                }
            } else if self.config().generate_ids {
                item = item.generate_id(self.idmap_mut());
                debug(self.config(), || {
                    format!(
                        "StoreFor<{}>.insert: ^--- autogenerated id {}",
                        Self::store_typeinfo(),
                        item.id().unwrap_or("(none)"),
                    )
                });
            }
        }

        //add the item
        self.store_mut().push(Some(item));

        self.inserted(handle)?;

        debug(self.config(), || {
            format!(
                "StoreFor<{}>.insert: ^--- {:?} (insertion complete now)",
                Self::store_typeinfo(),
                handle
            )
        });

        Ok(handle)
    }

    /// Called prior to inserting an item into to the store
    /// If it returns an error, the insert will be cancelled.
    /// Allows for bookkeeping such as inheriting configuration
    /// parameters from parent to the item
    #[allow(unused_variables)]
    fn preinsert(&self, item: &mut T) -> Result<(), StamError> {
        //default implementation does nothing
        Ok(())
    }

    /// Called after an item was inserted to the store
    /// Allows the store to do further bookkeeping
    /// like updating relation maps
    #[allow(unused_variables)]
    fn inserted(&mut self, handle: T::HandleType) -> Result<(), StamError> {
        //default implementation does nothing
        Ok(())
    }

    /// Builder pattern variant of [`Self::insert()`]
    fn add(mut self, item: T) -> Result<Self, StamError>
    where
        Self: Sized,
    {
        self.insert(item)?;
        Ok(self)
    }

    /// Returns true if the store has the item
    fn has<'a>(&self, item: &BuildItem<'a, T>) -> bool {
        match item.to_handle(self) {
            Some(handle) => matches!(self.store().get(handle.as_usize()), Some(Some(_))),
            None => false,
        }
    }

    /// Get a reference to an item from the store
    fn get<'a>(&self, item: &BuildItem<'a, T>) -> Result<&T, StamError> {
        if let Some(handle) = item.to_handle(self) {
            if let Some(Some(item)) = self.store().get(handle.as_usize()) {
                return Ok(item);
            }
        }
        Err(item.error(Self::store_typeinfo()))
    }

    /// Get a mutable reference to an item from the store
    fn get_mut<'a>(&mut self, item: &BuildItem<'a, T>) -> Result<&mut T, StamError> {
        if let Some(handle) = item.to_handle(self) {
            if let Some(Some(item)) = self.store_mut().get_mut(handle.as_usize()) {
                return Ok(item);
            }
        }
        Err(item.error(Self::store_typeinfo()))
    }

    /// Removes an item by handle, returns an error if the item has dependencies and can't be removed
    fn remove(&mut self, handle: T::HandleType) -> Result<(), StamError> {
        //callback to remove the item from relation maps, may return an error and refuse to remove an item
        self.preremove(handle)?;

        //remove item from idmap
        let item: &T = self.get(&BuildItem::Handle(handle))?;
        let id: Option<String> = item.id().map(|x| x.to_string());
        if let Some(id) = id {
            if let Some(idmap) = self.idmap_mut() {
                idmap.data.remove(id.as_str());
            }
        }

        //now remove the actual item, removing means just setting its previously occupied index to None
        //(and the actual item is owned so will be deallocated)
        if let Some(slot) = self.store_mut().get_mut(handle.as_usize()) {
            *slot = None;
        }
        debug(self.config(), || {
            format!(
                "StoreFor<{}>.remove: {:?}",
                Self::store_typeinfo(),
                handle
            )
        });
        Ok(())
    }

    /// Called before an item is removed from the store
    /// Allows the store to do further bookkeeping
    /// like updating relation maps
    #[allow(unused_variables)]
    fn preremove(&mut self, handle: T::HandleType) -> Result<(), StamError> {
        //default implementation does nothing
        Ok(())
    }

    /// Resolves an ID to a handle
    /// You usually don't want to call this directly
    fn resolve_id(&self, id: &str) -> Result<T::HandleType, StamError> {
        if let Some(idmap) = self.idmap() {
            if let Some(handle) = idmap.data.get(id) {
                Ok(*handle)
            } else {
                Err(StamError::IdNotFoundError(
                    id.to_string(),
                    Self::store_typeinfo(),
                ))
            }
        } else {
            Err(StamError::NoIdError(Self::store_typeinfo()))
        }
    }

    /// Iterate over the store, deleted items are skipped
    fn iter(&self) -> StoreIter<T> {
        StoreIter {
            iter: self.store().iter(),
            count: 0,
            len: self.store().len(),
        }
    }

    /// Return the internal id that will be assigned for the next item to the store
    fn next_handle(&self) -> T::HandleType {
        T::HandleType::new(self.store().len()) //this is one of the very few places in the code where we create a handle from scratch
    }

    /// This binds an item to the store *PRIOR* to it being actually added
    /// You should never need to call this directly (it can only be called once per item anyway).
    fn bind(&mut self, mut item: T) -> Result<T, StamError> {
        //we already pass the internal id this item will get upon the next insert()
        //so it knows its internal id immediate after construction
        if item.handle().is_some() {
            Err(StamError::AlreadyBound("bind()"))
        } else {
            item.set_handle(self.next_handle());
            item.bound();
            Ok(item)
        }
    }
}

//  generic iterator implementations, these take care of skipping over deleted items (None)

/// This is the iterator to iterate over a Store,  it is created by the iter() method from the [`StoreFor<T>`] trait
pub struct StoreIter<'a, T> {
    iter: Iter<'a, Option<T>>,
    count: usize,
    len: usize,
}

impl<'a, T> Iterator for StoreIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.count += 1;
            match self.iter.next() {
                Some(Some(item)) => return Some(item),
                Some(None) => continue,
                None => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        //the lower bound is an estimate, deleted items are not known in advance
        (0, Some(self.len.saturating_sub(self.count)))
    }
}

/// This is a reference to an item, used in builders and lookups. It refers to an item either by public ID, by handle, or by reference.
/// You will usually not construct this directly but rely on `into()` conversions from `&str`, `String` or handles.
#[derive(Debug)]
pub enum BuildItem<'a, T>
where
    T: Storable,
{
    Id(String),
    IdRef(&'a str),
    Ref(&'a T),
    Handle(T::HandleType),
    None,
}

impl<'a, T> Clone for BuildItem<'a, T>
where
    T: Storable,
{
    fn clone(&self) -> Self {
        match self {
            Self::Id(s) => Self::Id(s.clone()),
            Self::IdRef(s) => Self::IdRef(s),
            Self::Ref(r) => Self::Ref(r),
            Self::Handle(h) => Self::Handle(*h),
            Self::None => Self::None,
        }
    }
}

impl<'a, T> Default for BuildItem<'a, T>
where
    T: Storable,
{
    fn default() -> Self {
        Self::None
    }
}

impl<'a, T> PartialEq for BuildItem<'a, T>
where
    T: Storable,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Handle(x), Self::Handle(y)) => x == y,
            (Self::Id(x), Self::Id(y)) => x == y,
            (Self::IdRef(x), Self::IdRef(y)) => x == y,
            (Self::Id(x), Self::IdRef(y)) => x.as_str() == *y,
            (Self::IdRef(x), Self::Id(y)) => *x == y.as_str(),
            (Self::Ref(x), Self::Ref(y)) => x == y,
            (Self::Ref(x), Self::Id(y)) => x.id() == Some(y.as_str()),
            (Self::Ref(x), Self::IdRef(y)) => x.id() == Some(y),
            (Self::Id(x), Self::Ref(y)) => Some(x.as_str()) == y.id(),
            (Self::IdRef(x), Self::Ref(y)) => Some(*x) == y.id(),
            (Self::None, Self::None) => true,
            _ => false,
        }
    }
}

impl<'a, T> BuildItem<'a, T>
where
    T: Storable,
{
    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Handle(_))
    }

    pub fn is_id(&self) -> bool {
        matches!(self, Self::Id(_) | Self::IdRef(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the appropriate not-found error for this reference
    pub fn error(&self, contextmsg: &'static str) -> StamError {
        match self {
            Self::Handle(_) => StamError::HandleError(contextmsg),
            Self::Id(id) => StamError::IdNotFoundError(id.to_string(), contextmsg),
            Self::IdRef(id) => StamError::IdNotFoundError(id.to_string(), contextmsg),
            Self::Ref(instance) => StamError::IdNotFoundError(
                instance.id().unwrap_or("(no id)").to_string(),
                contextmsg,
            ),
            Self::None => StamError::Unbound("Supplied item reference is not bound to anything!"),
        }
    }

    /// Returns the ID as str, returns None if only a handle is contained
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Id(s) => Some(s.as_str()),
            Self::IdRef(s) => Some(s),
            Self::Ref(r) => r.id(),
            _ => None,
        }
    }

    /// Resolves this reference to a handle in the given store
    pub fn to_handle<S>(&self, store: &S) -> Option<T::HandleType>
    where
        S: StoreFor<T> + ?Sized,
    {
        match self {
            Self::Id(id) => store.resolve_id(id.as_str()).ok(),
            Self::IdRef(id) => store.resolve_id(id).ok(),
            Self::Handle(handle) => Some(*handle),
            Self::Ref(instance) => instance.handle(),
            Self::None => None,
        }
    }

    /// Converts a borrowed reference into an owned one (only IDs are copied, references become handles)
    pub fn to_owned_item(&self) -> BuildItem<'static, T> {
        match self {
            Self::Id(s) => BuildItem::Id(s.clone()),
            Self::IdRef(s) => BuildItem::Id(s.to_string()),
            Self::Ref(r) => {
                if let Some(handle) = r.handle() {
                    BuildItem::Handle(handle)
                } else if let Some(id) = r.id() {
                    BuildItem::Id(id.to_string())
                } else {
                    BuildItem::None
                }
            }
            Self::Handle(h) => BuildItem::Handle(*h),
            Self::None => BuildItem::None,
        }
    }
}

impl<'a, T> From<&'a str> for BuildItem<'a, T>
where
    T: Storable,
{
    fn from(id: &'a str) -> Self {
        if id.is_empty() {
            Self::None
        } else {
            Self::IdRef(id)
        }
    }
}

impl<'a, T> From<Option<&'a str>> for BuildItem<'a, T>
where
    T: Storable,
{
    fn from(id: Option<&'a str>) -> Self {
        match id {
            Some(id) => id.into(),
            None => Self::None,
        }
    }
}

impl<'a, T> From<String> for BuildItem<'a, T>
where
    T: Storable,
{
    fn from(id: String) -> Self {
        if id.is_empty() {
            Self::None
        } else {
            Self::Id(id)
        }
    }
}

impl<'a, T> From<&'a String> for BuildItem<'a, T>
where
    T: Storable,
{
    fn from(id: &'a String) -> Self {
        id.as_str().into()
    }
}

impl<'a, T> From<&'a T> for BuildItem<'a, T>
where
    T: Storable,
{
    fn from(instance: &'a T) -> Self {
        Self::Ref(instance)
    }
}

impl<'a, T> PartialEq<str> for BuildItem<'a, T>
where
    T: Storable,
{
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl<'a, T> PartialEq<&str> for BuildItem<'a, T>
where
    T: Storable,
{
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// Something that can be used to request an item from a store in the high-level API: a public ID (`&str`, `String`),
/// a handle, or a boolean. Passing a boolean (either value) acts as a wildcard in search methods that accept one, and matches
/// nothing in direct lookups.
pub trait Request<T>
where
    T: Storable,
{
    /// Resolves the request to a handle in the given store
    fn to_handle<S>(&self, store: &S) -> Option<T::HandleType>
    where
        S: StoreFor<T> + ?Sized;

    /// Returns the requested public ID, if the request is by ID
    fn requested_id(&self) -> Option<&str> {
        None
    }

    /// Is this a wildcard request matching anything?
    fn any(&self) -> bool {
        false
    }

    /// Returns the not-found error for this request
    fn error(&self, contextmsg: &'static str) -> StamError {
        if let Some(id) = self.requested_id() {
            StamError::IdNotFoundError(id.to_string(), contextmsg)
        } else {
            StamError::HandleError(contextmsg)
        }
    }
}

impl<'a, T> Request<T> for &'a str
where
    T: Storable,
{
    fn to_handle<S>(&self, store: &S) -> Option<T::HandleType>
    where
        S: StoreFor<T> + ?Sized,
    {
        store.resolve_id(self).ok()
    }

    fn requested_id(&self) -> Option<&str> {
        Some(*self)
    }
}

impl<T> Request<T> for String
where
    T: Storable,
{
    fn to_handle<S>(&self, store: &S) -> Option<T::HandleType>
    where
        S: StoreFor<T> + ?Sized,
    {
        store.resolve_id(self.as_str()).ok()
    }

    fn requested_id(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<'a, T> Request<T> for &'a String
where
    T: Storable,
{
    fn to_handle<S>(&self, store: &S) -> Option<T::HandleType>
    where
        S: StoreFor<T> + ?Sized,
    {
        store.resolve_id(self.as_str()).ok()
    }

    fn requested_id(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T> Request<T> for bool
where
    T: Storable,
{
    fn to_handle<S>(&self, _store: &S) -> Option<T::HandleType>
    where
        S: StoreFor<T> + ?Sized,
    {
        None
    }

    fn any(&self) -> bool {
        true
    }
}

impl<'a, T> Request<T> for BuildItem<'a, T>
where
    T: Storable,
{
    fn to_handle<S>(&self, store: &S) -> Option<T::HandleType>
    where
        S: StoreFor<T> + ?Sized,
    {
        BuildItem::to_handle(self, store)
    }

    fn requested_id(&self) -> Option<&str> {
        self.as_str()
    }
}

/// Implements the conversions from a handle type to [`BuildItem`] and [`Request`].
/// Spelled out per handle because a generic implementation over `T::HandleType` conflicts with the reflexive `From` implementation.
macro_rules! handle_conversions {
    ($storable:ty, $handle:ty) => {
        impl<'a> From<$handle> for $crate::store::BuildItem<'a, $storable> {
            fn from(handle: $handle) -> Self {
                $crate::store::BuildItem::Handle(handle)
            }
        }

        impl<'a> From<&$handle> for $crate::store::BuildItem<'a, $storable> {
            fn from(handle: &$handle) -> Self {
                $crate::store::BuildItem::Handle(*handle)
            }
        }

        impl<'a> From<Option<$handle>> for $crate::store::BuildItem<'a, $storable> {
            fn from(handle: Option<$handle>) -> Self {
                match handle {
                    Some(handle) => $crate::store::BuildItem::Handle(handle),
                    None => $crate::store::BuildItem::None,
                }
            }
        }

        impl $crate::store::Request<$storable> for $handle {
            fn to_handle<S>(&self, _store: &S) -> Option<$handle>
            where
                S: $crate::store::StoreFor<$storable> + ?Sized,
            {
                Some(*self)
            }
        }
    };
}
pub(crate) use handle_conversions;

/// This is a smart pointer that encapsulates both the item and the store that owns it, as well as the
/// root [`AnnotationStore`]. It allows the item to have some more introspection as it knows who its
/// immediate owner is. All of the high-level API is implemented on this type.
pub struct ResultItem<'store, T>
where
    T: Storable,
{
    item: &'store T,
    store: &'store T::StoreType,
    rootstore: &'store AnnotationStore,
}

impl<'store, T> Clone for ResultItem<'store, T>
where
    T: Storable,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<'store, T> Copy for ResultItem<'store, T> where T: Storable {}

impl<'store, T> std::fmt::Debug for ResultItem<'store, T>
where
    T: Storable + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultItem")
            .field("item", self.item)
            .finish()
    }
}

impl<'store, T> PartialEq for ResultItem<'store, T>
where
    T: Storable,
{
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.item.handle() == other.item.handle()
    }
}

impl<'store, T> Eq for ResultItem<'store, T> where T: Storable {}

impl<'store, T> PartialOrd for ResultItem<'store, T>
where
    T: Storable,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'store, T> Ord for ResultItem<'store, T>
where
    T: Storable,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.item.handle().cmp(&other.item.handle())
    }
}

impl<'store, T> Hash for ResultItem<'store, T>
where
    T: Storable,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item.handle().hash(state);
    }
}

impl<'store, T> ResultItem<'store, T>
where
    T: Storable,
{
    pub(crate) fn new(
        item: &'store T,
        store: &'store T::StoreType,
        rootstore: &'store AnnotationStore,
    ) -> Self {
        Self {
            item,
            store,
            rootstore,
        }
    }

    /// Returns a reference to the store that owns the item
    pub fn store(&self) -> &'store T::StoreType {
        self.store
    }

    /// Returns a reference to the root annotation store
    pub fn rootstore(&self) -> &'store AnnotationStore {
        self.rootstore
    }

    /// Returns the contained reference with the original lifetime
    pub fn as_ref(&self) -> &'store T {
        self.item
    }

    /// Returns the handle of the item. Result items always wrap bound items.
    pub fn handle(&self) -> T::HandleType {
        self.item
            .handle()
            .expect("handle was already guaranteed for ResultItem, this should always work")
    }

    /// Returns the public identifier of the item, if any
    pub fn id(&self) -> Option<&'store str> {
        self.item.id()
    }
}
