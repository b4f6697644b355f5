/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`AnnotationDataSet`], which holds the keys and data (key/value
//! pairs) that annotations refer to, and its builder.

use sealed::sealed;

use crate::annotationdata::{AnnotationData, AnnotationDataBuilder, AnnotationDataHandle};
use crate::annotationstore::AnnotationStore;
use crate::config::{Config, Configurable};
use crate::datakey::{DataKey, DataKeyHandle};
use crate::datavalue::{DataOperator, DataValue};
use crate::error::StamError;
use crate::store::*;
use crate::types::*;

/// An `AnnotationDataSet` stores the keys [`DataKey`] and values
/// [`AnnotationData`] (which in turn encapsulates [`DataValue`]) that are used by annotations.
/// It effectively defines a certain vocabulary, i.e. key/value pairs.
/// The `AnnotationDataSet` does not store the [`crate::annotation::Annotation`] instances themselves, those are in
/// the `AnnotationStore`. The datasets themselves are also held by the `AnnotationStore`.
///
/// Data is deduplicated: a key/value combination occurs only once in a set.
#[derive(Debug, Clone)]
pub struct AnnotationDataSet {
    /// Public Id
    id: Option<String>,

    /// A store for [`DataKey`]
    keys: Store<DataKey>,

    /// A store for [`AnnotationData`], each makes *reference* to a [`DataKey`] (in this same `AnnotationDataSet`) and gives it a value  ([`DataValue`])
    data: Store<AnnotationData>,

    ///Internal numeric ID, corresponds with the index in the AnnotationStore::datasets that has the ownership
    intid: Option<AnnotationDataSetHandle>,

    /// Maps public IDs to internal IDs for keys
    key_idmap: IdMap<DataKeyHandle>,

    /// Maps public IDs to internal IDs for AnnotationData
    data_idmap: IdMap<AnnotationDataHandle>,

    /// Maps keys to the data that uses them
    key_data_map: RelationMap<DataKeyHandle, AnnotationDataHandle>,

    /// Configuration
    config: Config,
}

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct AnnotationDataSetHandle(u16);

#[sealed]
impl Handle for AnnotationDataSetHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u16)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

handle_conversions!(AnnotationDataSet, AnnotationDataSetHandle);

#[sealed]
impl TypeInfo for AnnotationDataSet {
    fn typeinfo() -> Type {
        Type::AnnotationDataSet
    }
}

#[sealed]
impl Storable for AnnotationDataSet {
    type HandleType = AnnotationDataSetHandle;
    type StoreType = AnnotationStore;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
    fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }
    fn handle(&self) -> Option<Self::HandleType> {
        self.intid
    }
    fn set_handle(&mut self, handle: AnnotationDataSetHandle) {
        self.intid = Some(handle);
    }
    fn carries_id() -> bool {
        true
    }

    /// Sets the ownership of all items in the store
    /// This ensure the part_of_set relation (backreference)
    /// is set right.
    fn bound(&mut self) {
        let intid = self.intid;
        for data in self.data.iter_mut().flatten() {
            data.part_of_set = intid;
        }
        for key in self.keys.iter_mut().flatten() {
            key.part_of_set = intid;
        }
    }
}

impl PartialEq<AnnotationDataSet> for AnnotationDataSet {
    fn eq(&self, other: &AnnotationDataSet) -> bool {
        self.id.is_some()
            && self.id == other.id
            && self.keys == other.keys
            && self.data == other.data
    }
}

impl Configurable for AnnotationDataSet {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

#[sealed]
impl StoreFor<DataKey> for AnnotationDataSet {
    fn store(&self) -> &Store<DataKey> {
        &self.keys
    }
    fn store_mut(&mut self) -> &mut Store<DataKey> {
        &mut self.keys
    }
    fn idmap(&self) -> Option<&IdMap<DataKeyHandle>> {
        Some(&self.key_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<DataKeyHandle>> {
        Some(&mut self.key_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "DataKey in AnnotationDataSet"
    }

    fn preinsert(&self, item: &mut DataKey) -> Result<(), StamError> {
        item.part_of_set = self.intid;
        Ok(())
    }

    /// called before the item is removed from the store
    /// refuses to remove keys that are still used by data
    fn preremove(&mut self, handle: DataKeyHandle) -> Result<(), StamError> {
        if self.key_data_map.count(handle) > 0 {
            return Err(StamError::InUse(
                "Refusing to remove datakey because there is still data that uses it",
            ));
        }
        self.key_data_map.remove_all(handle);
        Ok(())
    }
}

#[sealed]
impl StoreFor<AnnotationData> for AnnotationDataSet {
    fn store(&self) -> &Store<AnnotationData> {
        &self.data
    }
    fn store_mut(&mut self) -> &mut Store<AnnotationData> {
        &mut self.data
    }
    fn idmap(&self) -> Option<&IdMap<AnnotationDataHandle>> {
        Some(&self.data_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<AnnotationDataHandle>> {
        Some(&mut self.data_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "AnnotationData in AnnotationDataSet"
    }

    fn preinsert(&self, item: &mut AnnotationData) -> Result<(), StamError> {
        if !<Self as StoreFor<DataKey>>::has(self, &BuildItem::Handle(item.key)) {
            return Err(StamError::HandleError(
                "AnnotationData refers to a key that does not exist in the AnnotationDataSet",
            ));
        }
        item.part_of_set = self.intid;
        Ok(())
    }

    fn inserted(&mut self, handle: AnnotationDataHandle) -> Result<(), StamError> {
        // called after the item is inserted in the store
        // update the relation map
        let annotationdata: &AnnotationData = self.get(&BuildItem::Handle(handle))?;
        let key = annotationdata.key;
        self.key_data_map.insert(key, handle);
        Ok(())
    }

    /// called before the item is removed from the store
    /// updates the relation maps, no need to call manually
    fn preremove(&mut self, handle: AnnotationDataHandle) -> Result<(), StamError> {
        let data: &AnnotationData = self.get(&BuildItem::Handle(handle))?;
        let key = data.key;
        self.key_data_map.remove(key, handle);
        //drop any alias IDs that were registered for this data
        self.data_idmap.data.retain(|_, h| *h != handle);
        Ok(())
    }
}

impl Default for AnnotationDataSet {
    fn default() -> Self {
        Self {
            id: None,
            keys: Store::new(),
            data: Store::new(),
            intid: None,
            key_idmap: IdMap::new("K".to_string()),
            data_idmap: IdMap::new("D".to_string()),
            key_data_map: RelationMap::new(),
            config: Config::default(),
        }
    }
}

/// Builds an [`AnnotationDataSet`], with keys and data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationDataSetBuilder<'a> {
    id: Option<String>,
    keys: Vec<String>,
    data: Vec<AnnotationDataBuilder<'a>>,
}

impl<'a> AnnotationDataSetBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the public identifier of the dataset
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a key to the dataset
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Adds a key/value pair to the dataset, the key will be created if it does not exist yet
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.data.push(
            AnnotationDataBuilder::new()
                .with_key(BuildItem::Id(key.into()))
                .with_value(value),
        );
        self
    }

    /// Adds a key/value pair with a public identifier to the dataset
    pub fn with_key_value_id(
        mut self,
        key: impl Into<String>,
        value: impl Into<DataValue>,
        id: impl Into<String>,
    ) -> Self {
        self.data.push(
            AnnotationDataBuilder::new()
                .with_id(BuildItem::Id(id.into()))
                .with_key(BuildItem::Id(key.into()))
                .with_value(value),
        );
        self
    }

    /// Adds prepared data to the dataset, the dataset of the data builder is ignored
    pub fn with_data_builder(mut self, builder: AnnotationDataBuilder<'a>) -> Self {
        self.data.push(builder);
        self
    }

    /// Returns the ID the dataset will have
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Builds a new [`AnnotationDataSet`], consuming the builder
    pub fn build(self, config: Config) -> Result<AnnotationDataSet, StamError> {
        debug(&config, || {
            format!("AnnotationDataSetBuilder::build: id={:?}", self.id)
        });
        let mut dataset = AnnotationDataSet::new(config);
        dataset.id = self.id;
        for key in self.keys {
            dataset.insert_key(key.as_str())?;
        }
        for databuilder in self.data {
            dataset.build_insert_data(databuilder)?;
        }
        Ok(dataset)
    }
}

impl AnnotationDataSet {
    /// Creates a new empty dataset. Consider using [`AnnotationDataSetBuilder`] instead.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Sets the ID of the dataset in a builder pattern
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a key to the dataset if it does not exist yet, returns the handle of the new or existing key
    pub fn insert_key(&mut self, key: &str) -> Result<DataKeyHandle, StamError> {
        if let Ok(handle) = <Self as StoreFor<DataKey>>::resolve_id(self, key) {
            return Ok(handle);
        }
        self.insert(DataKey::new(key))
    }

    /// Adds new [`AnnotationData`] to the dataset.
    ///
    /// * If `id` refers to existing data, the existing handle is returned, provided the key and value are the same (or the key is not given).
    ///   If they differ, this is a [`StamError::DuplicateIdError`].
    /// * Keys passed by ID are created if they do not exist yet.
    /// * If the key/value combination already exists, a handle to the existing data is returned and nothing new is inserted.
    ///   A new ID passed for existing data is registered as an additional identifier for it.
    pub fn insert_data<'a>(
        &mut self,
        id: BuildItem<'a, AnnotationData>,
        key: BuildItem<'a, DataKey>,
        value: DataValue,
    ) -> Result<AnnotationDataHandle, StamError> {
        if let Some(existing_handle) = BuildItem::to_handle(&id, self) {
            let existing: &AnnotationData = self.get(&BuildItem::Handle(existing_handle))?;
            if key.is_none() {
                //pure reference to existing data
                return Ok(existing_handle);
            }
            let key_handle: Option<DataKeyHandle> = BuildItem::to_handle(&key, self);
            if key_handle == Some(existing.key) && *existing.value() == value {
                return Ok(existing_handle);
            }
            return Err(StamError::DuplicateIdError(
                id.as_str().unwrap_or_default().to_string(),
                "AnnotationDataSet::insert_data: data with this ID exists but has a different key or value",
            ));
        } else if id.is_handle() {
            return Err(id.error("AnnotationDataSet::insert_data: no such data"));
        }

        let key_handle = match BuildItem::to_handle(&key, self) {
            Some(handle) if <Self as StoreFor<DataKey>>::has(self, &BuildItem::Handle(handle)) => {
                handle
            }
            _ => {
                if let Some(key_id) = key.as_str() {
                    let key_id = key_id.to_string();
                    self.insert(DataKey::new(key_id))?
                } else if key.is_none() {
                    return Err(StamError::IncompleteError(
                        "no key supplied".to_string(),
                        "AnnotationDataSet::insert_data",
                    ));
                } else {
                    return Err(key.error("AnnotationDataSet::insert_data: key not found"));
                }
            }
        };

        if let Some(existing) = self.data_by_value(key_handle, &value) {
            let existing_handle = existing.handle_or_err()?;
            let existing_id = existing.id().map(|x| x.to_string());
            if let Some(new_id) = id.as_str().map(|x| x.to_string()) {
                debug(self.config(), || {
                    format!(
                        "AnnotationDataSet::insert_data: data already exists as {:?}, registering id {}",
                        existing_handle, new_id
                    )
                });
                if existing_id.is_none() {
                    if let Some(data) = self.data.get_mut(existing_handle.as_usize()).and_then(|x| x.as_mut()) {
                        data.set_id(Some(new_id.clone()));
                    }
                }
                self.data_idmap.data.insert(new_id, existing_handle);
            }
            return Ok(existing_handle);
        }

        let public_id: Option<String> = id.as_str().map(|x| x.to_string());
        self.insert(AnnotationData::new(public_id, key_handle, value))
    }

    /// Build and insert data into the dataset, similar to [`Self::insert_data()`], but takes a prepared `AnnotationDataBuilder` instead.
    pub fn build_insert_data<'a>(
        &mut self,
        builder: AnnotationDataBuilder<'a>,
    ) -> Result<AnnotationDataHandle, StamError> {
        self.insert_data(builder.id, builder.key, builder.value)
    }

    /// Returns the [`AnnotationData`] with this key and exactly this value, if it exists.
    pub fn data_by_value(
        &self,
        key: impl Request<DataKey>,
        value: &DataValue,
    ) -> Option<&AnnotationData> {
        let key_handle = key.to_handle(self)?;
        self.key_data_map.get(key_handle)?.iter().find_map(|data_handle| {
            let data: &AnnotationData = self.get(&BuildItem::Handle(*data_handle)).ok()?;
            if data.value() == value {
                Some(data)
            } else {
                None
            }
        })
    }

    /// Finds all [`AnnotationData`] in this set that match the operator, optionally constrained to a single key.
    /// Returns an empty iterator if the key does not exist.
    pub fn find_data<'q>(
        &'q self,
        key: Option<DataKeyHandle>,
        operator: &'q DataOperator<'q>,
    ) -> Box<dyn Iterator<Item = &'q AnnotationData> + 'q> {
        match key {
            Some(key_handle) => Box::new(
                self.key_data_map
                    .get(key_handle)
                    .into_iter()
                    .flatten()
                    .filter_map(move |data_handle| {
                        <Self as StoreFor<AnnotationData>>::get(
                            self,
                            &BuildItem::Handle(*data_handle),
                        )
                        .ok()
                    })
                    .filter(move |data| data.value().test(operator)),
            ),
            None => Box::new(
                self.data()
                    .filter(move |data| data.value().test(operator)),
            ),
        }
    }

    /// Get a data handle from an ID.
    pub fn resolve_data_id(&self, id: &str) -> Result<AnnotationDataHandle, StamError> {
        <Self as StoreFor<AnnotationData>>::resolve_id(self, id)
    }

    /// Get a key handle from an ID.
    pub fn resolve_key_id(&self, id: &str) -> Result<DataKeyHandle, StamError> {
        <Self as StoreFor<DataKey>>::resolve_id(self, id)
    }

    ///Iterates over all the data ([`AnnotationData`]) in this set, returns references
    pub fn data(&self) -> StoreIter<AnnotationData> {
        <Self as StoreFor<AnnotationData>>::iter(self)
    }

    ///Iterates over all the keys in this set, returns references
    pub fn keys(&self) -> StoreIter<DataKey> {
        <Self as StoreFor<DataKey>>::iter(self)
    }

    /// Returns a key by ID or handle
    pub fn key(&self, key: impl Request<DataKey>) -> Result<&DataKey, StamError> {
        key.to_handle(self)
            .and_then(|handle| self.keys.get(handle.as_usize()).and_then(|x| x.as_ref()))
            .ok_or_else(|| key.error("AnnotationDataSet::key"))
    }

    /// Returns a single annotation data instance by ID or handle
    pub fn annotationdata(
        &self,
        data: impl Request<AnnotationData>,
    ) -> Result<&AnnotationData, StamError> {
        data.to_handle(self)
            .and_then(|handle| self.data.get(handle.as_usize()).and_then(|x| x.as_ref()))
            .ok_or_else(|| data.error("AnnotationDataSet::annotationdata"))
    }

    /// Returns data by key, does a lookup in the reverse index and returns a reference to it.
    pub fn data_by_key(&self, key_handle: DataKeyHandle) -> Option<&Vec<AnnotationDataHandle>> {
        self.key_data_map.get(key_handle)
    }

    /// Returns the number of keys in the set
    pub fn keys_len(&self) -> usize {
        self.keys.iter().filter(|x| x.is_some()).count()
    }

    /// Returns the number of data items in the set
    pub fn data_len(&self) -> usize {
        self.data.iter().filter(|x| x.is_some()).count()
    }
}
