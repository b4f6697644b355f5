/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

use sealed::sealed;

use crate::annotationdataset::{AnnotationDataSet, AnnotationDataSetHandle};
use crate::datakey::{DataKey, DataKeyHandle};
use crate::datavalue::DataValue;
use crate::store::*;
use crate::types::*;

/// AnnotationData holds the actual content of an annotation; a key/value pair. (the
/// term *feature* is regularly seen for this in certain annotation paradigms).
/// Annotation Data is deliberately decoupled from the actual ``Annotation``
/// instances so multiple annotation instances can point to the same content
/// without causing any overhead in storage. Moreover, it facilitates indexing and
/// searching. The annotation data is part of an `AnnotationDataSet`, which
/// effectively defines a certain user-defined vocabulary.
///
/// Once instantiated, instances of this type are largely immutable.
/// The key and value can not be changed. Create a new AnnotationData and new Annotation for edits.
#[derive(Debug, Clone)]
pub struct AnnotationData {
    /// Public identifier
    id: Option<String>,

    ///Refers to the key by id, the keys are stored in the AnnotationDataSet that holds this AnnotationData
    pub(crate) key: DataKeyHandle,

    //Actual annotation value
    value: DataValue,

    ///Internal numeric ID for this AnnotationData, corresponds with the index in the AnnotationDataSet::data that has the ownership
    intid: Option<AnnotationDataHandle>,

    ///Refers to internal ID of the AnnotationDataSet (as owned by AnnotationStore) that owns this AnnotationData
    pub(crate) part_of_set: Option<AnnotationDataSetHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationDataHandle(u32);

#[sealed]
impl Handle for AnnotationDataHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

handle_conversions!(AnnotationData, AnnotationDataHandle);

#[sealed]
impl TypeInfo for AnnotationData {
    fn typeinfo() -> Type {
        Type::AnnotationData
    }
}

#[sealed]
impl Storable for AnnotationData {
    type HandleType = AnnotationDataHandle;
    type StoreType = AnnotationDataSet;

    fn handle(&self) -> Option<AnnotationDataHandle> {
        self.intid
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    fn set_handle(&mut self, intid: AnnotationDataHandle) {
        self.intid = Some(intid);
    }

    fn carries_id() -> bool {
        true
    }
}

impl PartialEq<AnnotationData> for AnnotationData {
    fn eq(&self, other: &AnnotationData) -> bool {
        self.id == other.id && self.key == other.key && self.value == other.value
    }
}

impl AnnotationData {
    /// Creates a new unbound AnnotationData instance, you will likely never want to instantiate this directly, but via
    /// [`AnnotationDataSet::insert_data()`] or indirectly [`crate::AnnotationBuilder::with_data()`].
    pub fn new(id: Option<String>, key: DataKeyHandle, value: DataValue) -> Self {
        AnnotationData {
            id,
            key,
            value,
            intid: None,
            part_of_set: None,
        }
    }

    /// Returns the handle of the key used by this data
    pub fn key(&self) -> DataKeyHandle {
        self.key
    }

    /// Get the value of this annotationdata. The value will be a DataValue instance. This will return an immutable reference.
    /// Note that there is no mutable variant nor a set_value(), values can only be set once at instantiation.
    /// Make a new AnnotationData if you want to change data.
    pub fn value(&self) -> &DataValue {
        &self.value
    }

    /// Returns the handle of the dataset this data belongs to
    pub fn dataset(&self) -> Option<AnnotationDataSetHandle> {
        self.part_of_set
    }

    pub(crate) fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }
}

/// This is the build recipe for `AnnotationData`. It contains public IDs or handles that will be resolved.
/// It is usually not instantiated directly but used via the [`crate::AnnotationBuilder::with_data()`] or [`crate::AnnotationDataSetBuilder::with_data()`] methods.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDataBuilder<'a> {
    pub(crate) id: BuildItem<'a, AnnotationData>,
    pub(crate) dataset: BuildItem<'a, AnnotationDataSet>,
    pub(crate) key: BuildItem<'a, DataKey>,
    pub(crate) value: DataValue,
}

impl<'a> Default for AnnotationDataBuilder<'a> {
    fn default() -> Self {
        Self {
            id: BuildItem::None,
            dataset: BuildItem::None,
            key: BuildItem::None,
            value: DataValue::Null,
        }
    }
}

impl<'a> AnnotationDataBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the public ID of the data, or refers to existing data by ID or handle
    pub fn with_id(mut self, id: impl Into<BuildItem<'a, AnnotationData>>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the dataset, by ID or handle
    pub fn with_dataset(mut self, dataset: impl Into<BuildItem<'a, AnnotationDataSet>>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Sets the key, by ID or handle. Keys passed by ID will be created if they do not exist yet.
    pub fn with_key(mut self, key: impl Into<BuildItem<'a, DataKey>>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<DataValue>) -> Self {
        self.value = value.into();
        self
    }

    pub fn id(&self) -> &BuildItem<'a, AnnotationData> {
        &self.id
    }

    pub fn dataset(&self) -> &BuildItem<'a, AnnotationDataSet> {
        &self.dataset
    }

    pub fn key(&self) -> &BuildItem<'a, DataKey> {
        &self.key
    }

    pub fn value(&self) -> &DataValue {
        &self.value
    }
}
