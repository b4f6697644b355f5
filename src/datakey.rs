/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

use sealed::sealed;
use std::fmt;

use crate::annotationdataset::{AnnotationDataSet, AnnotationDataSetHandle};
use crate::store::*;
use crate::types::*;

/// The DataKey class defines a vocabulary field, it
/// belongs to a certain [`AnnotationDataSet`]. An `AnnotationData`
/// in turn makes reference to a DataKey and assigns it a value.
#[derive(Debug, Clone)]
pub struct DataKey {
    /// The Id is the name that identifies this key, it must be unique in the dataset to which it pertains
    id: String,

    ///Internal numeric ID, corresponds with the index in the AnnotationDataSet::keys that has the ownership. May be unbound (None) only during creation.
    intid: Option<DataKeyHandle>,

    ///Refers to internal ID of the AnnotationDataSet (as owned by AnnotationStore) that owns this DataKey. May be unbound (None) only during creation.
    pub(crate) part_of_set: Option<AnnotationDataSetHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataKeyHandle(u32);

#[sealed]
impl Handle for DataKeyHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

handle_conversions!(DataKey, DataKeyHandle);

#[sealed]
impl TypeInfo for DataKey {
    fn typeinfo() -> Type {
        Type::DataKey
    }
}

#[sealed]
impl Storable for DataKey {
    type HandleType = DataKeyHandle;
    type StoreType = AnnotationDataSet;

    fn id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
    fn handle(&self) -> Option<DataKeyHandle> {
        self.intid
    }
    fn set_handle(&mut self, intid: DataKeyHandle) {
        self.intid = Some(intid);
    }
    fn carries_id() -> bool {
        true
    }
}

impl PartialEq<DataKey> for DataKey {
    fn eq(&self, other: &DataKey) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq<str> for DataKey {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<DataKey> for str {
    fn eq(&self, other: &DataKey) -> bool {
        other.as_str() == self
    }
}

impl DataKey {
    ///Creates a new DataKey which you can add to an AnnotationDataSet using `AnnotationDataSet.insert()`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            intid: None,
            part_of_set: None,
        }
    }

    /// Returns the global id that identifies the key
    pub fn as_str(&self) -> &str {
        self.id.as_str()
    }

    /// Returns a handle to the [`AnnotationDataSet`] this key belongs to
    pub fn dataset(&self) -> Option<AnnotationDataSetHandle> {
        self.part_of_set
    }
}
