/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`Annotation`] and its builder. Annotations are added to the
//! [`crate::AnnotationStore`] via [`crate::AnnotationStore::annotate()`].

use sealed::sealed;
use smallvec::SmallVec;

use crate::annotationdata::{AnnotationData, AnnotationDataBuilder, AnnotationDataHandle};
use crate::annotationdataset::{AnnotationDataSet, AnnotationDataSetHandle};
use crate::annotationstore::AnnotationStore;
use crate::datakey::DataKey;
use crate::datavalue::DataValue;
use crate::resources::TextResourceHandle;
use crate::selector::{Selector, SelectorBuilder};
use crate::store::*;
use crate::substore::AnnotationSubStoreHandle;
use crate::textselection::TextSelectionHandle;
use crate::types::*;

/// `Annotation` represents a particular *instance of annotation* and is the central
/// concept of the model. They can be considered the primary nodes of the graph model. The
/// instance of annotation is strictly decoupled from the *data* or key/value of the
/// annotation ([`AnnotationData`]). After all, multiple instances can be annotated
/// with the same label (multiple annotations may share the same annotation data).
/// Moreover, an `Annotation` can have multiple annotation data associated.
/// The result is that multiple annotations with the exact same content require less storage
/// space, and searching and indexing is facilitated.
///
/// Annotations are immutable once created, they can only be removed.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Public identifier for this annotation
    id: Option<String>,

    /// Reference to the annotation data (may be multiple) that describe(s) this annotation, the first ID refers to an AnnotationDataSet as owned by the AnnotationStore, the second to an AnnotationData instance as owned by that set
    data: SmallVec<[(AnnotationDataSetHandle, AnnotationDataHandle); 1]>,

    /// Determines selection target
    target: Selector,

    /// The text selections the target resolved to at creation time. Sorted textually for
    /// composite and multi selectors, in declaration order for directional selectors.
    pub(crate) textselections: SmallVec<[(TextResourceHandle, TextSelectionHandle); 1]>,

    ///Internal numeric ID for this annotation, corresponds with the index in the AnnotationStore::annotations that has the ownership.
    intid: Option<AnnotationHandle>,

    /// The substore this annotation was declared in, None if it was declared in the root store
    pub(crate) substore: Option<AnnotationSubStoreHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationHandle(u32);

#[sealed]
impl Handle for AnnotationHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

handle_conversions!(Annotation, AnnotationHandle);

#[sealed]
impl TypeInfo for Annotation {
    fn typeinfo() -> Type {
        Type::Annotation
    }
}

#[sealed]
impl Storable for Annotation {
    type HandleType = AnnotationHandle;
    type StoreType = AnnotationStore;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
    fn handle(&self) -> Option<AnnotationHandle> {
        self.intid
    }
    fn set_handle(&mut self, handle: AnnotationHandle) {
        self.intid = Some(handle);
    }
    fn carries_id() -> bool {
        true
    }
    fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }
}

impl PartialEq<Annotation> for Annotation {
    fn eq(&self, other: &Annotation) -> bool {
        self.id.is_some()
            && self.id == other.id
            && self.target == other.target
            && self.data == other.data
    }
}

impl Annotation {
    /// Creates a new unbound annotation, this is done by [`AnnotationStore::annotate()`] after the target has been resolved
    pub(crate) fn new(
        id: Option<String>,
        target: Selector,
        data: SmallVec<[(AnnotationDataSetHandle, AnnotationDataHandle); 1]>,
        textselections: SmallVec<[(TextResourceHandle, TextSelectionHandle); 1]>,
    ) -> Self {
        Self {
            id,
            data,
            target,
            textselections,
            intid: None,
            substore: None,
        }
    }

    /// Returns the target selector of this annotation
    pub fn target(&self) -> &Selector {
        &self.target
    }

    #[cfg(test)]
    pub(crate) fn target_mut(&mut self) -> &mut Selector {
        &mut self.target
    }

    /// Iterates over the (dataset, data) handle pairs of this annotation
    pub fn data(&self) -> impl Iterator<Item = &(AnnotationDataSetHandle, AnnotationDataHandle)> {
        self.data.iter()
    }

    /// Returns the number of data items in this annotation
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Does this annotation hold this data?
    pub fn has_data(&self, set: AnnotationDataSetHandle, data: AnnotationDataHandle) -> bool {
        self.data.contains(&(set, data))
    }

    /// Returns the (resource, textselection) handles the target resolved to
    pub fn textselection_handles(&self) -> &[(TextResourceHandle, TextSelectionHandle)] {
        &self.textselections
    }

    /// Returns the handle of the substore this annotation was declared in, if any
    pub fn substore(&self) -> Option<AnnotationSubStoreHandle> {
        self.substore
    }
}

/// This is the build recipe for `Annotation`. It contains references to public IDs or handles that will be resolved
/// when the annotation is built by passing it to [`AnnotationStore::annotate()`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationBuilder<'a> {
    pub(crate) id: BuildItem<'a, Annotation>,
    pub(crate) data: Vec<AnnotationDataBuilder<'a>>,
    pub(crate) target: Option<SelectorBuilder<'a>>,
}

impl<'a> AnnotationBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the public identifier of the annotation
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = BuildItem::Id(id.into());
        self
    }

    /// Sets the target of the annotation
    pub fn with_target(mut self, target: SelectorBuilder<'a>) -> Self {
        self.target = Some(target);
        self
    }

    /// Adds data to the annotation. The dataset and key will be created if they do not exist yet,
    /// and existing data with the same key and value is reused.
    pub fn with_data(
        self,
        dataset: impl Into<BuildItem<'a, AnnotationDataSet>>,
        key: impl Into<BuildItem<'a, DataKey>>,
        value: impl Into<DataValue>,
    ) -> Self {
        self.with_data_builder(
            AnnotationDataBuilder::new()
                .with_dataset(dataset)
                .with_key(key)
                .with_value(value),
        )
    }

    /// Adds data with a public identifier to the annotation
    pub fn with_data_with_id(
        self,
        dataset: impl Into<BuildItem<'a, AnnotationDataSet>>,
        key: impl Into<BuildItem<'a, DataKey>>,
        value: impl Into<DataValue>,
        id: impl Into<BuildItem<'a, AnnotationData>>,
    ) -> Self {
        self.with_data_builder(
            AnnotationDataBuilder::new()
                .with_id(id)
                .with_dataset(dataset)
                .with_key(key)
                .with_value(value),
        )
    }

    /// Refers to existing data, by ID or handle
    pub fn with_existing_data(
        self,
        dataset: impl Into<BuildItem<'a, AnnotationDataSet>>,
        data: impl Into<BuildItem<'a, AnnotationData>>,
    ) -> Self {
        self.with_data_builder(
            AnnotationDataBuilder::new()
                .with_dataset(dataset)
                .with_id(data),
        )
    }

    /// Adds prepared data to the annotation
    pub fn with_data_builder(mut self, builder: AnnotationDataBuilder<'a>) -> Self {
        self.data.push(builder);
        self
    }

    pub fn id(&self) -> &BuildItem<'a, Annotation> {
        &self.id
    }

    pub fn target(&self) -> Option<&SelectorBuilder<'a>> {
        self.target.as_ref()
    }

    pub fn data(&self) -> &[AnnotationDataBuilder<'a>] {
        &self.data
    }
}
