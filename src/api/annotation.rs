/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for [`Annotation`]. This API is implemented on
//! [`ResultItem<Annotation>`].

use crate::annotation::Annotation;
use crate::annotationdata::AnnotationData;
use crate::annotationdataset::AnnotationDataSet;
use crate::api::textselection::{annotations_of, SortTextualOrder};
use crate::datakey::DataKey;
use crate::datavalue::DataOperator;
use crate::resources::{TextResource, TextResourceHandle};
use crate::selector::Selector;
use crate::store::*;
use crate::substore::AnnotationSubStore;
use crate::text::Text;
use crate::textselection::{ResultTextSelection, TextSelectionOperator, TextSelectionSet};

impl<'store> ResultItem<'store, Annotation> {
    /// Returns the target selector of this annotation
    pub fn target(&self) -> &'store Selector {
        self.as_ref().target()
    }

    /// Returns an iterator over the data of this annotation
    pub fn data(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationData>> + 'store {
        let rootstore = self.rootstore();
        self.as_ref().data().filter_map(move |(set_handle, data_handle)| {
            rootstore
                .dataset(*set_handle)
                .ok()?
                .annotationdata(*data_handle)
                .ok()
        })
    }

    /// Finds [`AnnotationData`] pertaining directly to this annotation, using data search criteria.
    ///
    /// You can pass a boolean (true/false, doesn't matter) for `set` or `key` to represent any set/key.
    /// To search for any value, pass [`DataOperator::Any`]. A `key` is only considered if `set` is also passed.
    pub fn find_data(
        &self,
        set: impl Request<AnnotationDataSet>,
        key: impl Request<DataKey>,
        value: &DataOperator,
    ) -> Vec<ResultItem<'store, AnnotationData>> {
        let rootstore = self.rootstore();
        let mut set_handle = None;
        let mut key_handle = None;
        if !set.any() {
            let Ok(dataset) = rootstore.dataset(set) else {
                return Vec::new();
            };
            set_handle = Some(dataset.handle());
            if !key.any() {
                let Ok(key) = dataset.key(key) else {
                    return Vec::new();
                };
                key_handle = Some(key.handle());
            }
        }
        self.data()
            .filter(|data| {
                set_handle.map_or(true, |h| h == data.set().handle())
                    && key_handle.map_or(true, |h| h == data.as_ref().key())
                    && data.test(value)
            })
            .collect()
    }

    /// Tests whether this annotation has data matching the search criteria, see [`Self::find_data()`]
    pub fn has_data(
        &self,
        set: impl Request<AnnotationDataSet>,
        key: impl Request<DataKey>,
        value: &DataOperator,
    ) -> bool {
        !self.find_data(set, key, value).is_empty()
    }

    /// Iterates over the text selections this annotation references.
    /// They are in textual order for composite and multi selectors, and in declaration order for directional selectors.
    pub fn textselections(&self) -> impl Iterator<Item = ResultTextSelection<'store>> + 'store {
        let rootstore = self.rootstore();
        self.as_ref()
            .textselection_handles()
            .iter()
            .filter_map(move |(res_handle, ts_handle)| {
                rootstore
                    .resource(*res_handle)
                    .ok()?
                    .textselection_by_handle(*ts_handle)
                    .ok()
            })
    }

    /// Returns the text selections this annotation references as a [`TextSelectionSet`]
    pub fn textselectionset(&self) -> TextSelectionSet {
        self.textselections().collect()
    }

    /// Returns the text this annotation references, one slice per text selection.
    /// An annotation that targets a resource as a whole (via a [`Selector::ResourceSelector`]) returns the full text of the resource.
    pub fn text(&self) -> Vec<&'store str> {
        if let Selector::ResourceSelector(res_handle) = self.target() {
            if let Ok(resource) = self.rootstore().resource(*res_handle) {
                return vec![resource.as_ref().text()];
            }
        }
        self.textselections()
            .map(|textselection| textselection.text())
            .collect()
    }

    /// Returns the text of this annotation if it references exactly one text, None otherwise
    pub fn text_simple(&self) -> Option<&'store str> {
        let text = self.text();
        if text.len() == 1 {
            text.into_iter().next()
        } else {
            None
        }
    }

    /// Returns the resources this annotation targets, either via its text or as a whole. Each resource is returned once.
    pub fn resources(&self) -> Vec<ResultItem<'store, TextResource>> {
        let mut handles: Vec<TextResourceHandle> = Vec::new();
        for selector in self.target().leaves() {
            if let Selector::ResourceSelector(res_handle) = &*selector {
                handles.push(*res_handle);
            }
        }
        handles.extend(
            self.as_ref()
                .textselection_handles()
                .iter()
                .map(|(res_handle, _)| *res_handle),
        );
        let mut seen = std::collections::HashSet::new();
        handles.retain(|handle| seen.insert(*handle));
        let rootstore = self.rootstore();
        handles
            .into_iter()
            .filter_map(|handle| rootstore.resource(handle).ok())
            .collect()
    }

    /// Returns the datasets this annotation targets (via a [`Selector::DataSetSelector`])
    pub fn datasets(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationDataSet>> + 'store {
        let rootstore = self.rootstore();
        self.target()
            .leaves()
            .into_iter()
            .filter_map(move |selector| rootstore.dataset(selector.dataset_handle()?).ok())
    }

    /// Returns the annotations this annotation targets (via a [`Selector::AnnotationSelector`]), in the exact order
    /// they are pointed to. Use [`Self::annotations()`] for the reverse.
    pub fn annotations_in_targets_unsorted(
        &self,
    ) -> impl Iterator<Item = ResultItem<'store, Annotation>> + 'store {
        let rootstore = self.rootstore();
        self.target()
            .leaves()
            .into_iter()
            .filter_map(move |selector| rootstore.annotation(selector.annotation_handle()?).ok())
    }

    /// Returns the annotations this annotation targets, in textual order
    pub fn annotations_in_targets(&self) -> Vec<ResultItem<'store, Annotation>> {
        self.annotations_in_targets_unsorted().textual_order()
    }

    /// Returns the annotations that reference this annotation via an [`Selector::AnnotationSelector`], ordered by handle.
    /// Use [`Self::annotations_in_targets()`] for the annotations this one targets.
    pub fn annotations(&self) -> impl Iterator<Item = ResultItem<'store, Annotation>> + 'store {
        let rootstore = self.rootstore();
        let mut handles = rootstore.annotations_referencing(self.handle());
        handles.sort_unstable();
        handles.dedup();
        handles
            .into_iter()
            .filter_map(move |handle| rootstore.annotation(handle).ok())
    }

    /// Returns the text selections `X` for which `operator` holds between the text of this annotation and `X`.
    /// See [`crate::AnnotationStore::related_text()`].
    pub fn related_text(
        &self,
        operator: &TextSelectionOperator,
    ) -> Vec<ResultTextSelection<'store>> {
        self.rootstore()
            .related_text(&self.textselectionset(), operator)
    }

    /// Returns the annotations on the text related to the text of this annotation, deduplicated and ordered by
    /// the position of the related text. This annotation itself is never returned.
    pub fn annotations_by_related_text(
        &self,
        operator: &TextSelectionOperator,
    ) -> Vec<ResultItem<'store, Annotation>> {
        let mut annotations = annotations_of(self.related_text(operator));
        annotations.retain(|annotation| annotation.handle() != self.handle());
        annotations
    }

    /// Returns the substore this annotation was declared in, None if it was declared in the root store
    pub fn substore(&self) -> Option<ResultItem<'store, AnnotationSubStore>> {
        self.rootstore()
            .substore(self.as_ref().substore()?)
            .ok()
    }

    /// Sort key for textual order: the (resource, begin, end) triplets of the text selections
    pub(crate) fn textual_key(&self) -> Vec<(TextResourceHandle, usize, usize)> {
        let mut key: Vec<_> = self
            .textselections()
            .map(|textselection| {
                (
                    textselection.resource().handle(),
                    textselection.begin(),
                    textselection.end(),
                )
            })
            .collect();
        key.sort_unstable();
        key
    }
}
