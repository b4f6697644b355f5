/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for [`TextResource`]. This API is implemented on
//! [`ResultItem<TextResource>`].

use crate::annotation::Annotation;
use crate::error::StamError;
use crate::resources::TextResource;
use crate::store::*;
use crate::substore::AnnotationSubStore;
use crate::textselection::{ResultTextSelection, TextSelection, TextSelectionHandle};

impl<'store> ResultItem<'store, TextResource> {
    /// Returns an iterator over all text selections on this resource that are referenced by annotations,
    /// in textual order.
    pub fn textselections(&self) -> impl Iterator<Item = ResultTextSelection<'store>> + 'store {
        let resource = self.as_ref();
        let rootstore = self.rootstore();
        resource
            .textselection_handles()
            .into_iter()
            .filter_map(move |handle| {
                let textselection: &TextSelection = resource.get(&BuildItem::Handle(handle)).ok()?;
                Some(ResultTextSelection::Bound(
                    textselection.as_resultitem(resource, rootstore),
                ))
            })
    }

    /// Returns the number of text selections on this resource
    pub fn textselections_len(&self) -> usize {
        self.as_ref().textselections_len()
    }

    /// Returns a text selection on this resource by handle
    pub fn textselection_by_handle(
        &self,
        handle: TextSelectionHandle,
    ) -> Result<ResultTextSelection<'store>, StamError> {
        let textselection: &TextSelection = self.as_ref().get(&BuildItem::Handle(handle))?;
        Ok(ResultTextSelection::Bound(
            textselection.as_resultitem(self.as_ref(), self.rootstore()),
        ))
    }

    /// Returns the annotations that reference the text of this resource, in textual order of
    /// the text selections they were first found on. Each annotation is returned once.
    /// Annotations that target the resource as a whole are not included, see [`Self::annotations_as_metadata()`].
    pub fn annotations(&self) -> Vec<ResultItem<'store, Annotation>> {
        let mut seen = std::collections::HashSet::new();
        self.textselections()
            .flat_map(|textselection| textselection.annotations())
            .filter(|annotation| seen.insert(annotation.handle()))
            .collect()
    }

    /// Returns the annotations that target this resource as a whole (via a [`crate::Selector::ResourceSelector`]),
    /// i.e. annotations that are metadata of the resource.
    pub fn annotations_as_metadata(&self) -> impl Iterator<Item = ResultItem<'store, Annotation>> {
        let rootstore = self.rootstore();
        rootstore
            .annotations_by_resource_metadata(self.handle())
            .into_iter()
            .filter_map(move |handle| rootstore.annotation(handle).ok())
    }

    /// Returns the substores this resource was contributed by, empty if it was only declared in the root store
    pub fn substores(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationSubStore>> {
        let rootstore = self.rootstore();
        rootstore
            .resource_substore_map
            .get(self.handle())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(move |handle| rootstore.substore(handle).ok())
    }
}
