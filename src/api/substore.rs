/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for [`AnnotationSubStore`]. This API is implemented on
//! [`ResultItem<AnnotationSubStore>`].

use std::path::Path;

use crate::annotation::Annotation;
use crate::annotationdataset::AnnotationDataSet;
use crate::resources::TextResource;
use crate::store::*;
use crate::substore::AnnotationSubStore;

/// This is the implementation of the high-level API for [`AnnotationSubStore`].
impl<'store> ResultItem<'store, AnnotationSubStore> {
    /// Returns an iterator over all annotations declared in this substore, in declaration order.
    pub fn annotations(&self) -> impl Iterator<Item = ResultItem<'store, Annotation>> + 'store {
        let rootstore = self.rootstore();
        self.as_ref()
            .annotations()
            .iter()
            .filter_map(move |handle| rootstore.annotation(*handle).ok())
    }

    /// Returns the number of annotations declared in this substore
    pub fn annotations_len(&self) -> usize {
        self.as_ref().annotations().len()
    }

    /// Returns an iterator over all resources contributed by this substore.
    /// A resource may be shared with other substores.
    pub fn resources(&self) -> impl Iterator<Item = ResultItem<'store, TextResource>> + 'store {
        let rootstore = self.rootstore();
        self.as_ref()
            .resources()
            .iter()
            .filter_map(move |handle| rootstore.resource(*handle).ok())
    }

    /// Returns an iterator over all datasets contributed by this substore.
    /// A dataset may be shared with other substores.
    pub fn datasets(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationDataSet>> + 'store {
        let rootstore = self.rootstore();
        self.as_ref()
            .datasets()
            .iter()
            .filter_map(move |handle| rootstore.dataset(*handle).ok())
    }

    /// Returns the substore this one is nested in, None if it was included by the root store directly
    pub fn parent(&self) -> Option<ResultItem<'store, AnnotationSubStore>> {
        self.rootstore().substore(self.as_ref().parent()?).ok()
    }

    /// Returns the filename the substore was loaded from, if any
    pub fn filename(&self) -> Option<&'store Path> {
        self.as_ref().filename()
    }
}
