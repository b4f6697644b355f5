/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for [`DataKey`]. This API is implemented on
//! [`ResultItem<DataKey>`].

use crate::annotation::Annotation;
use crate::annotationdata::AnnotationData;
use crate::annotationdataset::AnnotationDataSet;
use crate::datakey::DataKey;
use crate::store::*;

impl<'store> ResultItem<'store, DataKey> {
    /// Method to return a reference to the dataset that holds this key
    pub fn set(&self) -> ResultItem<'store, AnnotationDataSet> {
        self.store()
            .as_resultitem(self.rootstore(), self.rootstore())
    }

    /// Returns the public identifier that identifies the key
    pub fn as_str(&self) -> &'store str {
        self.as_ref().as_str()
    }

    /// Returns an iterator over all data ([`AnnotationData`]) that makes use of this key.
    pub fn data(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationData>> + 'store {
        let store = self.store();
        let rootstore = self.rootstore();
        store
            .data_by_key(self.handle())
            .into_iter()
            .flatten()
            .filter_map(move |data_handle| {
                store
                    .annotationdata(*data_handle)
                    .ok()
                    .map(|data| data.as_resultitem(store, rootstore))
            })
    }

    /// Returns all annotations ([`Annotation`]) that make use of this key, ordered by handle.
    pub fn annotations(&self) -> Vec<ResultItem<'store, Annotation>> {
        let rootstore = self.rootstore();
        let set_handle = self.set().handle();
        let mut handles: Vec<_> = self
            .store()
            .data_by_key(self.handle())
            .into_iter()
            .flatten()
            .flat_map(|data_handle| rootstore.annotations_by_data_handle(set_handle, *data_handle))
            .collect();
        handles.sort_unstable();
        handles.dedup();
        handles
            .into_iter()
            .filter_map(|handle| rootstore.annotation(handle).ok())
            .collect()
    }

    /// Tests whether two DataKeys are the same
    pub fn test(&self, other: impl Request<DataKey>) -> bool {
        Some(self.handle()) == other.to_handle(self.store())
    }
}
