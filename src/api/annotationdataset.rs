/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for [`AnnotationDataSet`]. This API is implemented on
//! [`ResultItem<AnnotationDataSet>`].

use crate::annotation::Annotation;
use crate::annotationdata::{AnnotationData, AnnotationDataHandle};
use crate::annotationdataset::AnnotationDataSet;
use crate::datakey::DataKey;
use crate::datavalue::{DataOperator, DataValue};
use crate::error::StamError;
use crate::store::*;
use crate::substore::AnnotationSubStore;

impl<'store> ResultItem<'store, AnnotationDataSet> {
    /// Returns an iterator over all data in this set.
    pub fn data(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationData>> {
        let set = self.as_ref();
        let rootstore = self.rootstore();
        set.data().map(move |data| data.as_resultitem(set, rootstore))
    }

    /// Returns an iterator over all keys in this set
    pub fn keys(&self) -> impl Iterator<Item = ResultItem<'store, DataKey>> {
        let set = self.as_ref();
        let rootstore = self.rootstore();
        set.keys().map(move |key| key.as_resultitem(set, rootstore))
    }

    /// Returns the number of keys in this set
    pub fn keys_len(&self) -> usize {
        self.as_ref().keys_len()
    }

    /// Returns the number of data items in this set
    pub fn data_len(&self) -> usize {
        self.as_ref().data_len()
    }

    /// Retrieve a key in this set
    pub fn key(&self, key: impl Request<DataKey>) -> Result<ResultItem<'store, DataKey>, StamError> {
        let set = self.as_ref();
        set.key(key)
            .map(|key| key.as_resultitem(set, self.rootstore()))
    }

    /// Retrieve a [`AnnotationData`] in this set
    pub fn annotationdata(
        &self,
        data: impl Request<AnnotationData>,
    ) -> Result<ResultItem<'store, AnnotationData>, StamError> {
        let set = self.as_ref();
        set.annotationdata(data)
            .map(|data| data.as_resultitem(set, self.rootstore()))
    }

    /// Finds the [`AnnotationData`] in this set that matches the operator.
    /// Pass a boolean for `key` to search in any key. If the key does not exist, nothing is returned.
    pub fn find_data(
        &self,
        key: impl Request<DataKey>,
        value: &DataOperator,
    ) -> Vec<ResultItem<'store, AnnotationData>> {
        let set = self.as_ref();
        let rootstore = self.rootstore();
        let key_handle = if key.any() {
            None
        } else {
            match key.to_handle(set) {
                Some(key_handle) => Some(key_handle),
                None => return Vec::new(),
            }
        };
        //the low-level iterator is bound to the operator, results must outlive it
        let handles: Vec<AnnotationDataHandle> = set
            .find_data(key_handle, value)
            .filter_map(|data| data.handle())
            .collect();
        handles
            .into_iter()
            .filter_map(|handle| set.annotationdata(handle).ok())
            .map(|data| data.as_resultitem(set, rootstore))
            .collect()
    }

    /// Returns the data with exactly this key and value, if it exists
    pub fn data_by_value(
        &self,
        key: impl Request<DataKey>,
        value: &DataValue,
    ) -> Option<ResultItem<'store, AnnotationData>> {
        let set = self.as_ref();
        set.data_by_value(key, value)
            .map(|data| data.as_resultitem(set, self.rootstore()))
    }

    /// Returns all annotations that use data from this set or reference this set as metadata, ordered by handle
    pub fn annotations(&self) -> impl Iterator<Item = ResultItem<'store, Annotation>> {
        let rootstore = self.rootstore();
        rootstore
            .annotations_by_dataset_handle(self.handle())
            .into_iter()
            .filter_map(move |handle| rootstore.annotation(handle).ok())
    }

    /// Returns the annotations that target this set as a whole (via a [`crate::Selector::DataSetSelector`])
    pub fn annotations_as_metadata(&self) -> impl Iterator<Item = ResultItem<'store, Annotation>> {
        let rootstore = self.rootstore();
        rootstore
            .annotations_by_dataset_metadata(self.handle())
            .into_iter()
            .filter_map(move |handle| rootstore.annotation(handle).ok())
    }

    /// Returns the substores this set was contributed by, empty if it was only declared in the root store
    pub fn substores(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationSubStore>> {
        let rootstore = self.rootstore();
        rootstore
            .dataset_substore_map
            .get(self.handle())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(move |handle| rootstore.substore(handle).ok())
    }
}
