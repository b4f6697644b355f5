/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for [`AnnotationData`]. This API is implemented on
//! [`ResultItem<AnnotationData>`].

use crate::annotation::Annotation;
use crate::annotationdata::AnnotationData;
use crate::annotationdataset::AnnotationDataSet;
use crate::datakey::DataKey;
use crate::datavalue::{DataOperator, DataValue};
use crate::store::*;

impl<'store> ResultItem<'store, AnnotationData> {
    /// Returns the key of this data
    pub fn key(&self) -> ResultItem<'store, DataKey> {
        let key: &DataKey = self
            .store()
            .key(self.as_ref().key())
            .expect("AnnotationData must always have a key at this point");
        key.as_resultitem(self.store(), self.rootstore())
    }

    /// Returns the value of this data
    pub fn value(&self) -> &'store DataValue {
        self.as_ref().value()
    }

    /// Returns the dataset this data is part of
    pub fn set(&self) -> ResultItem<'store, AnnotationDataSet> {
        self.store()
            .as_resultitem(self.rootstore(), self.rootstore())
    }

    /// Returns the annotations that use this data, ordered by handle
    pub fn annotations(&self) -> impl Iterator<Item = ResultItem<'store, Annotation>> + 'store {
        let rootstore = self.rootstore();
        let mut handles =
            rootstore.annotations_by_data_handle(self.set().handle(), self.handle());
        handles.sort_unstable();
        handles
            .into_iter()
            .filter_map(move |handle| rootstore.annotation(handle).ok())
    }

    /// Returns the number of annotations that use this data
    pub fn annotations_len(&self) -> usize {
        self.rootstore()
            .annotations_by_data_handle(self.set().handle(), self.handle())
            .len()
    }

    /// Tests the value of this data against an operator
    pub fn test(&self, operator: &DataOperator) -> bool {
        self.as_ref().value().test(operator)
    }
}
