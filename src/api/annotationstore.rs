/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for the [`AnnotationStore`].
//! The high-level API is characterised by returning items as [`ResultItem<T>`], upon which further
//! object-specific API methods are implemented.

use crate::annotation::Annotation;
use crate::annotationdata::AnnotationData;
use crate::annotationdataset::AnnotationDataSet;
use crate::annotationstore::AnnotationStore;
use crate::datakey::DataKey;
use crate::datavalue::DataOperator;
use crate::error::StamError;
use crate::resources::TextResource;
use crate::store::*;
use crate::substore::AnnotationSubStore;
use crate::textselection::{TextSelectionHandle, ResultTextSelection};
use crate::types::*;

impl AnnotationStore {
    /// Looks up an item by request and wraps it as a [`ResultItem`]
    fn lookup<'store, T>(
        &'store self,
        request: impl Request<T>,
        contextmsg: &'static str,
    ) -> Result<ResultItem<'store, T>, StamError>
    where
        T: Storable<StoreType = AnnotationStore>,
        Self: StoreFor<T>,
    {
        let handle = request
            .to_handle(self)
            .ok_or_else(|| request.error(contextmsg))?;
        let item: &T = <Self as StoreFor<T>>::store(self)
            .get(handle.as_usize())
            .and_then(|item| item.as_ref())
            .ok_or_else(|| request.error(contextmsg))?;
        Ok(item.as_resultitem(self, self))
    }

    /// Requests a specific [`TextResource`] from the store to be returned by reference.
    /// The `request` parameter encapsulates some kind of identifier, it can be a `&str`, `String` or [`crate::TextResourceHandle`].
    ///
    /// Returns a [`StamError::IdNotFoundError`] or [`StamError::HandleError`] if it does not exist.
    pub fn resource(
        &self,
        request: impl Request<TextResource>,
    ) -> Result<ResultItem<TextResource>, StamError> {
        self.lookup(request, "AnnotationStore::resource")
    }

    /// Requests a specific [`AnnotationDataSet`] from the store to be returned by reference.
    pub fn dataset(
        &self,
        request: impl Request<AnnotationDataSet>,
    ) -> Result<ResultItem<AnnotationDataSet>, StamError> {
        self.lookup(request, "AnnotationStore::dataset")
    }

    /// Requests a specific [`Annotation`] from the store to be returned by reference.
    pub fn annotation(
        &self,
        request: impl Request<Annotation>,
    ) -> Result<ResultItem<Annotation>, StamError> {
        self.lookup(request, "AnnotationStore::annotation")
    }

    /// Requests a specific [`AnnotationSubStore`] from the store to be returned by reference.
    pub fn substore(
        &self,
        request: impl Request<AnnotationSubStore>,
    ) -> Result<ResultItem<AnnotationSubStore>, StamError> {
        self.lookup(request, "AnnotationStore::substore")
    }

    /// Requests a specific [`DataKey`] (pertaining to an [`AnnotationDataSet`]) to be returned by reference.
    pub fn key(
        &self,
        set: impl Request<AnnotationDataSet>,
        key: impl Request<DataKey>,
    ) -> Result<ResultItem<DataKey>, StamError> {
        self.dataset(set)?.key(key)
    }

    /// Requests a specific [`AnnotationData`] (pertaining to an [`AnnotationDataSet`]) to be returned by reference.
    pub fn annotationdata(
        &self,
        set: impl Request<AnnotationDataSet>,
        data: impl Request<AnnotationData>,
    ) -> Result<ResultItem<AnnotationData>, StamError> {
        self.dataset(set)?.annotationdata(data)
    }

    /// Requests a specific text selection by handle (pertaining to a [`TextResource`]).
    pub fn textselection(
        &self,
        resource: impl Request<TextResource>,
        handle: TextSelectionHandle,
    ) -> Result<ResultTextSelection, StamError> {
        self.resource(resource)?.textselection_by_handle(handle)
    }

    /// Returns an iterator over all text resources in the store, in insertion order.
    /// This includes resources contributed by substores.
    pub fn resources(&self) -> impl Iterator<Item = ResultItem<TextResource>> {
        <Self as StoreFor<TextResource>>::iter(self).map(|item| item.as_resultitem(self, self))
    }

    /// Returns an iterator over the text resources that were not contributed by any substore
    pub fn resources_no_substores(&self) -> impl Iterator<Item = ResultItem<TextResource>> {
        self.resources()
            .filter(move |resource| self.resource_substore_map.count(resource.handle()) == 0)
    }

    /// Returns an iterator over all datasets in the store, in insertion order.
    /// This includes datasets contributed by substores.
    pub fn datasets(&self) -> impl Iterator<Item = ResultItem<AnnotationDataSet>> {
        <Self as StoreFor<AnnotationDataSet>>::iter(self)
            .map(|item| item.as_resultitem(self, self))
    }

    /// Returns an iterator over the datasets that were not contributed by any substore
    pub fn datasets_no_substores(&self) -> impl Iterator<Item = ResultItem<AnnotationDataSet>> {
        self.datasets()
            .filter(move |dataset| self.dataset_substore_map.count(dataset.handle()) == 0)
    }

    /// Returns an iterator over all annotations in the store, in insertion order.
    /// Note that this will include all annotations from all substores, if you want only
    /// annotations declared in the root store, then use [`Self::annotations_no_substores()`] instead.
    pub fn annotations(&self) -> impl Iterator<Item = ResultItem<Annotation>> {
        <Self as StoreFor<Annotation>>::iter(self).map(|item| item.as_resultitem(self, self))
    }

    /// Returns an iterator over all annotations declared in the root store, excluding those from substores
    pub fn annotations_no_substores(&self) -> impl Iterator<Item = ResultItem<Annotation>> {
        self.annotations()
            .filter(|annotation| annotation.as_ref().substore().is_none())
    }

    /// Returns an iterator over all substores, including substores that are nested in others.
    pub fn substores(&self) -> impl Iterator<Item = ResultItem<AnnotationSubStore>> {
        <Self as StoreFor<AnnotationSubStore>>::iter(self)
            .map(|item| item.as_resultitem(self, self))
    }

    /// Returns an iterator over the substores included directly by this store, not nested ones
    pub fn substores_no_substores(&self) -> impl Iterator<Item = ResultItem<AnnotationSubStore>> {
        self.substores()
            .filter(|substore| substore.as_ref().parent().is_none())
    }

    /// Returns the number of resources. If `substores` is false, resources contributed by substores are not counted.
    pub fn resources_len(&self, substores: bool) -> usize {
        if substores {
            self.resources().count()
        } else {
            self.resources_no_substores().count()
        }
    }

    /// Returns the number of datasets. If `substores` is false, datasets contributed by substores are not counted.
    pub fn datasets_len(&self, substores: bool) -> usize {
        if substores {
            self.datasets().count()
        } else {
            self.datasets_no_substores().count()
        }
    }

    /// Returns the number of annotations. If `substores` is false, annotations from substores are not counted.
    pub fn annotations_len(&self, substores: bool) -> usize {
        if substores {
            self.annotations().count()
        } else {
            self.annotations_no_substores().count()
        }
    }

    /// Returns the number of substores. If `substores` is false, only substores included directly by this store are counted.
    pub fn substores_len(&self, substores: bool) -> usize {
        if substores {
            self.substores().count()
        } else {
            self.substores_no_substores().count()
        }
    }

    /// Finds [`AnnotationData`] using data search criteria, across datasets.
    ///
    /// You can pass a boolean (true/false, doesn't matter) for `set` or `key` to represent *any* set/key.
    /// To search for any value, pass [`DataOperator::Any`].
    /// Data is returned per dataset, in insertion order.
    ///
    /// Note: If you pass a `key` you must also pass `set`, otherwise the key will be ignored. You can not
    /// search for keys if you don't know their set.
    ///
    /// A request for a set or key that does not exist simply yields no results.
    ///
    /// ## Example
    ///
    /// ```
    /// # use stam::*;
    /// # fn main() -> Result<(),StamError> {
    /// let store = AnnotationStore::default()
    ///     .with_id("example")
    ///     .with_resource(TextResourceBuilder::new().with_id("myresource").with_text("Hello world"))?
    ///     .with_annotation(
    ///         AnnotationBuilder::new()
    ///             .with_id("A1")
    ///             .with_target(SelectorBuilder::textselector("myresource", Offset::simple(6, 11)))
    ///             .with_data_with_id("mydataset", "part-of-speech", "noun", "D1"),
    ///     )?;
    /// for annotationdata in store.find_data("mydataset", "part-of-speech", &DataOperator::Equals("noun")) {
    ///     assert_eq!(annotationdata.id(), Some("D1"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn find_data<'store>(
        &'store self,
        set: impl Request<AnnotationDataSet>,
        key: impl Request<DataKey>,
        value: &DataOperator,
    ) -> Vec<ResultItem<'store, AnnotationData>> {
        if !set.any() {
            return match self.dataset(set) {
                Ok(dataset) => dataset.find_data(key, value),
                Err(_) => Vec::new(),
            };
        } else if !key.any() {
            eprintln!("STAM warning: Providing a key without a set in data searches is invalid! Key will be ignored!");
        }
        self.datasets()
            .flat_map(|dataset| dataset.find_data(false, value))
            .collect()
    }

    /// Tests if certain annotation data exists, see [`Self::find_data()`].
    /// This gives no guarantee that data, although it exists, is actually used by annotations.
    pub fn test_data(
        &self,
        set: impl Request<AnnotationDataSet>,
        key: impl Request<DataKey>,
        value: &DataOperator,
    ) -> bool {
        !self.find_data(set, key, value).is_empty()
    }
}
