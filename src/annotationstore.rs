/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`AnnotationStore`], the root of the model. It owns all resources,
//! datasets and annotations, resolves selectors and keeps the reverse indices up to date.

use sealed::sealed;
use smallvec::SmallVec;

use crate::annotation::{Annotation, AnnotationBuilder, AnnotationHandle};
use crate::annotationdata::{AnnotationData, AnnotationDataBuilder, AnnotationDataHandle};
use crate::annotationdataset::{
    AnnotationDataSet, AnnotationDataSetBuilder, AnnotationDataSetHandle,
};
use crate::config::{Config, Configurable};
use crate::datakey::{DataKey, DataKeyHandle};
use crate::error::StamError;
use crate::resources::{TextResource, TextResourceBuilder, TextResourceHandle};
use crate::selector::{Offset, Selector, SelectorBuilder};
use crate::store::*;
use crate::substore::{AnnotationSubStore, AnnotationSubStoreHandle};
use crate::textselection::{
    ResultTextSelection, TextSelection, TextSelectionHandle, TextSelectionOperator,
    TextSelectionSet,
};
use crate::types::*;

/// An Annotation Store is an unordered collection of annotations, resources and
/// annotation data sets. It can be seen as the *root* of the *graph model* and the glue
/// that holds everything together. It is the entry point for any stam model.
///
/// Besides ownership, the store holds the reverse indices that allow lookups in every
/// direction: from text to annotations, from data to annotations and from annotations to the
/// annotations that reference them. All indices are updated as part of inserting or removing an
/// annotation, an annotation is either fully indexed or not present at all.
#[derive(Debug)]
pub struct AnnotationStore {
    pub(crate) id: Option<String>,
    pub(crate) config: Config,
    pub(crate) filename: Option<String>,

    pub(crate) annotations: Store<Annotation>,
    pub(crate) datasets: Store<AnnotationDataSet>,
    pub(crate) resources: Store<TextResource>,
    pub(crate) substores: Store<AnnotationSubStore>,

    /// Links to annotations by ID.
    pub(crate) annotation_idmap: IdMap<AnnotationHandle>,
    /// Links to resources by ID.
    pub(crate) resource_idmap: IdMap<TextResourceHandle>,
    /// Links to datasets by ID.
    pub(crate) dataset_idmap: IdMap<AnnotationDataSetHandle>,
    /// Links to substores by ID.
    pub(crate) substore_idmap: IdMap<AnnotationSubStoreHandle>,

    /// This is the reverse index for annotation data, it maps data (by set and data handle) to annotations
    pub(crate) dataset_data_annotation_map:
        TripleRelationMap<AnnotationDataSetHandle, AnnotationDataHandle, AnnotationHandle>,

    /// This is the reverse index for text, it maps TextResource => TextSelection => Annotation
    pub(crate) textrelationmap:
        TripleRelationMap<TextResourceHandle, TextSelectionHandle, AnnotationHandle>,

    /// Maps resources to annotations that reference them via a [`Selector::ResourceSelector`] (metadata)
    pub(crate) resource_annotation_metamap: RelationMap<TextResourceHandle, AnnotationHandle>,

    /// Maps datasets to annotations that reference them via a [`Selector::DataSetSelector`] (metadata)
    pub(crate) dataset_annotation_metamap: RelationMap<AnnotationDataSetHandle, AnnotationHandle>,

    /// Maps annotations to the annotations that reference them via a [`Selector::AnnotationSelector`]
    pub(crate) annotation_annotation_map: RelationMap<AnnotationHandle, AnnotationHandle>,

    /// Maps resources to the substores they were contributed by
    pub(crate) resource_substore_map: RelationMap<TextResourceHandle, AnnotationSubStoreHandle>,

    /// Maps datasets to the substores they were contributed by
    pub(crate) dataset_substore_map: RelationMap<AnnotationDataSetHandle, AnnotationSubStoreHandle>,
}

#[sealed]
impl TypeInfo for AnnotationStore {
    fn typeinfo() -> Type {
        Type::AnnotationStore
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Configurable for AnnotationStore {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Sets the configuration, it is inherited by all resources and datasets in the store
    fn set_config(&mut self, config: Config) -> &mut Self {
        for resource in self.resources.iter_mut().flatten() {
            resource.set_config(config.clone());
        }
        for dataset in self.datasets.iter_mut().flatten() {
            dataset.set_config(config.clone());
        }
        self.config = config;
        self
    }
}

#[sealed]
impl StoreFor<TextResource> for AnnotationStore {
    fn store(&self) -> &Store<TextResource> {
        &self.resources
    }
    fn store_mut(&mut self) -> &mut Store<TextResource> {
        &mut self.resources
    }
    fn idmap(&self) -> Option<&IdMap<TextResourceHandle>> {
        Some(&self.resource_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<TextResourceHandle>> {
        Some(&mut self.resource_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "TextResource in AnnotationStore"
    }

    fn preinsert(&self, item: &mut TextResource) -> Result<(), StamError> {
        item.set_config(self.config.clone());
        Ok(())
    }

    /// Refuses to remove resources that annotations still depend on, use [`AnnotationStore::remove_resource()`]
    /// to cascade.
    fn preremove(&mut self, handle: TextResourceHandle) -> Result<(), StamError> {
        if !self.annotations_by_resource_handle(handle).is_empty() {
            return Err(StamError::InUse(
                "Refusing to remove resource because there are still annotations referencing it",
            ));
        }
        self.resource_annotation_metamap.remove_all(handle);
        self.textrelationmap.remove_second(handle);
        if let Some(substores) = self.resource_substore_map.get(handle).cloned() {
            for substore in substores {
                if let Some(Some(substore)) = self.substores.get_mut(substore.as_usize()) {
                    substore.resources.retain(|x| *x != handle);
                }
            }
        }
        self.resource_substore_map.remove_all(handle);
        Ok(())
    }
}

#[sealed]
impl StoreFor<AnnotationDataSet> for AnnotationStore {
    fn store(&self) -> &Store<AnnotationDataSet> {
        &self.datasets
    }
    fn store_mut(&mut self) -> &mut Store<AnnotationDataSet> {
        &mut self.datasets
    }
    fn idmap(&self) -> Option<&IdMap<AnnotationDataSetHandle>> {
        Some(&self.dataset_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<AnnotationDataSetHandle>> {
        Some(&mut self.dataset_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "AnnotationDataSet in AnnotationStore"
    }

    fn preinsert(&self, item: &mut AnnotationDataSet) -> Result<(), StamError> {
        item.set_config(self.config.clone());
        Ok(())
    }

    /// Refuses to remove datasets that annotations still depend on, use [`AnnotationStore::remove_dataset()`]
    /// to cascade.
    fn preremove(&mut self, handle: AnnotationDataSetHandle) -> Result<(), StamError> {
        if !self.annotations_by_dataset_handle(handle).is_empty() {
            return Err(StamError::InUse(
                "Refusing to remove dataset because there are still annotations referencing it",
            ));
        }
        self.dataset_annotation_metamap.remove_all(handle);
        self.dataset_data_annotation_map.remove_second(handle);
        if let Some(substores) = self.dataset_substore_map.get(handle).cloned() {
            for substore in substores {
                if let Some(Some(substore)) = self.substores.get_mut(substore.as_usize()) {
                    substore.datasets.retain(|x| *x != handle);
                }
            }
        }
        self.dataset_substore_map.remove_all(handle);
        Ok(())
    }
}

#[sealed]
impl StoreFor<Annotation> for AnnotationStore {
    fn store(&self) -> &Store<Annotation> {
        &self.annotations
    }
    fn store_mut(&mut self) -> &mut Store<Annotation> {
        &mut self.annotations
    }
    fn idmap(&self) -> Option<&IdMap<AnnotationHandle>> {
        Some(&self.annotation_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<AnnotationHandle>> {
        Some(&mut self.annotation_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "Annotation in AnnotationStore"
    }

    /// called after the item is inserted in the store
    /// updates all the reverse indices
    fn inserted(&mut self, handle: AnnotationHandle) -> Result<(), StamError> {
        let annotation: &Annotation = self.get(&BuildItem::Handle(handle))?;

        let data: SmallVec<[(AnnotationDataSetHandle, AnnotationDataHandle); 1]> =
            annotation.data().copied().collect();
        let textselections = annotation.textselections.clone();
        let substore = annotation.substore;
        let mut resources: Vec<TextResourceHandle> = Vec::new();
        let mut datasets: Vec<AnnotationDataSetHandle> = Vec::new();
        let mut targets: Vec<AnnotationHandle> = Vec::new();
        for selector in annotation.target().leaves() {
            match selector.as_ref() {
                Selector::ResourceSelector(res_handle) => resources.push(*res_handle),
                Selector::DataSetSelector(set_handle) => datasets.push(*set_handle),
                Selector::AnnotationSelector(a_handle, _) => targets.push(*a_handle),
                _ => {}
            }
        }

        for (set_handle, data_handle) in data {
            self.dataset_data_annotation_map
                .insert(set_handle, data_handle, handle);
        }

        if self.config.textrelationmap {
            for (res_handle, textselection_handle) in textselections {
                self.textrelationmap
                    .insert(res_handle, textselection_handle, handle);
            }
        }

        if self.config.resource_annotation_metamap {
            for res_handle in resources {
                self.resource_annotation_metamap.insert(res_handle, handle);
            }
        }

        if self.config.dataset_annotation_metamap {
            for set_handle in datasets {
                self.dataset_annotation_metamap.insert(set_handle, handle);
            }
        }

        if self.config.annotation_annotation_map {
            for a_handle in targets {
                self.annotation_annotation_map.insert(a_handle, handle);
            }
        }

        if let Some(substore_handle) = substore {
            let substore: &mut AnnotationSubStore =
                self.get_mut(&BuildItem::Handle(substore_handle))?;
            substore.annotations.push(handle);
        }

        Ok(())
    }

    /// Refuses to remove annotations that other annotations still reference, use
    /// [`AnnotationStore::remove_annotation()`] to cascade. Otherwise it removes the annotation from
    /// all indices, and drops text selections no other annotation uses anymore.
    fn preremove(&mut self, handle: AnnotationHandle) -> Result<(), StamError> {
        if !self.annotations_referencing(handle).is_empty() {
            return Err(StamError::InUse(
                "Refusing to remove annotation because other annotations still reference it",
            ));
        }

        let annotation: &Annotation = self.get(&BuildItem::Handle(handle))?;
        let data: SmallVec<[(AnnotationDataSetHandle, AnnotationDataHandle); 1]> =
            annotation.data().copied().collect();
        let mut textselections = annotation.textselections.clone();
        textselections.sort_unstable();
        textselections.dedup();
        let substore = annotation.substore;
        let mut resources: Vec<TextResourceHandle> = Vec::new();
        let mut datasets: Vec<AnnotationDataSetHandle> = Vec::new();
        let mut targets: Vec<AnnotationHandle> = Vec::new();
        for selector in annotation.target().leaves() {
            match selector.as_ref() {
                Selector::ResourceSelector(res_handle) => resources.push(*res_handle),
                Selector::DataSetSelector(set_handle) => datasets.push(*set_handle),
                Selector::AnnotationSelector(a_handle, _) => targets.push(*a_handle),
                _ => {}
            }
        }

        for (set_handle, data_handle) in data {
            self.dataset_data_annotation_map
                .remove(set_handle, data_handle, handle);
        }
        for res_handle in resources {
            self.resource_annotation_metamap.remove(res_handle, handle);
        }
        for set_handle in datasets {
            self.dataset_annotation_metamap.remove(set_handle, handle);
        }
        for a_handle in targets {
            self.annotation_annotation_map.remove(a_handle, handle);
        }
        self.annotation_annotation_map.remove_all(handle);

        for (res_handle, textselection_handle) in textselections {
            self.textrelationmap
                .remove(res_handle, textselection_handle, handle);
            if !self.textselection_in_use(res_handle, textselection_handle, handle) {
                debug(self.config(), || {
                    format!(
                        "AnnotationStore.preremove: dropping orphaned textselection {:?} in {:?}",
                        textselection_handle, res_handle
                    )
                });
                if let Ok(resource) =
                    <Self as StoreFor<TextResource>>::get_mut(self, &BuildItem::Handle(res_handle))
                {
                    resource.remove(textselection_handle)?;
                }
            }
        }

        if let Some(substore_handle) = substore {
            if let Some(Some(substore)) = self.substores.get_mut(substore_handle.as_usize()) {
                substore.annotations.retain(|x| *x != handle);
            }
        }
        Ok(())
    }
}

impl AnnotationStore {
    /// Creates a new empty annotation store with the given configuration.
    pub fn new(config: Config) -> Self {
        AnnotationStore {
            id: None,
            annotations: Vec::new(),
            datasets: Vec::new(),
            resources: Vec::new(),
            substores: Vec::new(),
            annotation_idmap: IdMap::new("A".to_string()),
            resource_idmap: IdMap::new("R".to_string()),
            dataset_idmap: IdMap::new("S".to_string()),
            substore_idmap: IdMap::new("Z".to_string()),
            dataset_data_annotation_map: TripleRelationMap::new(),
            textrelationmap: TripleRelationMap::new(),
            resource_annotation_metamap: RelationMap::new(),
            dataset_annotation_metamap: RelationMap::new(),
            annotation_annotation_map: RelationMap::new(),
            resource_substore_map: RelationMap::new(),
            dataset_substore_map: RelationMap::new(),
            config,
            filename: None,
        }
    }

    /// Sets the public identifier of the store (builder pattern)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the public identifier of the store, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Associates a filename with the store. It is used for substore cycle detection and by serialisers.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns the filename associated with the store, if any
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Builds and adds a resource (builder pattern)
    pub fn with_resource(mut self, builder: TextResourceBuilder) -> Result<Self, StamError> {
        self.add_resource(builder)?;
        Ok(self)
    }

    /// Builds and adds a dataset (builder pattern)
    pub fn with_dataset(mut self, builder: AnnotationDataSetBuilder) -> Result<Self, StamError> {
        self.add_dataset(builder)?;
        Ok(self)
    }

    /// Builds and adds an annotation (builder pattern)
    pub fn with_annotation(mut self, builder: AnnotationBuilder) -> Result<Self, StamError> {
        self.annotate(builder)?;
        Ok(self)
    }

    /// Builds and adds multiple annotations (builder pattern)
    pub fn with_annotations<'a>(
        mut self,
        builders: impl IntoIterator<Item = AnnotationBuilder<'a>>,
    ) -> Result<Self, StamError> {
        for builder in builders {
            self.annotate(builder)?;
        }
        Ok(self)
    }

    /// Builds and adds a resource, returns its handle
    pub fn add_resource(
        &mut self,
        builder: TextResourceBuilder,
    ) -> Result<TextResourceHandle, StamError> {
        let resource = builder.build(self.config.clone())?;
        self.insert(resource)
    }

    /// Builds and adds a dataset, returns its handle
    pub fn add_dataset(
        &mut self,
        builder: AnnotationDataSetBuilder,
    ) -> Result<AnnotationDataSetHandle, StamError> {
        let dataset = builder.build(self.config.clone())?;
        self.insert(dataset)
    }

    /// Resolves a reference to an existing item to its handle
    fn existing_handle<T>(&self, item: &BuildItem<T>) -> Result<T::HandleType, StamError>
    where
        T: Storable,
        Self: StoreFor<T>,
    {
        <Self as StoreFor<T>>::get(self, item)?.handle_or_err()
    }

    /// Builds a [`Selector`] from a [`SelectorBuilder`], resolving all references. Fails if a referenced item does not exist.
    pub fn selector(&self, item: SelectorBuilder) -> Result<Selector, StamError> {
        match item {
            SelectorBuilder::ResourceSelector(res) => {
                Ok(Selector::ResourceSelector(self.existing_handle(&res)?))
            }
            SelectorBuilder::TextSelector(res, offset) => {
                Ok(Selector::TextSelector(self.existing_handle(&res)?, offset))
            }
            SelectorBuilder::AnnotationSelector(annotation, offset) => Ok(
                Selector::AnnotationSelector(self.existing_handle(&annotation)?, offset),
            ),
            SelectorBuilder::DataSetSelector(dataset) => {
                Ok(Selector::DataSetSelector(self.existing_handle(&dataset)?))
            }
            SelectorBuilder::MultiSelector(subselectors) => Ok(Selector::MultiSelector(
                self.subselectors(subselectors)?,
            )),
            SelectorBuilder::CompositeSelector(subselectors) => Ok(Selector::CompositeSelector(
                self.subselectors(subselectors)?,
            )),
            SelectorBuilder::DirectionalSelector(subselectors) => Ok(
                Selector::DirectionalSelector(self.subselectors(subselectors)?),
            ),
        }
    }

    fn subselectors(&self, builders: Vec<SelectorBuilder>) -> Result<Vec<Selector>, StamError> {
        if builders.is_empty() {
            return Err(StamError::IncompleteError(
                "complex selector has no subselectors".to_string(),
                "AnnotationStore::selector",
            ));
        }
        let mut subselectors = Vec::with_capacity(builders.len());
        for builder in builders {
            subselectors.push(self.selector(builder)?);
        }
        Ok(Selector::compress(subselectors))
    }

    /// Resolves a selector to the text selections it denotes.
    ///
    /// * Resource and dataset selectors denote no text.
    /// * Annotation selectors resolve the target's text first and apply the offset relative to the concatenation of it.
    ///   `ancestors` holds the annotations currently being resolved, reaching one of them again is a [`StamError::CyclicSelectorError`].
    /// * Multi and composite selectors yield text in textual order (deduplicated), directional selectors in declaration order.
    ///
    /// Returned text selections carry a handle if the resource already holds them.
    pub(crate) fn textselections_by_selector(
        &self,
        selector: &Selector,
        ancestors: &mut Vec<AnnotationHandle>,
    ) -> Result<Vec<(TextResourceHandle, TextSelection)>, StamError> {
        match selector {
            Selector::TextSelector(res_handle, offset) => {
                let resource: &TextResource = self.get(&BuildItem::Handle(*res_handle))?;
                Ok(vec![(*res_handle, resource.textselection_by_offset(offset)?)])
            }
            Selector::ResourceSelector(_) | Selector::DataSetSelector(_) => Ok(Vec::new()),
            Selector::AnnotationSelector(a_handle, offset) => {
                let annotation: &Annotation = self.get(&BuildItem::Handle(*a_handle))?;
                if ancestors.contains(a_handle) {
                    debug(self.config(), || {
                        format!(
                            "AnnotationStore.textselections_by_selector: cycle detected at {:?}",
                            a_handle
                        )
                    });
                    return Err(StamError::CyclicSelectorError(
                        annotation
                            .id()
                            .map(|x| x.to_string())
                            .unwrap_or_else(|| format!("{:?}", a_handle)),
                        "AnnotationStore::textselections_by_selector",
                    ));
                }
                ancestors.push(*a_handle);
                let result = self.textselections_by_selector(annotation.target(), ancestors);
                ancestors.pop();
                let textselections = result?;
                match offset {
                    Some(offset) if !offset.is_whole() => {
                        self.apply_relative_offset(&textselections, offset)
                    }
                    _ => Ok(textselections),
                }
            }
            Selector::MultiSelector(_)
            | Selector::CompositeSelector(_)
            | Selector::DirectionalSelector(_)
            | Selector::RangedAnnotationSelector { .. } => {
                let mut textselections = Vec::new();
                for subselector in selector.iter() {
                    textselections.extend(self.textselections_by_selector(&subselector, ancestors)?);
                }
                if !matches!(selector, Selector::DirectionalSelector(_)) {
                    textselections.sort_unstable();
                    textselections.dedup();
                }
                Ok(textselections)
            }
        }
    }

    /// Applies an offset relative to the concatenation of the given text selections, returns the parts of the
    /// text selections that fall within it.
    pub(crate) fn apply_relative_offset(
        &self,
        textselections: &[(TextResourceHandle, TextSelection)],
        offset: &Offset,
    ) -> Result<Vec<(TextResourceHandle, TextSelection)>, StamError> {
        let total: usize = textselections.iter().map(|(_, ts)| ts.len()).sum();
        let resolve = |cursor: &Cursor| -> Result<usize, StamError> {
            match *cursor {
                Cursor::BeginAligned(c) if c <= total => Ok(c),
                Cursor::EndAligned(c) if c <= 0 && c.unsigned_abs() <= total => {
                    Ok(total - c.unsigned_abs())
                }
                _ => Err(StamError::CursorOutOfBounds(
                    *cursor,
                    "Offset relative to the target annotation is out of bounds",
                )),
            }
        };
        let begin = resolve(&offset.begin)?;
        let end = resolve(&offset.end)?;
        if begin > end {
            return Err(StamError::InvalidOffset(
                offset.begin,
                offset.end,
                "End must be greater than or equal to begin",
            ));
        }

        let mut result = Vec::new();
        let mut spanbegin = 0;
        for (res_handle, textselection) in textselections {
            let spanend = spanbegin + textselection.len();
            let (b, e) = if begin == end {
                // an empty selection lands in the first span that contains the point
                if begin < spanbegin || begin > spanend {
                    spanbegin = spanend;
                    continue;
                }
                (begin, begin)
            } else {
                let b = begin.max(spanbegin);
                let e = end.min(spanend);
                if b >= e {
                    spanbegin = spanend;
                    continue;
                }
                (b, e)
            };
            let mut part = TextSelection::new(
                textselection.begin() + b - spanbegin,
                textselection.begin() + e - spanbegin,
            );
            let resource: &TextResource = self.get(&BuildItem::Handle(*res_handle))?;
            part.intid = resource.known_textselection(&part);
            result.push((*res_handle, part));
            if begin == end {
                break;
            }
            spanbegin = spanend;
        }
        Ok(result)
    }

    /// Adds a new annotation to the store, using an [`AnnotationBuilder`].
    ///
    /// The target is resolved and all data is validated before anything is modified: if this returns an error,
    /// the store is left untouched. Datasets and keys referenced by ID are created when they do not exist yet,
    /// data is deduplicated.
    pub fn annotate(&mut self, builder: AnnotationBuilder) -> Result<AnnotationHandle, StamError> {
        debug(self.config(), || {
            format!("AnnotationStore.annotate: builder={:?}", builder)
        });
        let AnnotationBuilder { id, data, target } = builder;

        let public_id: Option<String> = id.as_str().map(|x| x.to_string());
        if let Some(public_id) = public_id.as_ref() {
            if <Self as StoreFor<Annotation>>::resolve_id(self, public_id).is_ok() {
                return Err(StamError::DuplicateIdError(
                    public_id.clone(),
                    "AnnotationStore::annotate",
                ));
            }
        }

        let target = target.ok_or_else(|| {
            StamError::IncompleteError("no target".to_string(), "AnnotationStore::annotate")
        })?;
        let target = self.selector(target)?;
        let textselections = self.textselections_by_selector(&target, &mut Vec::new())?;

        let mut datasets: Vec<Option<AnnotationDataSetHandle>> = Vec::with_capacity(data.len());
        for (i, databuilder) in data.iter().enumerate() {
            datasets.push(self.validate_databuilder(databuilder)?);
            for other in data[..i].iter() {
                if other.dataset == databuilder.dataset
                    && other.id.is_id()
                    && other.id == databuilder.id
                    && (other.key != databuilder.key || other.value != databuilder.value)
                {
                    return Err(StamError::DuplicateIdError(
                        databuilder.id.as_str().unwrap_or_default().to_string(),
                        "AnnotationStore::annotate: data ID used twice with a different key or value",
                    ));
                }
            }
        }

        // validation complete, from here on we commit
        let mut annotationdata: SmallVec<[(AnnotationDataSetHandle, AnnotationDataHandle); 1]> =
            SmallVec::new();
        for (databuilder, set_handle) in data.into_iter().zip(datasets) {
            let set_handle = match set_handle {
                Some(set_handle) => set_handle,
                None => self.dataset_by_builditem_or_new(&databuilder.dataset)?,
            };
            let dataset: &mut AnnotationDataSet = self.get_mut(&BuildItem::Handle(set_handle))?;
            let data_handle = dataset.build_insert_data(databuilder)?;
            if !annotationdata.contains(&(set_handle, data_handle)) {
                annotationdata.push((set_handle, data_handle));
            }
        }

        let mut textselection_handles: SmallVec<[(TextResourceHandle, TextSelectionHandle); 1]> =
            SmallVec::new();
        for (res_handle, textselection) in textselections {
            let resource: &mut TextResource = self.get_mut(&BuildItem::Handle(res_handle))?;
            let textselection_handle = resource.insert_textselection(textselection)?;
            textselection_handles.push((res_handle, textselection_handle));
        }

        self.insert(Annotation::new(
            public_id,
            target,
            annotationdata,
            textselection_handles,
        ))
    }

    /// Checks whether data can be added by [`Self::annotate()`] without errors.
    /// Returns the handle of the dataset if it exists, None if it is going to be created.
    fn validate_databuilder(
        &self,
        databuilder: &AnnotationDataBuilder,
    ) -> Result<Option<AnnotationDataSetHandle>, StamError> {
        let context = "AnnotationStore::annotate: validating data";
        if databuilder.dataset.is_none() {
            return Err(StamError::IncompleteError(
                "data has no dataset".to_string(),
                context,
            ));
        }
        let Some(set_handle) = databuilder.dataset.to_handle(self) else {
            if databuilder.dataset.is_id() {
                //new dataset, everything must be specified by ID
                if databuilder.key.is_none() {
                    return Err(StamError::IncompleteError(
                        "data in a new dataset needs a key".to_string(),
                        context,
                    ));
                }
                if !databuilder.key.is_id() {
                    return Err(databuilder.key.error(context));
                }
                if databuilder.id.is_handle() {
                    return Err(databuilder.id.error(context));
                }
                return Ok(None);
            }
            return Err(databuilder.dataset.error(context));
        };
        let dataset: &AnnotationDataSet = self.get(&BuildItem::Handle(set_handle))?;

        if let Some(data_handle) = databuilder.id.to_handle(dataset) {
            let existing: &AnnotationData = dataset.annotationdata(data_handle)?;
            if databuilder.key.is_some() {
                let key_handle: Option<DataKeyHandle> = databuilder.key.to_handle(dataset);
                if key_handle != Some(existing.key()) || *existing.value() != databuilder.value {
                    return Err(StamError::DuplicateIdError(
                        databuilder.id.as_str().unwrap_or_default().to_string(),
                        "AnnotationStore::annotate: data with this ID exists but has a different key or value",
                    ));
                }
            }
            return Ok(Some(set_handle));
        } else if databuilder.id.is_handle() {
            return Err(databuilder.id.error(context));
        }

        if databuilder.key.is_none() {
            return Err(if databuilder.id.is_id() {
                databuilder.id.error(context)
            } else {
                StamError::IncompleteError("data has no key".to_string(), context)
            });
        }
        let has_key = <AnnotationDataSet as StoreFor<DataKey>>::has(dataset, &databuilder.key);
        if !has_key && !databuilder.key.is_id() {
            return Err(databuilder.key.error(context));
        }
        Ok(Some(set_handle))
    }

    fn dataset_by_builditem_or_new(
        &mut self,
        dataset: &BuildItem<AnnotationDataSet>,
    ) -> Result<AnnotationDataSetHandle, StamError> {
        if let Some(handle) = dataset.to_handle(self) {
            return Ok(handle);
        }
        let id = dataset
            .as_str()
            .ok_or_else(|| dataset.error("AnnotationStore::annotate"))?
            .to_string();
        debug(self.config(), || {
            format!("AnnotationStore.annotate: creating new dataset {}", id)
        });
        self.insert(AnnotationDataSet::new(self.config.clone()).with_id(id))
    }

    /// Returns the handles of the annotations that reference the given annotation via an [`Selector::AnnotationSelector`].
    /// Uses the reverse index if enabled, otherwise it scans all annotations.
    pub(crate) fn annotations_referencing(&self, handle: AnnotationHandle) -> Vec<AnnotationHandle> {
        if self.config.annotation_annotation_map {
            self.annotation_annotation_map
                .get(handle)
                .map(|v| v.iter().copied().filter(|x| *x != handle).collect())
                .unwrap_or_default()
        } else {
            self.annotations
                .iter()
                .flatten()
                .filter(|annotation| {
                    annotation.handle() != Some(handle)
                        && annotation.target().leaves().iter().any(|selector| {
                            selector.annotation_handle() == Some(handle)
                        })
                })
                .filter_map(|annotation| annotation.handle())
                .collect()
        }
    }

    /// Returns the handles of all annotations that depend on the resource, either via its text or as metadata
    pub(crate) fn annotations_by_resource_handle(
        &self,
        handle: TextResourceHandle,
    ) -> Vec<AnnotationHandle> {
        let mut result: Vec<AnnotationHandle> =
            if self.config.textrelationmap && self.config.resource_annotation_metamap {
                let mut result: Vec<AnnotationHandle> = self
                    .textrelationmap
                    .data
                    .get(handle.as_usize())
                    .into_iter()
                    .flat_map(|map| map.data.iter().flatten().copied())
                    .collect();
                if let Some(metadata) = self.resource_annotation_metamap.get(handle) {
                    result.extend(metadata.iter().copied());
                }
                result
            } else {
                self.annotations
                    .iter()
                    .flatten()
                    .filter(|annotation| {
                        annotation
                            .textselections
                            .iter()
                            .any(|(res_handle, _)| *res_handle == handle)
                            || annotation.target().leaves().iter().any(|selector| {
                                matches!(selector.as_ref(), Selector::ResourceSelector(h) if *h == handle)
                            })
                    })
                    .filter_map(|annotation| annotation.handle())
                    .collect()
            };
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Returns the handles of all annotations that depend on the dataset, either via its data or as metadata
    pub(crate) fn annotations_by_dataset_handle(
        &self,
        handle: AnnotationDataSetHandle,
    ) -> Vec<AnnotationHandle> {
        let mut result: Vec<AnnotationHandle> = self
            .dataset_data_annotation_map
            .data
            .get(handle.as_usize())
            .into_iter()
            .flat_map(|map| map.data.iter().flatten().copied())
            .collect();
        if self.config.dataset_annotation_metamap {
            if let Some(metadata) = self.dataset_annotation_metamap.get(handle) {
                result.extend(metadata.iter().copied());
            }
        } else {
            result.extend(
                self.annotations
                    .iter()
                    .flatten()
                    .filter(|annotation| {
                        annotation
                            .target()
                            .leaves()
                            .iter()
                            .any(|selector| selector.dataset_handle() == Some(handle))
                    })
                    .filter_map(|annotation| annotation.handle()),
            );
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Returns the handles of the annotations that use the given data
    pub(crate) fn annotations_by_data_handle(
        &self,
        set: AnnotationDataSetHandle,
        data: AnnotationDataHandle,
    ) -> Vec<AnnotationHandle> {
        self.dataset_data_annotation_map
            .get(set, data)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the handles of the annotations whose target resolved to exactly this text selection.
    /// Uses the reverse index if enabled, otherwise it scans all annotations.
    pub(crate) fn annotations_by_textselection_handle(
        &self,
        resource: TextResourceHandle,
        textselection: TextSelectionHandle,
    ) -> Vec<AnnotationHandle> {
        if self.config.textrelationmap {
            self.textrelationmap
                .get(resource, textselection)
                .cloned()
                .unwrap_or_default()
        } else {
            self.annotations
                .iter()
                .flatten()
                .filter(|annotation| {
                    annotation
                        .textselections
                        .contains(&(resource, textselection))
                })
                .filter_map(|annotation| annotation.handle())
                .collect()
        }
    }

    /// Returns the handles of the annotations that target the resource as a whole, via a [`Selector::ResourceSelector`]
    pub(crate) fn annotations_by_resource_metadata(
        &self,
        handle: TextResourceHandle,
    ) -> Vec<AnnotationHandle> {
        if self.config.resource_annotation_metamap {
            self.resource_annotation_metamap
                .get(handle)
                .cloned()
                .unwrap_or_default()
        } else {
            self.annotations
                .iter()
                .flatten()
                .filter(|annotation| {
                    annotation.target().leaves().iter().any(|selector| {
                        matches!(selector.as_ref(), Selector::ResourceSelector(h) if *h == handle)
                    })
                })
                .filter_map(|annotation| annotation.handle())
                .collect()
        }
    }

    /// Returns the handles of the annotations that target the dataset as a whole, via a [`Selector::DataSetSelector`]
    pub(crate) fn annotations_by_dataset_metadata(
        &self,
        handle: AnnotationDataSetHandle,
    ) -> Vec<AnnotationHandle> {
        if self.config.dataset_annotation_metamap {
            self.dataset_annotation_metamap
                .get(handle)
                .cloned()
                .unwrap_or_default()
        } else {
            self.annotations
                .iter()
                .flatten()
                .filter(|annotation| {
                    annotation
                        .target()
                        .leaves()
                        .iter()
                        .any(|selector| selector.dataset_handle() == Some(handle))
                })
                .filter_map(|annotation| annotation.handle())
                .collect()
        }
    }

    /// Is the text selection used by any annotation other than `excluding`?
    fn textselection_in_use(
        &self,
        resource: TextResourceHandle,
        textselection: TextSelectionHandle,
        excluding: AnnotationHandle,
    ) -> bool {
        self.annotations_by_textselection_handle(resource, textselection)
            .iter()
            .any(|x| *x != excluding)
    }

    /// Returns the text selections `X` for which `refset operator X` holds, i.e. the text related to the reference set.
    /// Only text selections that annotations refer to are considered.
    ///
    /// The text selections of the reference set itself are not returned, except for operators that relate a selection to itself
    /// (equality). Results are sorted by resource, then in textual order.
    pub fn related_text<'store>(
        &'store self,
        refset: &TextSelectionSet,
        operator: &TextSelectionOperator,
    ) -> Vec<ResultTextSelection<'store>> {
        let mut resources: Vec<TextResourceHandle> =
            refset.iter().map(|(res_handle, _)| *res_handle).collect();
        resources.sort_unstable();
        resources.dedup();

        let mut results = Vec::new();
        for res_handle in resources {
            let Ok(resource) =
                <Self as StoreFor<TextResource>>::get(self, &BuildItem::Handle(res_handle))
            else {
                continue;
            };
            let spans: Vec<&TextSelection> = refset
                .iter()
                .filter(|(r, _)| *r == res_handle)
                .map(|(_, textselection)| textselection)
                .collect();
            let minbegin = spans.iter().map(|ts| ts.begin()).min().unwrap_or(0);
            let maxbegin = spans.iter().map(|ts| ts.begin()).max().unwrap_or(0);
            let minend = spans.iter().map(|ts| ts.end()).min().unwrap_or(0);
            let maxend = spans.iter().map(|ts| ts.end()).max().unwrap_or(0);

            let index = resource.positionindex();
            let candidates: Box<dyn Iterator<Item = (usize, usize, TextSelectionHandle)>> =
                match operator {
                    TextSelectionOperator::Embeds | TextSelectionOperator::EmbedsAll => {
                        Box::new(index.beginning_in(minbegin..=maxend))
                    }
                    TextSelectionOperator::Embedded | TextSelectionOperator::EmbeddedAll => {
                        Box::new(index.beginning_in(..=maxend))
                    }
                    TextSelectionOperator::Overlaps | TextSelectionOperator::OverlapsAll => {
                        Box::new(index.beginning_in(..maxend))
                    }
                    TextSelectionOperator::Precedes | TextSelectionOperator::PrecedesAll => {
                        Box::new(index.beginning_in(minend..))
                    }
                    TextSelectionOperator::Succeeds | TextSelectionOperator::SucceedsAll => {
                        Box::new(index.beginning_in(..=maxbegin))
                    }
                    _ => Box::new(index.beginning_in(..)),
                };

            for (begin, end, textselection_handle) in candidates {
                let candidate = TextSelection {
                    intid: Some(textselection_handle),
                    begin,
                    end,
                };
                if !operator.reflexive()
                    && spans.iter().any(|textselection| **textselection == candidate)
                {
                    continue;
                }
                if refset.test(operator, res_handle, &candidate) {
                    results.push(ResultTextSelection::new(self, resource, candidate));
                }
            }
        }
        results
    }

    /// Removes an annotation from the store. Annotations that reference it (via an [`Selector::AnnotationSelector`]) are
    /// removed as well, recursively, so no selector is left dangling.
    pub fn remove_annotation(
        &mut self,
        annotation: impl Request<Annotation>,
    ) -> Result<(), StamError> {
        let handle = annotation
            .to_handle(self)
            .ok_or_else(|| annotation.error("AnnotationStore::remove_annotation"))?;
        <Self as StoreFor<Annotation>>::get(self, &BuildItem::Handle(handle))?;

        let mut visited = Vec::new();
        let mut order = Vec::new();
        self.cascade_order(handle, &mut visited, &mut order);
        for handle in order {
            debug(self.config(), || {
                format!("AnnotationStore.remove_annotation: removing {:?}", handle)
            });
            <Self as StoreFor<Annotation>>::remove(self, handle)?;
        }
        Ok(())
    }

    /// Computes a removal order in which referencing annotations precede the annotations they reference
    fn cascade_order(
        &self,
        handle: AnnotationHandle,
        visited: &mut Vec<AnnotationHandle>,
        order: &mut Vec<AnnotationHandle>,
    ) {
        if visited.contains(&handle) {
            return;
        }
        visited.push(handle);
        for referencing in self.annotations_referencing(handle) {
            self.cascade_order(referencing, visited, order);
        }
        order.push(handle);
    }

    /// Removes a resource from the store. All annotations that reference its text, or the resource as a whole, are removed first.
    pub fn remove_resource(
        &mut self,
        resource: impl Request<TextResource>,
    ) -> Result<(), StamError> {
        let handle = resource
            .to_handle(self)
            .ok_or_else(|| resource.error("AnnotationStore::remove_resource"))?;
        <Self as StoreFor<TextResource>>::get(self, &BuildItem::Handle(handle))?;
        for annotation in self.annotations_by_resource_handle(handle) {
            if <Self as StoreFor<Annotation>>::has(self, &BuildItem::Handle(annotation)) {
                debug(self.config(), || {
                    format!(
                        "AnnotationStore.remove_resource: cascading to {:?}",
                        annotation
                    )
                });
                self.remove_annotation(annotation)?;
            }
        }
        <Self as StoreFor<TextResource>>::remove(self, handle)
    }

    /// Removes a dataset from the store. All annotations that use its data, or reference the dataset as a whole, are removed first.
    pub fn remove_dataset(
        &mut self,
        dataset: impl Request<AnnotationDataSet>,
    ) -> Result<(), StamError> {
        let handle = dataset
            .to_handle(self)
            .ok_or_else(|| dataset.error("AnnotationStore::remove_dataset"))?;
        <Self as StoreFor<AnnotationDataSet>>::get(self, &BuildItem::Handle(handle))?;
        for annotation in self.annotations_by_dataset_handle(handle) {
            if <Self as StoreFor<Annotation>>::has(self, &BuildItem::Handle(annotation)) {
                debug(self.config(), || {
                    format!(
                        "AnnotationStore.remove_dataset: cascading to {:?}",
                        annotation
                    )
                });
                self.remove_annotation(annotation)?;
            }
        }
        <Self as StoreFor<AnnotationDataSet>>::remove(self, handle)
    }

    /// Removes data from a dataset. Fails with [`StamError::InUse`] if annotations still use the data.
    /// Cascading removal of annotations is not done at this level, regardless of `strict`.
    pub fn remove_data(
        &mut self,
        dataset: impl Request<AnnotationDataSet>,
        data: impl Request<AnnotationData>,
        strict: bool,
    ) -> Result<(), StamError> {
        let set_handle = dataset
            .to_handle(self)
            .ok_or_else(|| dataset.error("AnnotationStore::remove_data"))?;
        let annotationset: &AnnotationDataSet = self.get(&BuildItem::Handle(set_handle))?;
        let data_handle = data
            .to_handle(annotationset)
            .ok_or_else(|| data.error("AnnotationStore::remove_data"))?;
        debug(self.config(), || {
            format!(
                "AnnotationStore.remove_data: {:?} in {:?} (strict={})",
                data_handle, set_handle, strict
            )
        });
        if self
            .dataset_data_annotation_map
            .count(set_handle, data_handle)
            > 0
        {
            return Err(StamError::InUse(
                "Refusing to remove data because annotations still use it",
            ));
        }
        let annotationset: &mut AnnotationDataSet =
            self.get_mut(&BuildItem::Handle(set_handle))?;
        <AnnotationDataSet as StoreFor<AnnotationData>>::remove(annotationset, data_handle)
    }

    /// Removes a key, and all data using it, from a dataset. Fails with [`StamError::InUse`] if annotations still use any of that data.
    pub fn remove_key(
        &mut self,
        dataset: impl Request<AnnotationDataSet>,
        key: impl Request<DataKey>,
        strict: bool,
    ) -> Result<(), StamError> {
        let set_handle = dataset
            .to_handle(self)
            .ok_or_else(|| dataset.error("AnnotationStore::remove_key"))?;
        let annotationset: &AnnotationDataSet = self.get(&BuildItem::Handle(set_handle))?;
        let key_handle = key
            .to_handle(annotationset)
            .ok_or_else(|| key.error("AnnotationStore::remove_key"))?;
        let data_handles: Vec<AnnotationDataHandle> = annotationset
            .data_by_key(key_handle)
            .cloned()
            .unwrap_or_default();
        debug(self.config(), || {
            format!(
                "AnnotationStore.remove_key: {:?} in {:?} with {} data (strict={})",
                key_handle,
                set_handle,
                data_handles.len(),
                strict
            )
        });
        if data_handles.iter().any(|data_handle| {
            self.dataset_data_annotation_map
                .count(set_handle, *data_handle)
                > 0
        }) {
            return Err(StamError::InUse(
                "Refusing to remove key because annotations still use its data",
            ));
        }
        let annotationset: &mut AnnotationDataSet =
            self.get_mut(&BuildItem::Handle(set_handle))?;
        for data_handle in data_handles {
            <AnnotationDataSet as StoreFor<AnnotationData>>::remove(annotationset, data_handle)?;
        }
        <AnnotationDataSet as StoreFor<DataKey>>::remove(annotationset, key_handle)
    }
}
