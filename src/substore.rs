/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the substore mechanism: an [`AnnotationStore`] can include other stores,
//! which contribute their resources, datasets and annotations to the including store while
//! the provenance of each item is retained in an [`AnnotationSubStore`].

use sealed::sealed;
use smallvec::SmallVec;
use std::path::{Path, PathBuf};

use crate::annotation::{Annotation, AnnotationHandle};
use crate::annotationdata::AnnotationDataHandle;
use crate::annotationdataset::{AnnotationDataSet, AnnotationDataSetHandle};
use crate::annotationstore::AnnotationStore;
use crate::config::{Config, Configurable};
use crate::datakey::DataKeyHandle;
use crate::error::StamError;
use crate::resources::{TextResource, TextResourceHandle};
use crate::selector::Selector;
use crate::store::*;
use crate::textselection::{TextSelection, TextSelectionHandle};
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct AnnotationSubStoreHandle(u16);

#[sealed]
impl Handle for AnnotationSubStoreHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u16)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

handle_conversions!(AnnotationSubStore, AnnotationSubStoreHandle);

/// A substore is a sub-collection of annotations, resources and datasets that was included from another annotation store.
/// The actual contents are owned by the parent [`AnnotationStore`]. This structure only holds references
/// that record which items were contributed by which included store.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSubStore {
    ///Internal numeric ID, corresponds with the index in the AnnotationStore::substores that has the ownership
    intid: Option<AnnotationSubStoreHandle>,

    pub(crate) id: Option<String>,

    /// path associated with this substore
    pub(crate) filename: Option<PathBuf>,

    /// Refers to the substore that included this one, None if this is a first level substore
    pub(crate) parent: Option<AnnotationSubStoreHandle>,

    pub(crate) annotations: Vec<AnnotationHandle>,
    pub(crate) resources: Vec<TextResourceHandle>,
    pub(crate) datasets: Vec<AnnotationDataSetHandle>,
}

impl PartialEq for AnnotationSubStore {
    fn eq(&self, other: &Self) -> bool {
        self.id.is_some() && self.id == other.id && self.filename == other.filename
    }
}

#[sealed]
impl TypeInfo for AnnotationSubStore {
    fn typeinfo() -> Type {
        Type::AnnotationSubStore
    }
}

#[sealed]
impl Storable for AnnotationSubStore {
    type HandleType = AnnotationSubStoreHandle;
    type StoreType = AnnotationStore;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
    fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }
    fn handle(&self) -> Option<Self::HandleType> {
        self.intid
    }
    fn set_handle(&mut self, handle: AnnotationSubStoreHandle) {
        self.intid = Some(handle);
    }
    fn carries_id() -> bool {
        true
    }
}

impl AnnotationSubStore {
    /// Returns the ID of the included annotation store (if any)
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the filename of the included annotation store (if any)
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Returns the substore that included this one, if any
    pub fn parent(&self) -> Option<AnnotationSubStoreHandle> {
        self.parent
    }

    /// Returns the annotations declared in this substore
    pub fn annotations(&self) -> &[AnnotationHandle] {
        &self.annotations
    }

    /// Returns the resources contributed by this substore
    pub fn resources(&self) -> &[TextResourceHandle] {
        &self.resources
    }

    /// Returns the datasets contributed by this substore
    pub fn datasets(&self) -> &[AnnotationDataSetHandle] {
        &self.datasets
    }

    fn with_parent(mut self, parent: Option<AnnotationSubStoreHandle>) -> Self {
        self.parent = parent;
        self
    }

    fn with_filename(mut self, filename: Option<PathBuf>) -> Self {
        self.filename = filename;
        self
    }
}

#[sealed]
impl StoreFor<AnnotationSubStore> for AnnotationStore {
    fn store(&self) -> &Store<AnnotationSubStore> {
        &self.substores
    }
    fn store_mut(&mut self) -> &mut Store<AnnotationSubStore> {
        &mut self.substores
    }
    fn idmap(&self) -> Option<&IdMap<AnnotationSubStoreHandle>> {
        Some(&self.substore_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<AnnotationSubStoreHandle>> {
        Some(&mut self.substore_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "AnnotationSubStore in AnnotationStore"
    }
}

/// Loads an annotation store from a file. This is the seam through which serialisation formats plug into
/// [`AnnotationStore::add_substore()`]; this library itself does not parse any file format.
///
/// The passed configuration must be used for the loaded store, it carries the chain of stores that are currently being
/// included so nested inclusions can be checked for cycles. Any closure with the right signature implements this trait.
pub trait StoreLoader {
    fn load(&self, path: &Path, config: &Config) -> Result<AnnotationStore, StamError>;
}

impl<F> StoreLoader for F
where
    F: Fn(&Path, &Config) -> Result<AnnotationStore, StamError>,
{
    fn load(&self, path: &Path, config: &Config) -> Result<AnnotationStore, StamError> {
        self(path, config)
    }
}

/// Handle mappings from an included store to the including store, indexed by the handles of the included store
#[derive(Default)]
struct SubStoreMapping {
    substores: Vec<Option<AnnotationSubStoreHandle>>,
    /// Substores of the included store that were already included before
    skipped: Vec<bool>,
    resources: Vec<Option<TextResourceHandle>>,
    datasets: Vec<Option<AnnotationDataSetHandle>>,
    data: Vec<Vec<Option<AnnotationDataHandle>>>,
    annotations: Vec<Option<AnnotationHandle>>,
}

fn mapped<H: Handle>(map: &[Option<H>], handle: H) -> Result<H, StamError> {
    map.get(handle.as_usize())
        .copied()
        .flatten()
        .ok_or(StamError::HandleError("substore merge: unmapped handle"))
}

impl AnnotationStore {
    /// Includes another annotation store, loaded from file by the given loader.
    ///
    /// * The filename is resolved against the configured working directory.
    /// * If the same file was already included, the existing substore handle is returned and nothing is loaded.
    /// * Including a file that is currently being loaded higher up the chain is a [`StamError::CyclicSubStoreError`].
    ///
    /// All resources, datasets and annotations of the included store become part of this store, and record
    /// the substore they came from. Resources and datasets with the same ID are shared rather than duplicated.
    pub fn add_substore(
        &mut self,
        filename: &str,
        loader: &impl StoreLoader,
    ) -> Result<AnnotationSubStoreHandle, StamError> {
        let path = get_filepath(filename, self.config.workdir())?;
        if let Some(handle) = self.substore_by_filename(&path) {
            debug(self.config(), || {
                format!(
                    "AnnotationStore.add_substore: {} already included as {:?}",
                    path.display(),
                    handle
                )
            });
            return Ok(handle);
        }
        self.check_include_cycle(&path)?;

        let mut config = self.config.clone();
        if let Some(own) = self.own_filepath()? {
            if !config.include_chain.contains(&own) {
                config.include_chain.push(own);
            }
        }
        config.include_chain.push(path.clone());
        debug(self.config(), || {
            format!(
                "AnnotationStore.add_substore: loading {} (chain depth {})",
                path.display(),
                config.include_chain.len()
            )
        });
        let child = loader.load(&path, &config)?;
        self.merge_substore(Some(path), child)
    }

    /// Includes an already constructed annotation store, with the same semantics as [`Self::add_substore()`].
    /// The filename is used to recognise the store if it is included again.
    pub fn add_substore_from_store(
        &mut self,
        filename: &str,
        store: AnnotationStore,
    ) -> Result<AnnotationSubStoreHandle, StamError> {
        let path = get_filepath(filename, self.config.workdir())?;
        if let Some(handle) = self.substore_by_filename(&path) {
            return Ok(handle);
        }
        self.check_include_cycle(&path)?;
        self.merge_substore(Some(path), store)
    }

    fn own_filepath(&self) -> Result<Option<PathBuf>, StamError> {
        match self.filename.as_deref() {
            Some(filename) => Ok(Some(get_filepath(filename, self.config.workdir())?)),
            None => Ok(None),
        }
    }

    fn check_include_cycle(&self, path: &Path) -> Result<(), StamError> {
        let own = self.own_filepath()?;
        if own.as_deref() == Some(path) || self.config.include_chain.iter().any(|x| x == path) {
            debug(self.config(), || {
                format!(
                    "AnnotationStore.add_substore: rejecting cyclic inclusion of {}",
                    path.display()
                )
            });
            return Err(StamError::CyclicSubStoreError(
                path.display().to_string(),
                "AnnotationStore::add_substore",
            ));
        }
        Ok(())
    }

    fn substore_by_filename(&self, path: &Path) -> Option<AnnotationSubStoreHandle> {
        <Self as StoreFor<AnnotationSubStore>>::iter(self)
            .find(|substore| substore.filename() == Some(path))
            .and_then(|substore| substore.handle())
    }

    /// Checks that the included store can be merged without conflicts, nothing is modified
    fn validate_substore(&self, child: &AnnotationStore, skipped: &[bool]) -> Result<(), StamError> {
        let context = "AnnotationStore::add_substore";
        for resource in <AnnotationStore as StoreFor<TextResource>>::iter(child) {
            if let Some(id) = resource.id() {
                if let Ok(existing) = <Self as StoreFor<TextResource>>::resolve_id(self, id) {
                    let existing: &TextResource = self.get(&BuildItem::Handle(existing))?;
                    if existing.text() != resource.text() {
                        return Err(StamError::DuplicateIdError(id.to_string(), context));
                    }
                }
            }
        }
        for dataset in <AnnotationStore as StoreFor<AnnotationDataSet>>::iter(child) {
            let Some(existing) = dataset
                .id()
                .and_then(|id| <Self as StoreFor<AnnotationDataSet>>::resolve_id(self, id).ok())
            else {
                continue;
            };
            let existing: &AnnotationDataSet = self.get(&BuildItem::Handle(existing))?;
            for data in dataset.data() {
                let Some(id) = data.id() else {
                    continue;
                };
                if let Ok(existing_data) = existing.annotationdata(id) {
                    let key = dataset.key(data.key())?;
                    let existing_key = existing.key(existing_data.key())?;
                    if key.as_str() != existing_key.as_str() || data.value() != existing_data.value()
                    {
                        return Err(StamError::DuplicateIdError(id.to_string(), context));
                    }
                }
            }
        }
        for annotation in <AnnotationStore as StoreFor<Annotation>>::iter(child) {
            if let Some(substore) = annotation.substore() {
                if skipped.get(substore.as_usize()).copied().unwrap_or(false) {
                    continue;
                }
            }
            if let Some(id) = annotation.id() {
                if <Self as StoreFor<Annotation>>::resolve_id(self, id).is_ok() {
                    return Err(StamError::DuplicateIdError(id.to_string(), context));
                }
            }
        }
        // every substore that merging inserts must have an unused ID, the nested ones included
        let mut substore_ids: Vec<&str> = child.id().into_iter().collect();
        for substore in <AnnotationStore as StoreFor<AnnotationSubStore>>::iter(child) {
            let Some(handle) = substore.handle() else {
                continue;
            };
            let existing = substore
                .filename()
                .and_then(|filename| self.substore_by_filename(filename));
            if existing.is_some() && skipped.get(handle.as_usize()).copied().unwrap_or(false) {
                continue;
            }
            if let Some(id) = substore.id() {
                substore_ids.push(id);
            }
        }
        for (i, id) in substore_ids.iter().enumerate() {
            if substore_ids[..i].contains(id)
                || <Self as StoreFor<AnnotationSubStore>>::resolve_id(self, id).is_ok()
            {
                return Err(StamError::DuplicateIdError(id.to_string(), context));
            }
        }
        Ok(())
    }

    /// Determines which substores of the included store were already included here (by filename)
    fn skipped_substores(&self, child: &AnnotationStore) -> Vec<bool> {
        let mut skipped = vec![false; child.substores.len()];
        for substore in <AnnotationStore as StoreFor<AnnotationSubStore>>::iter(child) {
            let Some(handle) = substore.handle() else {
                continue;
            };
            let parent_skipped = substore
                .parent()
                .map(|parent| skipped.get(parent.as_usize()).copied().unwrap_or(false))
                .unwrap_or(false);
            let known = substore
                .filename()
                .map(|filename| self.substore_by_filename(filename).is_some())
                .unwrap_or(false);
            skipped[handle.as_usize()] = parent_skipped || known;
        }
        skipped
    }

    /// Merges an included store into this one, returns the handle of the new substore
    fn merge_substore(
        &mut self,
        filename: Option<PathBuf>,
        child: AnnotationStore,
    ) -> Result<AnnotationSubStoreHandle, StamError> {
        let skipped = self.skipped_substores(&child);
        self.validate_substore(&child, &skipped)?;

        // validation passed, from here on we commit
        let sub_handle = self.insert(
            AnnotationSubStore {
                id: child.id.clone(),
                ..Default::default()
            }
            .with_filename(filename),
        )?;
        debug(self.config(), || {
            format!(
                "AnnotationStore.add_substore: merging as {:?}: {} resources, {} datasets, {} annotations",
                sub_handle,
                child.resources.len(),
                child.datasets.len(),
                child.annotations.len()
            )
        });

        let mut map = SubStoreMapping {
            skipped,
            ..Default::default()
        };
        self.merge_child_substores(&child, sub_handle, &mut map)?;
        self.merge_resources(&child, sub_handle, &mut map)?;
        self.merge_datasets(&child, sub_handle, &mut map)?;
        self.merge_annotations(&child, sub_handle, &mut map)?;
        Ok(sub_handle)
    }

    fn merge_child_substores(
        &mut self,
        child: &AnnotationStore,
        sub_handle: AnnotationSubStoreHandle,
        map: &mut SubStoreMapping,
    ) -> Result<(), StamError> {
        map.substores = vec![None; child.substores.len()];
        for substore in <AnnotationStore as StoreFor<AnnotationSubStore>>::iter(child) {
            let handle = substore.handle_or_err()?;
            let existing = substore
                .filename()
                .and_then(|filename| self.substore_by_filename(filename));
            let new_handle = match existing {
                Some(existing) if map.skipped[handle.as_usize()] => existing,
                _ => {
                    let parent = match substore.parent() {
                        Some(parent) => mapped(&map.substores, parent)?,
                        None => sub_handle,
                    };
                    self.insert(
                        AnnotationSubStore {
                            id: substore.id.clone(),
                            ..Default::default()
                        }
                        .with_filename(substore.filename.clone())
                        .with_parent(Some(parent)),
                    )?
                }
            };
            map.substores[handle.as_usize()] = Some(new_handle);
        }
        Ok(())
    }

    /// The substores an item of the included store should be attributed to
    fn provenance(
        map: &SubStoreMapping,
        child_substores: Option<&Vec<AnnotationSubStoreHandle>>,
        sub_handle: AnnotationSubStoreHandle,
    ) -> Vec<AnnotationSubStoreHandle> {
        match child_substores {
            Some(child_substores) if !child_substores.is_empty() => child_substores
                .iter()
                .filter_map(|h| map.substores.get(h.as_usize()).copied().flatten())
                .collect(),
            _ => vec![sub_handle],
        }
    }

    fn merge_resources(
        &mut self,
        child: &AnnotationStore,
        sub_handle: AnnotationSubStoreHandle,
        map: &mut SubStoreMapping,
    ) -> Result<(), StamError> {
        map.resources = vec![None; child.resources.len()];
        for resource in <AnnotationStore as StoreFor<TextResource>>::iter(child) {
            let child_handle = resource.handle_or_err()?;
            let existing = resource
                .id()
                .and_then(|id| <Self as StoreFor<TextResource>>::resolve_id(self, id).ok());
            let (handle, is_new) = match existing {
                Some(existing) => (existing, false),
                None => (self.insert(resource.share(self.config.clone()))?, true),
            };
            if is_new || self.resource_substore_map.count(handle) > 0 {
                for substore in Self::provenance(
                    map,
                    child.resource_substore_map.get(child_handle),
                    sub_handle,
                ) {
                    self.resource_substore_map.insert(handle, substore);
                    let substore: &mut AnnotationSubStore =
                        self.get_mut(&BuildItem::Handle(substore))?;
                    if !substore.resources.contains(&handle) {
                        substore.resources.push(handle);
                    }
                }
            }
            map.resources[child_handle.as_usize()] = Some(handle);
        }
        Ok(())
    }

    fn merge_datasets(
        &mut self,
        child: &AnnotationStore,
        sub_handle: AnnotationSubStoreHandle,
        map: &mut SubStoreMapping,
    ) -> Result<(), StamError> {
        map.datasets = vec![None; child.datasets.len()];
        map.data = vec![Vec::new(); child.datasets.len()];
        for dataset in <AnnotationStore as StoreFor<AnnotationDataSet>>::iter(child) {
            let child_handle = dataset.handle_or_err()?;
            let existing = dataset
                .id()
                .and_then(|id| <Self as StoreFor<AnnotationDataSet>>::resolve_id(self, id).ok());
            let (handle, is_new) = match existing {
                Some(existing) => (existing, false),
                None => {
                    let newset = match dataset.id() {
                        Some(id) => AnnotationDataSet::new(self.config.clone()).with_id(id),
                        None => AnnotationDataSet::new(self.config.clone()),
                    };
                    (self.insert(newset)?, true)
                }
            };

            let mut keymap: Vec<Option<DataKeyHandle>> = Vec::new();
            let mut datamap = Vec::new();
            let target: &mut AnnotationDataSet = self.get_mut(&BuildItem::Handle(handle))?;
            for key in dataset.keys() {
                let key_handle = key.handle_or_err()?;
                if keymap.len() <= key_handle.as_usize() {
                    keymap.resize(key_handle.as_usize() + 1, None);
                }
                keymap[key_handle.as_usize()] = Some(target.insert_key(key.as_str())?);
            }
            for data in dataset.data() {
                let data_handle = data.handle_or_err()?;
                let key = mapped(&keymap, data.key())?;
                let new_handle = target.insert_data(
                    data.id().into(),
                    BuildItem::Handle(key),
                    data.value().clone(),
                )?;
                if datamap.len() <= data_handle.as_usize() {
                    datamap.resize(data_handle.as_usize() + 1, None);
                }
                datamap[data_handle.as_usize()] = Some(new_handle);
            }
            map.data[child_handle.as_usize()] = datamap;

            if is_new || self.dataset_substore_map.count(handle) > 0 {
                for substore in Self::provenance(
                    map,
                    child.dataset_substore_map.get(child_handle),
                    sub_handle,
                ) {
                    self.dataset_substore_map.insert(handle, substore);
                    let substore: &mut AnnotationSubStore =
                        self.get_mut(&BuildItem::Handle(substore))?;
                    if !substore.datasets.contains(&handle) {
                        substore.datasets.push(handle);
                    }
                }
            }
            map.datasets[child_handle.as_usize()] = Some(handle);
        }
        Ok(())
    }

    /// Finds the annotation in this store that corresponds to an annotation of an already included substore
    fn previously_included(
        &self,
        child: &AnnotationStore,
        annotation: &Annotation,
        map: &SubStoreMapping,
    ) -> Option<AnnotationHandle> {
        let child_substore = annotation.substore()?;
        let handle = annotation.handle()?;
        let existing_substore = map.substores.get(child_substore.as_usize()).copied().flatten()?;
        let child_list = &child.substores.get(child_substore.as_usize())?.as_ref()?.annotations;
        let existing_list = &self.substores.get(existing_substore.as_usize())?.as_ref()?.annotations;
        if child_list.len() == existing_list.len() {
            let pos = child_list.iter().position(|x| *x == handle)?;
            return existing_list.get(pos).copied();
        }
        annotation
            .id()
            .and_then(|id| <Self as StoreFor<Annotation>>::resolve_id(self, id).ok())
    }

    fn merge_annotations(
        &mut self,
        child: &AnnotationStore,
        sub_handle: AnnotationSubStoreHandle,
        map: &mut SubStoreMapping,
    ) -> Result<(), StamError> {
        map.annotations = vec![None; child.annotations.len()];
        for annotation in <AnnotationStore as StoreFor<Annotation>>::iter(child) {
            let child_handle = annotation.handle_or_err()?;
            let skipped = annotation
                .substore()
                .map(|h| map.skipped.get(h.as_usize()).copied().unwrap_or(false))
                .unwrap_or(false);
            if skipped {
                if let Some(existing) = self.previously_included(child, annotation, map) {
                    map.annotations[child_handle.as_usize()] = Some(existing);
                    continue;
                }
            }

            let target = Self::remap_selector(annotation.target(), map)?;
            let mut data: SmallVec<[(AnnotationDataSetHandle, AnnotationDataHandle); 1]> =
                SmallVec::new();
            for (set, item) in annotation.data() {
                let set_handle = mapped(&map.datasets, *set)?;
                let datamap = map
                    .data
                    .get(set.as_usize())
                    .ok_or(StamError::HandleError("substore merge: unmapped dataset"))?;
                data.push((set_handle, mapped(datamap, *item)?));
            }

            let mut textselections: SmallVec<[(TextResourceHandle, TextSelectionHandle); 1]> =
                SmallVec::new();
            for (res, textselection) in annotation.textselection_handles() {
                let child_resource: &TextResource = child.get(&BuildItem::Handle(*res))?;
                let span: &TextSelection = child_resource.get(&BuildItem::Handle(*textselection))?;
                let res_handle = mapped(&map.resources, *res)?;
                let resource: &mut TextResource = self.get_mut(&BuildItem::Handle(res_handle))?;
                let handle =
                    resource.insert_textselection(TextSelection::new(span.begin(), span.end()))?;
                textselections.push((res_handle, handle));
            }

            let mut newannotation = Annotation::new(
                annotation.id().map(|x| x.to_string()),
                target,
                data,
                textselections,
            );
            newannotation.substore = Some(match annotation.substore() {
                Some(owner) => mapped(&map.substores, owner)?,
                None => sub_handle,
            });
            let handle = self.insert(newannotation)?;
            map.annotations[child_handle.as_usize()] = Some(handle);
        }
        Ok(())
    }

    fn remap_selector(selector: &Selector, map: &SubStoreMapping) -> Result<Selector, StamError> {
        Ok(match selector {
            Selector::TextSelector(res, offset) => {
                Selector::TextSelector(mapped(&map.resources, *res)?, *offset)
            }
            Selector::ResourceSelector(res) => {
                Selector::ResourceSelector(mapped(&map.resources, *res)?)
            }
            Selector::DataSetSelector(set) => {
                Selector::DataSetSelector(mapped(&map.datasets, *set)?)
            }
            Selector::AnnotationSelector(a, offset) => {
                Selector::AnnotationSelector(mapped(&map.annotations, *a)?, *offset)
            }
            Selector::MultiSelector(_)
            | Selector::CompositeSelector(_)
            | Selector::DirectionalSelector(_)
            | Selector::RangedAnnotationSelector { .. } => {
                let mut subselectors = Vec::with_capacity(selector.len());
                for subselector in selector.iter() {
                    subselectors.push(Self::remap_selector(&subselector, map)?);
                }
                let subselectors = Selector::compress(subselectors);
                match selector {
                    Selector::MultiSelector(_) => Selector::MultiSelector(subselectors),
                    Selector::DirectionalSelector(_) => Selector::DirectionalSelector(subselectors),
                    _ => Selector::CompositeSelector(subselectors),
                }
            }
        })
    }
}
