/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::StamError;
use crate::types::*;

pub trait Configurable: Sized {
    /// Obtain the configuration
    fn config(&self) -> &Config;

    /// Obtain the configuration mutably
    fn config_mut(&mut self) -> &mut Config;

    ///Builder pattern to associate a configuration
    fn with_config(mut self, config: Config) -> Self {
        self.set_config(config);
        self
    }

    ///Setter to associate a configuration
    fn set_config(&mut self, config: Config) -> &mut Self;
}

/// This holds the configuration. It is not limited to configuring a single part of the model, but unifies all in a single configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Debug mode
    pub(crate) debug: bool,

    /// The working directory
    pub(crate) workdir: Option<PathBuf>,

    ///generate pseudo-random public identifiers when missing. Each will consist of 21 URL-friendly ASCII symbols after a prefix of A for Annotations, S for DataSets, D for AnnotationData, R for resources
    pub(crate) generate_ids: bool,

    /// Milestone placement interval (in unicode codepoints) in indexing text resources. A low number above zero increases search performance at the cost of memory and increased initialisation time.
    pub(crate) milestone_interval: usize,

    /// Enable/disable the reverse index for text, it maps TextResource => TextSelection => Annotation
    pub(crate) textrelationmap: bool,

    /// Enable/disable reverse index for TextResource => Annotation. Holds only annotations that **directly** reference the TextResource (via [`crate::Selector::ResourceSelector`]), i.e. metadata
    pub(crate) resource_annotation_metamap: bool,

    /// Enable/disable reverse index for AnnotationDataSet => Annotation. Holds only annotations that **directly** reference the AnnotationDataSet (via [`crate::Selector::DataSetSelector`]), i.e. metadata
    pub(crate) dataset_annotation_metamap: bool,

    /// Enable/disable index for annotations that reference other annotations
    pub(crate) annotation_annotation_map: bool,

    /// Files of the stores that are currently being loaded, outermost first. Used to detect cyclic substore inclusion.
    #[serde(skip)]
    pub(crate) include_chain: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            textrelationmap: true,
            resource_annotation_metamap: true,
            dataset_annotation_metamap: true,
            annotation_annotation_map: true,
            generate_ids: false,
            milestone_interval: 100,
            workdir: None,
            debug: false,
            include_chain: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable the reverse index for text, it maps TextResource => TextSelection => Annotation
    /// Do not change this on a configuration that is already in use!
    pub fn with_textrelationmap(mut self, value: bool) -> Self {
        self.textrelationmap = value;
        self
    }

    /// Is the reverse index for text enabled? It maps TextResource => TextSelection => Annotation
    pub fn textrelationmap(&self) -> bool {
        self.textrelationmap
    }

    /// Enable/disable reverse index for TextResource => Annotation. Holds only annotations that **directly** reference the TextResource (via [`crate::Selector::ResourceSelector`]), i.e. metadata
    /// Do not change this on a configuration that is already in use!
    pub fn with_resource_annotation_map(mut self, value: bool) -> Self {
        self.resource_annotation_metamap = value;
        self
    }

    /// Is the reverse index for TextResource => Annotation enabled?
    pub fn resource_annotation_map(&self) -> bool {
        self.resource_annotation_metamap
    }

    /// Enable/disable reverse index for AnnotationDataSet => Annotation. Holds only annotations that **directly** reference the AnnotationDataSet (via [`crate::Selector::DataSetSelector`]), i.e. metadata
    /// Do not change this on a configuration that is already in use!
    pub fn with_dataset_annotation_map(mut self, value: bool) -> Self {
        self.dataset_annotation_metamap = value;
        self
    }

    /// Is the reverse index for AnnotationDataSet => Annotation enabled?
    pub fn dataset_annotation_map(&self) -> bool {
        self.dataset_annotation_metamap
    }

    /// Enable/disable index for annotations that reference other annotations
    /// Do not change this on a configuration that is already in use!
    pub fn with_annotation_annotation_map(mut self, value: bool) -> Self {
        self.annotation_annotation_map = value;
        self
    }

    /// Is the index for annotations that reference other annotations enabled?
    pub fn annotation_annotation_map(&self) -> bool {
        self.annotation_annotation_map
    }

    /// Generate public IDs when missing.
    /// Each will consist of 21 URL-friendly ASCII symbols after a prefix of A for Annotations, S for DataSets, D for AnnotationData, R for resources
    pub fn with_generate_ids(mut self, value: bool) -> Self {
        self.generate_ids = value;
        self
    }

    /// Is generation of public IDs when missing enabled or not?
    pub fn generate_ids(&self) -> bool {
        self.generate_ids
    }

    /// Set the configured milestone interval
    /// The Milestone placement interval (in unicode codepoints) is used in indexing text resources. A low number above zero increases search performance at the cost of memory and increased initialisation time.
    pub fn with_milestone_interval(mut self, value: usize) -> Self {
        self.milestone_interval = value;
        self
    }

    /// Return the configured milestone interval
    pub fn milestone_interval(&self) -> usize {
        self.milestone_interval
    }

    /// Enable or disable debug mode. In debug mode, verbose output will be printed to standard error output
    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Is debug mode enabled or not?
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Sets the working directory, relative files (resources, substores) are resolved against it
    pub fn with_workdir(mut self, workdir: impl AsRef<Path>) -> Self {
        self.workdir = Some(workdir.as_ref().to_path_buf());
        self
    }

    ///  Return the working directory, if set
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Loads configuration from a JSON file. Fields that are not specified retain their default values.
    pub fn from_file(filename: &str) -> Result<Self, StamError> {
        let path = get_filepath(filename, None)?;
        let file = File::open(&path).map_err(|e| {
            StamError::IOError(e, filename.to_string(), "Config::from_file: opening file")
        })?;
        let reader = BufReader::new(file);
        let deserializer = &mut serde_json::Deserializer::from_reader(reader);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result
            .map_err(|e| StamError::JsonError(e, filename.to_string(), "Reading config from file"))
    }

    /// Loads configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, StamError> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result.map_err(|e| StamError::JsonError(e, String::new(), "Reading config from string"))
    }
}

#[sealed]
impl TypeInfo for Config {
    fn typeinfo() -> Type {
        Type::Config
    }
}
