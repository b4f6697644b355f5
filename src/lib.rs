/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! ## Introduction
//!
//! STAM is a data model for stand-off text annotation. This library implements the core of the
//! model as an efficient in-memory store: texts are kept in resources, annotations point at
//! parts of those texts (or at other annotations, resources or datasets) via selectors, and
//! carry data (key/value pairs) from datasets.
//!
//! **What can you do with this library?**
//!
//! * Keep, build and manipulate an efficient in-memory store of texts and annotations on texts
//! * Search in annotations, data and text:
//!    * Search annotations by data and by relations between text fragments (overlap, embedding, adjacency, etc).
//!    * Search in text (incl. via regular expressions) and find annotations targeting found text selections.
//!    * Elementary text operations with regard for text offsets (splitting text on a delimiter, stripping text).
//!    * Search in data (set,key,value) and find annotations that use the data.
//! * Align two texts and express the result as transposition annotations.
//! * Compose a store out of substores, each contributing its own annotations, resources and datasets.
//!
//! The library consists of two APIs, a low-level API and a high-level API. The latter is of most
//! interest to end users and is implemented in `api/*.rs`.
//!
//! High-level API (or mixed low/high):
//! * [`AnnotationStore`]
//! * [`ResultItem<Annotation>`](struct.ResultItem.html#impl-ResultItem<'store,+Annotation>)
//! * [`ResultItem<AnnotationDataSet>`](struct.ResultItem.html#impl-ResultItem<'store,+AnnotationDataSet>)
//! * [`ResultItem<AnnotationData>`](struct.ResultItem.html#impl-ResultItem<'store,+AnnotationData>)
//! * [`ResultItem<DataKey>`](struct.ResultItem.html#impl-ResultItem<'store,+DataKey>)
//! * [`ResultItem<TextResource>`](struct.ResultItem.html#impl-ResultItem<'store,+TextResource>)
//! * [`ResultItem<AnnotationSubStore>`](struct.ResultItem.html#impl-ResultItem<'store,+AnnotationSubStore>)
//! * [`ResultTextSelection`]
//! * [`TextSelectionOperator`]
//! * [`DataValue`]
//! * [`DataOperator`]
//! * [`Cursor`]
//! * [`Offset`]
//!
//! Low-level API:
//! * [`Annotation`]
//! * [`AnnotationDataSet`]
//! * [`AnnotationData`]
//! * [`TextSelection`]
//! * [`TextResource`]

mod align;
mod annotation;
mod annotationdata;
mod annotationdataset;
mod annotationstore;
mod api;
mod config;
mod datakey;
mod datavalue;
mod error;
mod resources;
mod selector;
mod store;
mod substore;
mod text;
mod textselection;
mod types;

// Our internal crate structure is not very relevant to the outside world,
// expose all structs and traits in the root namespace, and be explicit about it:

pub use align::{
    align_texts, AbsoluteOrRelative, Alignment, AlignmentAlgorithm, AlignmentConfig,
    Transposition, TRANSPOSE_SET, TRANSPOSITION_KEY,
};
pub use annotation::{Annotation, AnnotationBuilder, AnnotationHandle};
pub use annotationdata::{AnnotationData, AnnotationDataBuilder, AnnotationDataHandle};
pub use annotationdataset::{AnnotationDataSet, AnnotationDataSetBuilder, AnnotationDataSetHandle};
pub use annotationstore::AnnotationStore;
pub use api::*;
pub use config::{Config, Configurable};
pub use datakey::{DataKey, DataKeyHandle};
pub use datavalue::{DataOperator, DataValue};
pub use error::StamError;
pub use resources::{TextResource, TextResourceBuilder, TextResourceHandle};
pub use selector::{Offset, Selector, SelectorBuilder, SelectorIter, SelectorKind};
pub use store::{
    BuildItem, Request, ResultItem, Storable, Store, StoreFor, StoreIter,
};
pub use substore::{AnnotationSubStore, AnnotationSubStoreHandle, StoreLoader};
pub use text::Text;
pub use textselection::{
    PositionIndex, PositionIndexItem, ResultTextSelection, TextSelection, TextSelectionHandle,
    TextSelectionOperator, TextSelectionSet,
};
pub use types::*;

pub use regex::{Regex, RegexSet};

mod tests;
