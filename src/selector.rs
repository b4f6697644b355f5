/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`Selector`], which identifies the target of an annotation, and
//! its unvalidated counterpart, the [`SelectorBuilder`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::annotation::{Annotation, AnnotationHandle};
use crate::annotationdataset::{AnnotationDataSet, AnnotationDataSetHandle};
use crate::resources::{TextResource, TextResourceHandle};
use crate::store::*;
use crate::types::*;

/// Text selection offset. Specifies begin and end offsets to select a range of a text, via two [`Cursor`] instances.
/// The end-point is non-inclusive.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Offset {
    pub begin: Cursor,
    pub end: Cursor,
}

impl Offset {
    pub fn new(begin: Cursor, end: Cursor) -> Self {
        Offset { begin, end }
    }

    /// Shortcut constructor to create a simple begin-aligned offset (less boilerplate)
    pub fn simple(begin: usize, end: usize) -> Self {
        Offset {
            begin: Cursor::BeginAligned(begin),
            end: Cursor::BeginAligned(end),
        }
    }

    /// Selects the text as a whole, this is the same as the default
    pub fn whole() -> Self {
        Self::default()
    }

    /// Does this offset select the whole of whatever it is applied to?
    pub fn is_whole(&self) -> bool {
        self.begin == Cursor::BeginAligned(0) && self.end == Cursor::EndAligned(0)
    }

    /// Is this a simple offset with begin-aligned cursors only?
    pub fn is_simple(&self) -> bool {
        self.begin.is_beginaligned() && self.end.is_beginaligned()
    }

    /// Returns the length if the offset is simple
    pub fn len(&self) -> Option<usize> {
        match (self.begin, self.end) {
            (Cursor::BeginAligned(begin), Cursor::BeginAligned(end)) => {
                Some(end.saturating_sub(begin))
            }
            (Cursor::EndAligned(begin), Cursor::EndAligned(end)) => {
                Some(end.saturating_sub(begin) as usize)
            }
            _ => None,
        }
    }
}

impl Default for Offset {
    /// The default constructor selects the text as a whole
    fn default() -> Self {
        Offset {
            begin: Cursor::BeginAligned(0),
            end: Cursor::EndAligned(0),
        }
    }
}

impl From<(usize, usize)> for Offset {
    fn from((begin, end): (usize, usize)) -> Self {
        Self::simple(begin, end)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}

/// A `Selector` identifies the target of an annotation and the part of the
/// target that the annotation applies to. Selectors can be considered the labelled edges of the graph model, tying all nodes together.
/// There are multiple types of selectors, all captured in this enum.
///
/// Selectors hold handles and are always valid for the store that holds the annotation.
/// You usually do not instantiate these directly but via [`SelectorBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Refers to a [`TextResource`] as a whole (as opposed to a text fragment inside it), as owned by an AnnotationStore.
    /// Annotations using this selector can be considered metadata of a text
    ResourceSelector(TextResourceHandle),
    /// Refers to an Annotation (as owned by the AnnotationStore) and optionally a *relative* text selection offset in it
    AnnotationSelector(AnnotationHandle, Option<Offset>),
    /// Refers to the TextResource (as owned by the AnnotationStore) an an offset in it
    TextSelector(TextResourceHandle, Offset),
    /// Refers to an [`AnnotationDataSet`] as owned by an AnnotationStore
    /// Annotations using this selector can be considered metadata.
    DataSetSelector(AnnotationDataSetHandle),

    /// A selector that combines selectors, where the annotation applies to each target
    /// individually, without any relation between the different targets. Leaving one out or
    /// adding one MUST NOT affect the interpretation of any of the others nor of the whole.
    MultiSelector(Vec<Selector>),

    /// A selector that consists of multiple other selectors, used to select more complex targets
    /// that transcend the idea of a single simple selection. This MUST be interpreted as the
    /// annotation applying equally to the conjunction as a whole, its parts being inter-dependent.
    /// The order of the selectors is not significant (use a [`Self::DirectionalSelector`] instead if it is).
    CompositeSelector(Vec<Selector>),

    /// Combines selectors and expresses a direction between two or more selectors in the exact order specified (from -> to)
    DirectionalSelector(Vec<Selector>),

    /// A compact form of consecutive [`Self::AnnotationSelector`]s without offset, referring to
    /// annotations `begin` up to and including `end`.
    /// This only occurs inside complex selectors and is expanded transparently upon iteration.
    RangedAnnotationSelector {
        begin: AnnotationHandle,
        end: AnnotationHandle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// See [`Selector`], this is a simplified variant that carries only the type, not the target.
pub enum SelectorKind {
    ResourceSelector = 1,
    AnnotationSelector = 2,
    TextSelector = 3,
    DataSetSelector = 4,
    MultiSelector = 5,
    CompositeSelector = 6,
    DirectionalSelector = 7,
    RangedAnnotationSelector = 8,
}

impl From<&Selector> for SelectorKind {
    fn from(selector: &Selector) -> Self {
        match selector {
            Selector::ResourceSelector(_) => Self::ResourceSelector,
            Selector::AnnotationSelector(_, _) => Self::AnnotationSelector,
            Selector::TextSelector(_, _) => Self::TextSelector,
            Selector::DataSetSelector(_) => Self::DataSetSelector,
            Selector::MultiSelector(_) => Self::MultiSelector,
            Selector::CompositeSelector(_) => Self::CompositeSelector,
            Selector::DirectionalSelector(_) => Self::DirectionalSelector,
            Selector::RangedAnnotationSelector { .. } => Self::RangedAnnotationSelector,
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::ResourceSelector => "ResourceSelector",
            Self::AnnotationSelector => "AnnotationSelector",
            Self::TextSelector => "TextSelector",
            Self::DataSetSelector => "DataSetSelector",
            Self::MultiSelector => "MultiSelector",
            Self::CompositeSelector => "CompositeSelector",
            Self::DirectionalSelector => "DirectionalSelector",
            Self::RangedAnnotationSelector => "RangedAnnotationSelector",
        };
        write!(f, "{}", s)
    }
}

#[sealed::sealed]
impl TypeInfo for Selector {
    fn typeinfo() -> Type {
        Type::Selector
    }
}

impl Selector {
    /// Returns a [`SelectorKind`]
    pub fn kind(&self) -> SelectorKind {
        self.into()
    }

    /// Is this a complex selector, i.e. one that holds other selectors?
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Self::MultiSelector(_) | Self::CompositeSelector(_) | Self::DirectionalSelector(_)
        )
    }

    /// Returns the resource handle if this selector points directly at a resource
    pub fn resource_handle(&self) -> Option<TextResourceHandle> {
        match self {
            Self::ResourceSelector(handle) | Self::TextSelector(handle, _) => Some(*handle),
            _ => None,
        }
    }

    /// Returns the dataset handle if this is a DataSetSelector
    pub fn dataset_handle(&self) -> Option<AnnotationDataSetHandle> {
        match self {
            Self::DataSetSelector(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Returns the annotation handle if this is an AnnotationSelector
    pub fn annotation_handle(&self) -> Option<AnnotationHandle> {
        match self {
            Self::AnnotationSelector(handle, _) => Some(*handle),
            _ => None,
        }
    }

    /// Returns the offset if the selector has one
    pub fn offset(&self) -> Option<&Offset> {
        match self {
            Self::TextSelector(_, offset) => Some(offset),
            Self::AnnotationSelector(_, offset) => offset.as_ref(),
            _ => None,
        }
    }

    /// Iterates over the immediate subselectors of a complex selector, in declaration order.
    /// Ranged selectors are expanded. For any other selector, the selector itself is the only item.
    pub fn iter(&self) -> SelectorIter<'_> {
        SelectorIter {
            selector: self,
            cursor: 0,
            subcursor: None,
            done: false,
        }
    }

    /// Returns all non-complex selectors held by this selector, recursively, in declaration order.
    /// Ranged selectors are expanded.
    pub fn leaves(&self) -> Vec<Cow<'_, Selector>> {
        let mut leaves = Vec::new();
        for subselector in self.iter() {
            match subselector {
                Cow::Borrowed(subselector) if subselector.is_complex() => {
                    leaves.extend(subselector.leaves())
                }
                subselector => leaves.push(subselector),
            }
        }
        leaves
    }

    /// Returns the number of (expanded) subselectors, 1 for a non-complex selector
    pub fn len(&self) -> usize {
        match self {
            Self::MultiSelector(v) | Self::CompositeSelector(v) | Self::DirectionalSelector(v) => {
                v.iter().map(|s| s.len()).sum()
            }
            Self::RangedAnnotationSelector { begin, end } => {
                end.as_usize() - begin.as_usize() + 1
            }
            _ => 1,
        }
    }

    /// Builds the subselectors vector for a complex selector, compressing runs of
    /// consecutive offset-less annotation selectors into ranged selectors.
    pub(crate) fn compress(subselectors: Vec<Selector>) -> Vec<Selector> {
        let mut result: Vec<Selector> = Vec::with_capacity(subselectors.len());
        for selector in subselectors {
            if let Selector::AnnotationSelector(handle, None) = selector {
                if let Some(last) = result.last_mut() {
                    match *last {
                        Selector::AnnotationSelector(prev, None)
                            if prev.as_usize() + 1 == handle.as_usize() =>
                        {
                            *last = Selector::RangedAnnotationSelector {
                                begin: prev,
                                end: handle,
                            };
                            continue;
                        }
                        Selector::RangedAnnotationSelector { ref mut end, .. }
                            if end.as_usize() + 1 == handle.as_usize() =>
                        {
                            *end = handle;
                            continue;
                        }
                        _ => {}
                    }
                }
            }
            result.push(selector);
        }
        result
    }
}

/// Iterator over the (expanded) subselectors of a selector, see [`Selector::iter()`].
/// Yields owned selectors only for the expanded items of a ranged selector.
pub struct SelectorIter<'a> {
    selector: &'a Selector,
    cursor: usize,
    subcursor: Option<usize>,
    done: bool,
}

impl<'a> Iterator for SelectorIter<'a> {
    type Item = Cow<'a, Selector>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.selector {
            Selector::MultiSelector(v)
            | Selector::CompositeSelector(v)
            | Selector::DirectionalSelector(v) => loop {
                let subselector = v.get(self.cursor)?;
                if let Selector::RangedAnnotationSelector { begin, end } = subselector {
                    let i = self.subcursor.unwrap_or(begin.as_usize());
                    if i <= end.as_usize() {
                        self.subcursor = Some(i + 1);
                        return Some(Cow::Owned(Selector::AnnotationSelector(
                            AnnotationHandle::new(i),
                            None,
                        )));
                    }
                    self.subcursor = None;
                    self.cursor += 1;
                } else {
                    self.cursor += 1;
                    return Some(Cow::Borrowed(subselector));
                }
            },
            Selector::RangedAnnotationSelector { begin, end } => {
                let i = self.subcursor.unwrap_or(begin.as_usize());
                if i <= end.as_usize() {
                    self.subcursor = Some(i + 1);
                    Some(Cow::Owned(Selector::AnnotationSelector(
                        AnnotationHandle::new(i),
                        None,
                    )))
                } else {
                    self.done = true;
                    None
                }
            }
            selector => {
                self.done = true;
                Some(Cow::Borrowed(selector))
            }
        }
    }
}

/// A `SelectorBuilder` is a recipe that, when applied, identifies the target of an annotation and the part of the
/// target that the annotation applies to. It is turned into a [`Selector`] by the [`crate::AnnotationStore`], which validates it.
///
/// A `SelectorBuilder` can refer to anything and is not validated yet, a `Selector` is and should not fail.
/// Targets are referenced by public ID or handle.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorBuilder<'a> {
    ResourceSelector(BuildItem<'a, TextResource>),
    AnnotationSelector(BuildItem<'a, Annotation>, Option<Offset>),
    TextSelector(BuildItem<'a, TextResource>, Offset),
    DataSetSelector(BuildItem<'a, AnnotationDataSet>),
    MultiSelector(Vec<SelectorBuilder<'a>>),
    CompositeSelector(Vec<SelectorBuilder<'a>>),
    DirectionalSelector(Vec<SelectorBuilder<'a>>),
}

impl<'a> SelectorBuilder<'a> {
    /// Selects a text fragment in a resource
    pub fn textselector(resource: impl Into<BuildItem<'a, TextResource>>, offset: impl Into<Offset>) -> Self {
        Self::TextSelector(resource.into(), offset.into())
    }

    /// Selects a resource as a whole
    pub fn resourceselector(resource: impl Into<BuildItem<'a, TextResource>>) -> Self {
        Self::ResourceSelector(resource.into())
    }

    /// Selects a dataset as a whole
    pub fn datasetselector(dataset: impl Into<BuildItem<'a, AnnotationDataSet>>) -> Self {
        Self::DataSetSelector(dataset.into())
    }

    /// Selects another annotation, optionally with an offset relative to the text that annotation references
    pub fn annotationselector(
        annotation: impl Into<BuildItem<'a, Annotation>>,
        offset: Option<Offset>,
    ) -> Self {
        Self::AnnotationSelector(annotation.into(), offset)
    }

    pub fn multiselector(subselectors: impl IntoIterator<Item = SelectorBuilder<'a>>) -> Self {
        Self::MultiSelector(subselectors.into_iter().collect())
    }

    pub fn compositeselector(subselectors: impl IntoIterator<Item = SelectorBuilder<'a>>) -> Self {
        Self::CompositeSelector(subselectors.into_iter().collect())
    }

    pub fn directionalselector(
        subselectors: impl IntoIterator<Item = SelectorBuilder<'a>>,
    ) -> Self {
        Self::DirectionalSelector(subselectors.into_iter().collect())
    }

    /// Returns a [`SelectorKind`]
    pub fn kind(&self) -> SelectorKind {
        match self {
            Self::ResourceSelector(_) => SelectorKind::ResourceSelector,
            Self::AnnotationSelector(_, _) => SelectorKind::AnnotationSelector,
            Self::TextSelector(_, _) => SelectorKind::TextSelector,
            Self::DataSetSelector(_) => SelectorKind::DataSetSelector,
            Self::MultiSelector(_) => SelectorKind::MultiSelector,
            Self::CompositeSelector(_) => SelectorKind::CompositeSelector,
            Self::DirectionalSelector(_) => SelectorKind::DirectionalSelector,
        }
    }

    /// Is this a complex selector, i.e. one that holds other selectors?
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Self::MultiSelector(_) | Self::CompositeSelector(_) | Self::DirectionalSelector(_)
        )
    }
}
