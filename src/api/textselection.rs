/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the high-level API for text selections, implemented on [`ResultTextSelection`].

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::annotation::Annotation;
use crate::selector::Offset;
use crate::store::*;
use crate::textselection::{
    ResultTextSelection, TextSelection, TextSelectionOperator, TextSelectionSet,
};

impl<'store> ResultTextSelection<'store> {
    /// Returns the annotations whose target resolved to exactly this text selection, ordered by handle.
    /// An unbound text selection is not referenced by any annotation, so this returns nothing for it.
    pub fn annotations(&self) -> Vec<ResultItem<'store, Annotation>> {
        let rootstore = self.rootstore();
        match (self.resource_handle(), self.handle()) {
            (Some(resource), Some(handle)) => {
                let mut handles = rootstore.annotations_by_textselection_handle(resource, handle);
                handles.sort_unstable();
                handles.dedup();
                handles
                    .into_iter()
                    .filter_map(|handle| rootstore.annotation(handle).ok())
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Returns the number of annotations that reference this text selection
    pub fn annotations_len(&self) -> usize {
        match (self.resource_handle(), self.handle()) {
            (Some(resource), Some(handle)) => self
                .rootstore()
                .annotations_by_textselection_handle(resource, handle)
                .len(),
            _ => 0,
        }
    }

    /// Returns the text selections `X` for which `self operator X` holds.
    /// Only text selections that annotations refer to are considered, see [`crate::AnnotationStore::related_text()`].
    pub fn related_text(&self, operator: &TextSelectionOperator) -> Vec<ResultTextSelection<'store>> {
        match self.to_set() {
            Ok(refset) => self.rootstore().related_text(&refset, operator),
            Err(_) => Vec::new(),
        }
    }

    /// Returns the annotations on the text related to this text selection, deduplicated and ordered
    /// by the position of the related text.
    pub fn annotations_by_related_text(
        &self,
        operator: &TextSelectionOperator,
    ) -> Vec<ResultItem<'store, Annotation>> {
        annotations_of(self.related_text(operator))
    }

    /// Tests whether `self operator other` holds
    pub fn test(&self, operator: &TextSelectionOperator, other: &ResultTextSelection) -> bool {
        match (self.to_set(), other.to_set()) {
            (Ok(set), Ok(refset)) => set.test_set(operator, &refset),
            _ => false,
        }
    }

    /// Returns the offset of this text selection relative to the container, if it is embedded in it
    pub fn relative_offset(&self, container: &ResultTextSelection<'store>) -> Option<Offset> {
        if self.resource_handle() != container.resource_handle()
            || self.begin() < container.begin()
            || self.end() > container.end()
        {
            None
        } else {
            Some(Offset::simple(
                self.begin() - container.begin(),
                self.end() - container.begin(),
            ))
        }
    }
}

/// Collects the annotations of the given text selections, in order of the text selections, each annotation once.
pub(crate) fn annotations_of<'store>(
    textselections: impl IntoIterator<Item = ResultTextSelection<'store>>,
) -> Vec<ResultItem<'store, Annotation>> {
    let mut seen = HashSet::new();
    textselections
        .into_iter()
        .flat_map(|textselection| textselection.annotations())
        .filter(|annotation| seen.insert(annotation.handle()))
        .collect()
}

impl<'store> FromIterator<ResultTextSelection<'store>> for TextSelectionSet {
    fn from_iter<I: IntoIterator<Item = ResultTextSelection<'store>>>(iter: I) -> Self {
        iter.into_iter()
            .filter_map(|textselection| {
                textselection
                    .resource_handle()
                    .map(|resource| (resource, *textselection.inner()))
            })
            .collect()
    }
}

pub trait SortTextualOrder<T>
where
    T: PartialOrd,
{
    /// Sorts items in the iterator in textual order, items that do not relate to text at all will be put at the end.
    /// This method allocates and returns a buffer to do the sorting, it also removes duplicates.
    fn textual_order(&mut self) -> Vec<T>;
}

impl<'store, I> SortTextualOrder<ResultItem<'store, Annotation>> for I
where
    I: Iterator<Item = ResultItem<'store, Annotation>>,
{
    fn textual_order(&mut self) -> Vec<ResultItem<'store, Annotation>> {
        let mut v: Vec<_> = self
            .map(|annotation| (annotation.textual_key(), annotation))
            .collect();
        v.sort_by(|(key_a, a), (key_b, b)| {
            if key_a.is_empty() && key_b.is_empty() {
                a.handle().cmp(&b.handle())
            } else if key_a.is_empty() {
                Ordering::Greater
            } else if key_b.is_empty() {
                Ordering::Less
            } else {
                key_a.cmp(key_b).then_with(|| a.handle().cmp(&b.handle()))
            }
        });
        v.dedup_by(|(_, a), (_, b)| a == b);
        v.into_iter().map(|(_, annotation)| annotation).collect()
    }
}

impl<'store, I> SortTextualOrder<ResultTextSelection<'store>> for I
where
    I: Iterator<Item = ResultTextSelection<'store>>,
{
    fn textual_order(&mut self) -> Vec<ResultTextSelection<'store>> {
        let mut v: Vec<_> = self.collect();
        v.sort();
        v.dedup();
        v
    }
}

impl<I> SortTextualOrder<TextSelection> for I
where
    I: Iterator<Item = TextSelection>,
{
    fn textual_order(&mut self) -> Vec<TextSelection> {
        let mut v: Vec<_> = self.collect();
        v.sort();
        v.dedup();
        v
    }
}
