/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the low-level [`TextSelection`], the [`TextSelectionOperator`] algebra
//! that relates text selections (and sets thereof) to each other, and the [`PositionIndex`]
//! that resources use to look up text selections by position.

use sealed::sealed;
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::annotationstore::AnnotationStore;
use crate::error::StamError;
use crate::resources::{TextResource, TextResourceHandle};
use crate::selector::Offset;
use crate::store::*;
use crate::types::*;

/// Corresponds to a slice of the text. This only contains minimal
/// information; i.e. the begin offset and end offset.
///
/// This is similar to `Offset`, but that one uses cursors which may
/// be relative. TextSelection specified an offset in more absolute terms.
///
/// The actual reference to the [`TextResource`] is not stored in this structure but should
/// accompany it explicitly when needed. Text selections are owned by their resource, and are deduplicated there.
#[derive(Debug, Clone, Copy)]
pub struct TextSelection {
    pub(crate) intid: Option<TextSelectionHandle>,
    pub(crate) begin: usize,
    pub(crate) end: usize,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct TextSelectionHandle(u32);

#[sealed]
impl Handle for TextSelectionHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

handle_conversions!(TextSelection, TextSelectionHandle);

#[sealed]
impl TypeInfo for TextSelection {
    fn typeinfo() -> Type {
        Type::TextSelection
    }
}

#[sealed]
impl Storable for TextSelection {
    type HandleType = TextSelectionHandle;
    type StoreType = TextResource;

    fn handle(&self) -> Option<TextSelectionHandle> {
        self.intid
    }
    fn set_handle(&mut self, handle: TextSelectionHandle) {
        self.intid = Some(handle);
    }
    fn carries_id() -> bool {
        false
    }
}

// Text selections are identified by their offsets, the handle plays no part in comparisons

impl PartialEq for TextSelection {
    fn eq(&self, other: &Self) -> bool {
        self.begin == other.begin && self.end == other.end
    }
}

impl Eq for TextSelection {}

impl Hash for TextSelection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.begin.hash(state);
        self.end.hash(state);
    }
}

impl PartialOrd for TextSelection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextSelection {
    /// Text selections are ordered by begin offset, then by end offset
    fn cmp(&self, other: &Self) -> Ordering {
        self.begin
            .cmp(&other.begin)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl From<&TextSelection> for Offset {
    fn from(textselection: &TextSelection) -> Offset {
        Offset::simple(textselection.begin, textselection.end)
    }
}

impl TextSelection {
    /// Creates a new unbound text selection. It is not checked against any text.
    pub fn new(begin: usize, end: usize) -> Self {
        Self {
            intid: None,
            begin,
            end,
        }
    }

    /// Return the absolute begin position in unicode points
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Return the absolute end position in unicode points (non-inclusive)
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the selection in unicode points
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// This method is called to test whether a specific spatial relation (as expressed by the
    /// passed operator) holds between a [`TextSelection`] and another.
    /// Both are assumed to be on the same resource.
    /// A boolean is returned with the test result.
    pub fn test(&self, operator: &TextSelectionOperator, reftextsel: &TextSelection) -> bool {
        //note: at this level we deal with two singletons and there is no difference with the *All variants
        match operator {
            TextSelectionOperator::Equals
            | TextSelectionOperator::InSet
            | TextSelectionOperator::SameRangeAll => self == reftextsel,
            TextSelectionOperator::Overlaps | TextSelectionOperator::OverlapsAll => {
                self.begin < reftextsel.end && reftextsel.begin < self.end
            }
            TextSelectionOperator::Embeds | TextSelectionOperator::EmbedsAll => {
                // TextSelection embeds reftextsel
                reftextsel.begin >= self.begin && reftextsel.end <= self.end
            }
            TextSelectionOperator::Embedded | TextSelectionOperator::EmbeddedAll => {
                // TextSelection is embedded in reftextsel
                self.begin >= reftextsel.begin && self.end <= reftextsel.end
            }
            TextSelectionOperator::Precedes | TextSelectionOperator::PrecedesAll => {
                self.end <= reftextsel.begin
            }
            TextSelectionOperator::Succeeds | TextSelectionOperator::SucceedsAll => {
                self.begin >= reftextsel.end
            }
            TextSelectionOperator::LeftAdjacent | TextSelectionOperator::LeftAdjacentAll => {
                self.end == reftextsel.begin
            }
            TextSelectionOperator::RightAdjacent | TextSelectionOperator::RightAdjacentAll => {
                reftextsel.end == self.begin
            }
            TextSelectionOperator::SameBegin | TextSelectionOperator::SameBeginAll => {
                self.begin == reftextsel.begin
            }
            TextSelectionOperator::SameEnd | TextSelectionOperator::SameEndAll => {
                self.end == reftextsel.end
            }
            TextSelectionOperator::Not(suboperator) => !self.test(suboperator, reftextsel),
        }
    }
}

/// The text selection operator expresses a spatial relation between two sets of text selections (A and B).
/// A single text selection is the one-element case.
///
/// For the plain variants, the relation holds if it holds for any pair (a, b) with a in A and b in B.
/// The `*All` variants require the relation to hold for all pairs, or, for the boundary-based ones,
/// consider the leftmost/rightmost boundaries of the sets as a whole.
/// Text selections on different resources never relate to each other.
#[derive(Debug, Clone, PartialEq)]
pub enum TextSelectionOperator {
    /// Both sets cover the exact same text selections, and all are covered, commutative, transitive
    Equals,

    /// Some text selection in A overlaps with some text selection in B, commutative. Mere adjacency is not overlap.
    Overlaps,

    /// Each text selection in A overlaps with all text selections in B
    OverlapsAll,

    /// Some text selection in A embeds a text selection in B (boundaries may coincide)
    Embeds,

    /// All text selections in B are embedded by all text selections in A
    EmbedsAll,

    /// Some text selection in A is embedded by a text selection in B (boundaries may coincide)
    Embedded,

    /// All text selections in A are embedded by all text selections in B
    EmbeddedAll,

    /// Some text selection in A precedes (comes before) a text selection in B
    Precedes,

    /// All text selections in A precede (come before) all text selections in B. There is no overlap
    PrecedesAll,

    /// Some text selection in A succeeds (comes after) a text selection in B
    Succeeds,

    /// All text selections in A succeed (come after) all text selections in B. There is no overlap
    SucceedsAll,

    /// Some text selection in A ends where a text selection in B begins.
    LeftAdjacent,

    /// The rightmost text selection in A ends where the leftmost text selection in B begins
    LeftAdjacentAll,

    /// Some text selection in A begins where a text selection in B ends.
    RightAdjacent,

    /// The leftmost text selection in A begins where the rightmost text selection in B ends
    RightAdjacentAll,

    /// Some text selection in A starts where a text selection in B starts
    SameBegin,

    /// The leftmost text selection in A starts where the leftmost text selection in B starts
    SameBeginAll,

    /// Some text selection in A ends where a text selection in B ends
    SameEnd,

    /// The rightmost text selection in A ends where the rightmost text selection in B ends
    SameEndAll,

    /// Each text selection in A is in B as well, this is similar to Equals but allows
    /// for set B having unmatched items
    InSet,

    /// The leftmost text selection in A starts where the leftmost text selection in B starts and
    /// the rightmost text selection in A ends where the rightmost text selection in B ends
    SameRangeAll,

    /// Negation of the inner operator
    Not(Box<TextSelectionOperator>),
}

impl TextSelectionOperator {
    pub fn equals() -> Self {
        Self::Equals
    }

    pub fn overlaps() -> Self {
        Self::Overlaps
    }

    pub fn embeds() -> Self {
        Self::Embeds
    }

    pub fn embedded() -> Self {
        Self::Embedded
    }

    /// Alias for [`Self::Precedes`]
    pub fn before() -> Self {
        Self::Precedes
    }

    /// Alias for [`Self::Succeeds`]
    pub fn after() -> Self {
        Self::Succeeds
    }

    pub fn leftadjacent() -> Self {
        Self::LeftAdjacent
    }

    pub fn rightadjacent() -> Self {
        Self::RightAdjacent
    }

    pub fn samebegin() -> Self {
        Self::SameBegin
    }

    pub fn sameend() -> Self {
        Self::SameEnd
    }

    /// Negates this operator
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Is this operator an All variant?
    pub fn is_all(&self) -> bool {
        match self {
            Self::OverlapsAll
            | Self::EmbedsAll
            | Self::EmbeddedAll
            | Self::LeftAdjacentAll
            | Self::PrecedesAll
            | Self::RightAdjacentAll
            | Self::SucceedsAll
            | Self::SameBeginAll
            | Self::SameEndAll
            | Self::SameRangeAll => true,
            Self::Not(suboperator) => suboperator.is_all(),
            _ => false,
        }
    }

    /// Does this operator relate a selection to itself? (Equality-based operators do, all others are used to find *other* selections)
    pub(crate) fn reflexive(&self) -> bool {
        matches!(self, Self::Equals | Self::InSet | Self::SameRangeAll)
    }

    /// Returns the inverse operator, such that `A op B == B op.inverse() A`. Returns `None` if there is no single inverse.
    pub fn inverse(&self) -> Option<Self> {
        match self {
            Self::Equals => Some(Self::Equals),
            Self::Overlaps => Some(Self::Overlaps),
            Self::Embeds => Some(Self::Embedded),
            Self::Embedded => Some(Self::Embeds),
            Self::EmbedsAll => Some(Self::EmbeddedAll),
            Self::EmbeddedAll => Some(Self::EmbedsAll),
            Self::Precedes => Some(Self::Succeeds),
            Self::Succeeds => Some(Self::Precedes),
            Self::PrecedesAll => Some(Self::SucceedsAll),
            Self::SucceedsAll => Some(Self::PrecedesAll),
            Self::LeftAdjacent => Some(Self::RightAdjacent),
            Self::RightAdjacent => Some(Self::LeftAdjacent),
            Self::SameBegin => Some(Self::SameBegin),
            Self::SameEnd => Some(Self::SameEnd),
            Self::Not(suboperator) => suboperator.inverse().map(|x| x.not()),
            _ => None,
        }
    }
}

/// A set of text selections, each accompanied by the resource it pertains to.
/// This is the unit on which the [`TextSelectionOperator`] algebra is defined.
#[derive(Debug, Clone, Default)]
pub struct TextSelectionSet {
    data: SmallVec<[(TextResourceHandle, TextSelection); 2]>,
    sorted: bool,
}

impl TextSelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set containing a single text selection
    pub fn single(resource: TextResourceHandle, textselection: TextSelection) -> Self {
        Self {
            data: smallvec![(resource, textselection)],
            sorted: true,
        }
    }

    /// Adds a text selection to the set, duplicates are ignored
    pub fn insert(&mut self, resource: TextResourceHandle, textselection: TextSelection) {
        let elem = (resource, textselection);
        if self.sorted {
            //once sorted, we respect the order
            if let Err(pos) = self.data.binary_search(&elem) {
                self.data.insert(pos, elem)
            }
        } else if !self.data.contains(&elem) {
            self.data.push(elem);
        }
    }

    /// Iterate over the set
    pub fn iter(&self) -> impl Iterator<Item = &(TextResourceHandle, TextSelection)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sorts the text selections in this set in canonical text order. This needs to be done only once.
    /// Once the set is sorted, future inserts will retain the order (and therefore be slower)
    pub fn sort(&mut self) {
        if !self.sorted {
            self.data.sort_unstable();
            self.sorted = true;
        }
    }

    /// Returns the resource all text selections in this set pertain to, or None if the set is empty or spans multiple resources
    pub fn resource(&self) -> Option<TextResourceHandle> {
        let mut resource = None;
        for (res, _) in self.data.iter() {
            match resource {
                None => resource = Some(*res),
                Some(r) if r != *res => return None,
                _ => {}
            }
        }
        resource
    }

    /// Returns the left-most text selection (the one with the lowest begin offset) in the set.
    /// Only meaningful if all selections are on the same resource.
    pub fn leftmost(&self) -> Option<&TextSelection> {
        self.data
            .iter()
            .map(|(_, textselection)| textselection)
            .min_by_key(|textselection| (textselection.begin, textselection.end))
    }

    /// Returns the right-most text selection (the one with the highest end offset) in the set.
    /// Only meaningful if all selections are on the same resource.
    pub fn rightmost(&self) -> Option<&TextSelection> {
        self.data
            .iter()
            .map(|(_, textselection)| textselection)
            .max_by_key(|textselection| (textselection.end, textselection.begin))
    }

    /// This method is called to test whether a specific spatial relation (as expressed by the passed operator) holds between two [`TextSelectionSet`]s.
    /// A boolean is returned with the test result. Empty sets never relate to anything (but the negation of a relation on an empty set holds).
    pub fn test_set(&self, operator: &TextSelectionOperator, refset: &TextSelectionSet) -> bool {
        if let TextSelectionOperator::Not(suboperator) = operator {
            return !self.test_set(suboperator, refset);
        }
        if self.is_empty() || refset.is_empty() {
            return false;
        }
        match operator {
            TextSelectionOperator::Equals => {
                //each item must have a counterpart so the sets must be equal length
                self.len() == refset.len()
                    && self.iter().all(|a| refset.data.contains(a))
                    && refset.iter().all(|b| self.data.contains(b))
            }
            TextSelectionOperator::InSet => self.iter().all(|a| refset.data.contains(a)),
            TextSelectionOperator::Overlaps
            | TextSelectionOperator::Embeds
            | TextSelectionOperator::Embedded
            | TextSelectionOperator::Precedes
            | TextSelectionOperator::Succeeds
            | TextSelectionOperator::LeftAdjacent
            | TextSelectionOperator::RightAdjacent
            | TextSelectionOperator::SameBegin
            | TextSelectionOperator::SameEnd => {
                // any qualifying pair suffices
                self.iter().any(|(res_a, a)| {
                    refset
                        .iter()
                        .any(|(res_b, b)| res_a == res_b && a.test(operator, b))
                })
            }
            TextSelectionOperator::OverlapsAll
            | TextSelectionOperator::EmbedsAll
            | TextSelectionOperator::EmbeddedAll
            | TextSelectionOperator::PrecedesAll
            | TextSelectionOperator::SucceedsAll => self.iter().all(|(res_a, a)| {
                refset
                    .iter()
                    .all(|(res_b, b)| res_a == res_b && a.test(operator, b))
            }),
            _ => {
                //the remaining operators compare the boundaries of the sets as a whole, which requires a single resource
                match (self.resource(), refset.resource()) {
                    (Some(res_a), Some(res_b)) if res_a == res_b => {}
                    _ => return false,
                }
                let (Some(leftmost), Some(rightmost), Some(refleftmost), Some(refrightmost)) = (
                    self.leftmost(),
                    self.rightmost(),
                    refset.leftmost(),
                    refset.rightmost(),
                ) else {
                    return false;
                };
                match operator {
                    TextSelectionOperator::LeftAdjacentAll => rightmost.end == refleftmost.begin,
                    TextSelectionOperator::RightAdjacentAll => leftmost.begin == refrightmost.end,
                    TextSelectionOperator::SameBeginAll => leftmost.begin == refleftmost.begin,
                    TextSelectionOperator::SameEndAll => rightmost.end == refrightmost.end,
                    TextSelectionOperator::SameRangeAll => {
                        leftmost.begin == refleftmost.begin && rightmost.end == refrightmost.end
                    }
                    _ => false,
                }
            }
        }
    }

    /// Tests whether the operator holds between this set and a single text selection
    pub fn test(
        &self,
        operator: &TextSelectionOperator,
        resource: TextResourceHandle,
        reftextsel: &TextSelection,
    ) -> bool {
        self.test_set(operator, &TextSelectionSet::single(resource, *reftextsel))
    }
}

impl Extend<(TextResourceHandle, TextSelection)> for TextSelectionSet {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (TextResourceHandle, TextSelection)>,
    {
        for (resource, textselection) in iter {
            self.insert(resource, textselection);
        }
    }
}

impl FromIterator<(TextResourceHandle, TextSelection)> for TextSelectionSet {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (TextResourceHandle, TextSelection)>,
    {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

/// The position index maps character positions to the text selections that begin or end there.
/// It is kept per resource and is the basis for all position-based lookups.
#[derive(Debug, Clone, Default)]
pub struct PositionIndex(pub(crate) BTreeMap<usize, PositionIndexItem>);

#[derive(Debug, Clone, Default)]
pub struct PositionIndexItem {
    /// Text selections that end at this position, with their begin position. Sorted by begin.
    pub(crate) end2begin: SmallVec<[(usize, TextSelectionHandle); 1]>,
    /// Text selections that begin at this position, with their end position. Sorted by end.
    pub(crate) begin2end: SmallVec<[(usize, TextSelectionHandle); 1]>,
}

impl PositionIndexItem {
    /// Iterates over the text selections beginning at this position, as (end, handle) pairs
    pub fn iter_begin2end(&self) -> impl Iterator<Item = &(usize, TextSelectionHandle)> {
        self.begin2end.iter()
    }

    /// Iterates over the text selections ending at this position, as (begin, handle) pairs
    pub fn iter_end2begin(&self) -> impl Iterator<Item = &(usize, TextSelectionHandle)> {
        self.end2begin.iter()
    }
}

impl PositionIndex {
    pub(crate) fn insert(&mut self, begin: usize, end: usize, handle: TextSelectionHandle) {
        let item = self.0.entry(begin).or_default();
        let pos = item.begin2end.partition_point(|(e, _)| *e < end);
        item.begin2end.insert(pos, (end, handle));

        let item = self.0.entry(end).or_default();
        let pos = item.end2begin.partition_point(|(b, _)| *b < begin);
        item.end2begin.insert(pos, (begin, handle));
    }

    pub(crate) fn remove(&mut self, begin: usize, end: usize, handle: TextSelectionHandle) {
        for (position, is_begin) in [(begin, true), (end, false)] {
            let mut empty = false;
            if let Some(item) = self.0.get_mut(&position) {
                if is_begin {
                    item.begin2end.retain(|(_, h)| *h != handle);
                } else {
                    item.end2begin.retain(|(_, h)| *h != handle);
                }
                empty = item.begin2end.is_empty() && item.end2begin.is_empty();
            }
            if empty {
                self.0.remove(&position);
            }
        }
    }

    /// Returns the index item for a position, if any text selection begins or ends there
    pub fn get(&self, position: usize) -> Option<&PositionIndexItem> {
        self.0.get(&position)
    }

    /// Iterates over all positions in the index, in order
    pub fn iter(&self) -> btree_map::Iter<usize, PositionIndexItem> {
        self.0.iter()
    }

    /// Iterates over a range of positions in the index, in order
    pub fn range<R>(&self, range: R) -> btree_map::Range<usize, PositionIndexItem>
    where
        R: std::ops::RangeBounds<usize>,
    {
        self.0.range(range)
    }

    /// Returns all text selections (as (begin, end, handle)) that begin within the given range of positions, in textual order
    pub fn beginning_in<R>(&self, range: R) -> impl Iterator<Item = (usize, usize, TextSelectionHandle)> + '_
    where
        R: std::ops::RangeBounds<usize>,
    {
        self.0.range(range).flat_map(|(begin, item)| {
            item.begin2end
                .iter()
                .map(move |(end, handle)| (*begin, *end, *handle))
        })
    }

    /// Returns all text selections (as (begin, end, handle)) that overlap with the given position
    pub fn at(&self, position: usize) -> impl Iterator<Item = (usize, usize, TextSelectionHandle)> + '_ {
        self.beginning_in(..=position)
            .filter(move |(begin, end, _)| (*begin..*end).contains(&position))
    }

    /// Returns the number of distinct text selections in the index
    pub fn len(&self) -> usize {
        self.0.values().map(|item| item.begin2end.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// This is a text selection as returned by the high-level API. It is either bound to a resource
/// (it has been used in an annotation and is indexed), or unbound (a mere computed span that no annotation references).
#[derive(Clone, Debug)]
pub enum ResultTextSelection<'store> {
    Bound(ResultItem<'store, TextSelection>),
    Unbound(&'store AnnotationStore, &'store TextResource, TextSelection),
}

impl<'store> PartialEq for ResultTextSelection<'store> {
    fn eq(&self, other: &Self) -> bool {
        self.resource_handle() == other.resource_handle() && self.inner() == other.inner()
    }
}

impl<'store> Eq for ResultTextSelection<'store> {}

impl<'store> PartialOrd for ResultTextSelection<'store> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'store> Ord for ResultTextSelection<'store> {
    /// Sorted by resource, then in textual order
    fn cmp(&self, other: &Self) -> Ordering {
        self.resource_handle()
            .cmp(&other.resource_handle())
            .then_with(|| self.inner().cmp(other.inner()))
    }
}

impl<'store> ResultTextSelection<'store> {
    /// Wraps a text selection, binding it if the resource already knows it
    pub(crate) fn new(
        rootstore: &'store AnnotationStore,
        resource: &'store TextResource,
        textselection: TextSelection,
    ) -> Self {
        let handle = textselection
            .intid
            .or_else(|| resource.known_textselection(&textselection));
        if let Some(handle) = handle {
            if let Ok(textselection) = resource.get(&BuildItem::Handle(handle)) {
                return Self::Bound(textselection.as_resultitem(resource, rootstore));
            }
        }
        Self::Unbound(rootstore, resource, textselection)
    }

    /// Return a reference to the inner textselection.
    pub fn inner(&self) -> &TextSelection {
        match self {
            Self::Bound(item) => item.as_ref(),
            Self::Unbound(_, _, item) => item,
        }
    }

    /// Return the begin position (unicode points)
    pub fn begin(&self) -> usize {
        self.inner().begin()
    }

    /// Return the end position (non-inclusive) in unicode points
    pub fn end(&self) -> usize {
        self.inner().end()
    }

    /// Returns the handle of the text selection, if it is bound
    pub fn handle(&self) -> Option<TextSelectionHandle> {
        match self {
            Self::Bound(item) => Some(item.handle()),
            Self::Unbound(..) => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    /// Returns the resource this text selection refers to
    pub fn resource(&self) -> ResultItem<'store, TextResource> {
        match self {
            Self::Bound(item) => item.store().as_resultitem(item.rootstore(), item.rootstore()),
            Self::Unbound(rootstore, resource, _) => resource.as_resultitem(rootstore, rootstore),
        }
    }

    pub(crate) fn resource_handle(&self) -> Option<TextResourceHandle> {
        match self {
            Self::Bound(item) => item.store().handle(),
            Self::Unbound(_, resource, _) => resource.handle(),
        }
    }

    /// Returns the root annotation store
    pub fn rootstore(&self) -> &'store AnnotationStore {
        match self {
            Self::Bound(item) => item.rootstore(),
            Self::Unbound(rootstore, ..) => rootstore,
        }
    }

    /// Returns an offset (begin-aligned, absolute) corresponding to this text selection
    pub fn offset(&self) -> Offset {
        Offset::from(self.inner())
    }

    /// Returns a single-element [`TextSelectionSet`] for this text selection
    pub fn to_set(&self) -> Result<TextSelectionSet, StamError> {
        let resource = self
            .resource_handle()
            .ok_or(StamError::Unbound("ResultTextSelection::to_set"))?;
        Ok(TextSelectionSet::single(resource, *self.inner()))
    }
}
