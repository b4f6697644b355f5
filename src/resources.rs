/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`TextResource`], which holds an immutable text, along with its
//! builder. A resource also owns the [`TextSelection`]s made on its text, and the position index
//! to look them up.

use sealed::sealed;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::annotationstore::AnnotationStore;
use crate::config::{Config, Configurable};
use crate::error::StamError;
use crate::selector::Offset;
use crate::store::*;
use crate::textselection::{PositionIndex, PositionIndexItem, TextSelection, TextSelectionHandle};
use crate::types::*;

/// This holds the textual resource to be annotated. It holds the full text in memory.
/// The text is immutable once set. It is shared (reference-counted) so that stores that include the same
/// resource via substores do not duplicate the text buffer.
#[derive(Debug, Clone)]
pub struct TextResource {
    /// Public identifier for the text resource (often the filename/URL)
    id: Option<String>,

    /// The text of the resource
    text: Arc<str>,

    /// Length of the text in unicode points
    textlen: usize,

    /// Filename the text was read from, if any
    filename: Option<String>,

    ///Internal numeric ID, corresponds with the index in the AnnotationStore::resources that has the ownership
    intid: Option<TextResourceHandle>,

    /// The text selections that were made on this resource (deduplicated)
    pub(crate) textselections: Store<TextSelection>,

    /// Maps character positions to the text selections that begin or end there
    pub(crate) positionindex: PositionIndex,

    /// Milestones: pairs of (character position, byte position), placed at a regular interval
    milestones: Vec<(usize, usize)>,

    /// Configuration
    config: Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextResourceHandle(u32);

#[sealed]
impl Handle for TextResourceHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

handle_conversions!(TextResource, TextResourceHandle);

#[sealed]
impl TypeInfo for TextResource {
    fn typeinfo() -> Type {
        Type::TextResource
    }
}

#[sealed]
impl Storable for TextResource {
    type HandleType = TextResourceHandle;
    type StoreType = AnnotationStore;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
    fn handle(&self) -> Option<TextResourceHandle> {
        self.intid
    }
    fn set_handle(&mut self, handle: TextResourceHandle) {
        self.intid = Some(handle);
    }
    fn carries_id() -> bool {
        true
    }
    fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }
}

impl PartialEq<TextResource> for TextResource {
    fn eq(&self, other: &TextResource) -> bool {
        self.id.is_some() && self.id == other.id && self.text == other.text
    }
}

impl Configurable for TextResource {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self.milestones = Self::compute_milestones(&self.text, self.config.milestone_interval);
        self
    }
}

#[sealed]
impl StoreFor<TextSelection> for TextResource {
    fn store(&self) -> &Store<TextSelection> {
        &self.textselections
    }
    fn store_mut(&mut self) -> &mut Store<TextSelection> {
        &mut self.textselections
    }
    fn store_typeinfo() -> &'static str {
        "TextSelection in TextResource"
    }

    fn preinsert(&self, item: &mut TextSelection) -> Result<(), StamError> {
        if item.end > self.textlen {
            return Err(StamError::CursorOutOfBounds(
                Cursor::BeginAligned(item.end),
                "TextResource.insert(TextSelection): end exceeds the length of the text",
            ));
        }
        Ok(())
    }

    fn inserted(&mut self, handle: TextSelectionHandle) -> Result<(), StamError> {
        let textselection: &TextSelection = self.get(&BuildItem::Handle(handle))?;
        let (begin, end) = (textselection.begin, textselection.end);
        self.positionindex.insert(begin, end, handle);
        Ok(())
    }

    fn preremove(&mut self, handle: TextSelectionHandle) -> Result<(), StamError> {
        let textselection: &TextSelection = self.get(&BuildItem::Handle(handle))?;
        let (begin, end) = (textselection.begin, textselection.end);
        self.positionindex.remove(begin, end, handle);
        Ok(())
    }
}

/// Builds a [`TextResource`], either from a string or from a plain text file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextResourceBuilder {
    id: Option<String>,
    text: Option<String>,
    filename: Option<String>,
}

impl TextResourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the public identifier of the resource
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the text of the resource
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Loads the text from a plain text file when built. Relative paths are resolved against the configured working directory.
    /// If no ID is set, the filename will be used as ID.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Builds a new [`TextResource`] from [`TextResourceBuilder`], consuming the latter
    pub fn build(self, config: Config) -> Result<TextResource, StamError> {
        debug(&config, || format!("TextResourceBuilder::build: id={:?}", self.id));
        let text: String = match (self.text, self.filename.as_ref()) {
            (Some(text), _) => text,
            (None, Some(filename)) => {
                let path = get_filepath(filename, config.workdir())?;
                debug(&config, || format!("TextResourceBuilder::build: reading {:?}", path));
                std::fs::read_to_string(&path).map_err(|e| {
                    StamError::IOError(e, filename.clone(), "TextResourceBuilder::build")
                })?
            }
            (None, None) => {
                return Err(StamError::IncompleteError(
                    "no text and no filename".to_string(),
                    "TextResourceBuilder::build",
                ))
            }
        };
        let id = self.id.or_else(|| self.filename.clone());
        let mut resource = TextResource::from_shared(id, Arc::from(text), config);
        resource.filename = self.filename;
        Ok(resource)
    }
}

impl TextResource {
    /// Creates a new text resource from a string. Consider using [`TextResourceBuilder`] instead.
    pub fn from_string(id: impl Into<String>, text: impl Into<String>, config: Config) -> Self {
        let text: String = text.into();
        Self::from_shared(Some(id.into()), Arc::from(text), config)
    }

    /// Creates a new text resource around an existing shared text buffer
    pub(crate) fn from_shared(id: Option<String>, text: Arc<str>, config: Config) -> Self {
        let textlen = text.chars().count();
        let milestones = Self::compute_milestones(&text, config.milestone_interval);
        Self {
            id,
            textlen,
            text,
            filename: None,
            intid: None,
            textselections: Store::default(),
            positionindex: PositionIndex::default(),
            milestones,
            config,
        }
    }

    /// Returns an unbound copy of this resource that shares the same text buffer, but none of the text selections.
    pub(crate) fn share(&self, config: Config) -> Self {
        let mut resource = Self::from_shared(self.id.clone(), self.text.clone(), config);
        resource.filename = self.filename.clone();
        resource
    }

    fn compute_milestones(text: &str, interval: usize) -> Vec<(usize, usize)> {
        let mut milestones = Vec::new();
        if interval > 0 {
            for (charpos, (bytepos, _)) in text.char_indices().enumerate() {
                if charpos % interval == 0 {
                    milestones.push((charpos, bytepos));
                }
            }
        }
        milestones
    }

    /// Returns a reference to the full text of this resource
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the shared text buffer
    /// Returns the length of the text in unicode points
    /// For bytes, use `self.text().len()` instead.
    pub fn textlen(&self) -> usize {
        self.textlen
    }

    /// Returns the filename the text was loaded from, if any
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Converts a unicode character position to a UTF-8 byte position
    pub fn utf8byte(&self, abscursor: usize) -> Result<usize, StamError> {
        if abscursor == self.textlen {
            return Ok(self.text.len());
        } else if abscursor > self.textlen {
            return Err(StamError::CursorOutOfBounds(
                Cursor::BeginAligned(abscursor),
                "TextResource::utf8byte: cursor exceeds the length of the text",
            ));
        }
        let (mcharpos, mbytepos) = self.milestone_for_charpos(abscursor);
        match self.text[mbytepos..].char_indices().nth(abscursor - mcharpos) {
            Some((bytepos, _)) => Ok(mbytepos + bytepos),
            None => Err(StamError::CursorOutOfBounds(
                Cursor::BeginAligned(abscursor),
                "TextResource::utf8byte: cursor exceeds the length of the text",
            )),
        }
    }

    /// Converts a UTF-8 byte position into a unicode position
    pub fn utf8byte_to_charpos(&self, bytecursor: usize) -> Result<usize, StamError> {
        if bytecursor == self.text.len() {
            return Ok(self.textlen);
        } else if bytecursor > self.text.len() || !self.text.is_char_boundary(bytecursor) {
            return Err(StamError::CursorOutOfBounds(
                Cursor::BeginAligned(bytecursor),
                "TextResource::utf8byte_to_charpos: not a valid utf-8 byte position",
            ));
        }
        let index = self
            .milestones
            .partition_point(|(_, bytepos)| *bytepos <= bytecursor);
        let (mcharpos, mbytepos) = if index == 0 {
            (0, 0)
        } else {
            self.milestones[index - 1]
        };
        Ok(mcharpos + self.text[mbytepos..bytecursor].chars().count())
    }

    fn milestone_for_charpos(&self, charpos: usize) -> (usize, usize) {
        let interval = self.config.milestone_interval;
        if interval > 0 {
            if let Some(milestone) = self.milestones.get(charpos / interval) {
                return *milestone;
            }
        }
        (0, 0)
    }

    /// Resolves a cursor to a begin aligned cursor, resolving all relative end-aligned positions
    pub fn beginaligned_cursor(&self, cursor: &Cursor) -> Result<usize, StamError> {
        match *cursor {
            Cursor::BeginAligned(cursor) => {
                if cursor > self.textlen {
                    Err(StamError::CursorOutOfBounds(
                        Cursor::BeginAligned(cursor),
                        "TextResource::beginaligned_cursor: cursor exceeds the length of the text",
                    ))
                } else {
                    Ok(cursor)
                }
            }
            Cursor::EndAligned(cursor) => {
                if cursor > 0 || cursor.unsigned_abs() > self.textlen {
                    Err(StamError::CursorOutOfBounds(
                        Cursor::EndAligned(cursor),
                        "TextResource::beginaligned_cursor: end aligned cursor ends up before the beginning",
                    ))
                } else {
                    Ok(self.textlen - cursor.unsigned_abs())
                }
            }
        }
    }

    /// Resolves an offset to a [`TextSelection`]. If the text selection already exists, a copy of the existing (bound) one is returned,
    /// otherwise an unbound one is returned that is not added to the resource.
    pub fn textselection_by_offset(&self, offset: &Offset) -> Result<TextSelection, StamError> {
        let begin = self.beginaligned_cursor(&offset.begin)?;
        let end = self.beginaligned_cursor(&offset.end)?;
        if begin > end {
            return Err(StamError::InvalidOffset(
                offset.begin,
                offset.end,
                "TextResource::textselection_by_offset: end must be greater than or equal to begin",
            ));
        }
        let mut textselection = TextSelection {
            intid: None,
            begin,
            end,
        };
        textselection.intid = self.known_textselection(&textselection);
        Ok(textselection)
    }

    /// Returns the handle of the existing text selection with the same offsets, if any
    pub fn known_textselection(&self, textselection: &TextSelection) -> Option<TextSelectionHandle> {
        self.positionindex
            .get(textselection.begin)
            .and_then(|item: &PositionIndexItem| {
                item.begin2end
                    .iter()
                    .find(|(end, _)| *end == textselection.end)
                    .map(|(_, handle)| *handle)
            })
    }

    /// Adds a text selection to the resource if it does not exist yet, returns the handle of the (new or existing) text selection
    pub(crate) fn insert_textselection(
        &mut self,
        textselection: TextSelection,
    ) -> Result<TextSelectionHandle, StamError> {
        if let Some(handle) = self.known_textselection(&textselection) {
            Ok(handle)
        } else {
            self.insert(TextSelection {
                intid: None,
                ..textselection
            })
        }
    }

    /// Returns the handles of all text selections on this resource, in textual order
    pub fn textselection_handles(&self) -> SmallVec<[TextSelectionHandle; 8]> {
        self.positionindex
            .iter()
            .flat_map(|(_, item)| item.begin2end.iter().map(|(_, handle)| *handle))
            .collect()
    }

    /// Returns the number of text selections on this resource
    pub fn textselections_len(&self) -> usize {
        self.positionindex.len()
    }

    /// Returns the position index of this resource
    pub fn positionindex(&self) -> &PositionIndex {
        &self.positionindex
    }
}
