/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`Text`] trait, implemented by everything that holds or references
//! text: resources and text selections.

use crate::error::StamError;
use crate::selector::Offset;
use crate::types::*;

/// This trait provides methods that operate on structures that hold or reference text.
/// All offsets and cursors are in unicode points, relative to the text of the item this
/// is implemented on (not necessarily the resource as a whole).
pub trait Text<'store, 'slf>
where
    'store: 'slf,
{
    /// Returns a reference to the text
    fn text(&'slf self) -> &'store str;

    /// Returns the length of the text in unicode points
    /// For bytes, use `Self.text().len()` instead.
    fn textlen(&self) -> usize;

    /// Converts a unicode character position (relative to this text) to a UTF-8 byte position (relative to this text)
    fn utf8byte(&self, abscursor: usize) -> Result<usize, StamError>;

    /// Converts a UTF-8 byte position (relative to this text) into a unicode position (relative to this text)
    fn utf8byte_to_charpos(&self, bytecursor: usize) -> Result<usize, StamError>;

    /// Converts a cursor relative to this text into an absolute position in the underlying resource
    fn absolute_cursor(&self, cursor: usize) -> usize;

    /// Resolves a cursor to a begin aligned cursor, resolving all relative end-aligned positions
    fn beginaligned_cursor(&self, cursor: &Cursor) -> Result<usize, StamError> {
        match *cursor {
            Cursor::BeginAligned(cursor) => {
                if cursor > self.textlen() {
                    Err(StamError::CursorOutOfBounds(
                        Cursor::BeginAligned(cursor),
                        "beginaligned_cursor: begin aligned cursor exceeds the length of the text",
                    ))
                } else {
                    Ok(cursor)
                }
            }
            Cursor::EndAligned(cursor) => {
                if cursor > 0 || cursor.unsigned_abs() > self.textlen() {
                    Err(StamError::CursorOutOfBounds(
                        Cursor::EndAligned(cursor),
                        "beginaligned_cursor: end aligned cursor ends up before the beginning",
                    ))
                } else {
                    Ok(self.textlen() - cursor.unsigned_abs())
                }
            }
        }
    }

    /// Resolves an offset (relative to this text) to a begin-aligned pair of positions (relative to this text),
    /// checking that the offset is valid
    fn beginaligned_offset(&self, offset: &Offset) -> Result<(usize, usize), StamError> {
        let begin = self.beginaligned_cursor(&offset.begin)?;
        let end = self.beginaligned_cursor(&offset.end)?;
        if begin > end {
            Err(StamError::InvalidOffset(
                offset.begin,
                offset.end,
                "End must be greater than or equal to begin",
            ))
        } else {
            Ok((begin, end))
        }
    }

    /// Converts an offset relative to this text into an absolute offset in the underlying resource
    fn absolute_offset(&self, offset: &Offset) -> Result<Offset, StamError> {
        let (begin, end) = self.beginaligned_offset(offset)?;
        Ok(Offset::simple(
            self.absolute_cursor(begin),
            self.absolute_cursor(end),
        ))
    }

    /// Returns the text for a given offset (relative to this text)
    fn text_by_offset(&'slf self, offset: &Offset) -> Result<&'store str, StamError> {
        let (begin, end) = self.beginaligned_offset(offset)?;
        let beginbyte = self.utf8byte(begin)?;
        let endbyte = self.utf8byte(end)?;
        Ok(&self.text()[beginbyte..endbyte])
    }

    /// Finds the utf-8 byte position where the specified text subslice begins.
    /// The subslice must be a slice of this very text (pointer arithmetic is used), not just any string.
    fn subslice_utf8_offset(&'slf self, subslice: &str) -> Option<usize> {
        let self_begin = self.text().as_ptr() as usize;
        let sub_begin = subslice.as_ptr() as usize;
        if sub_begin < self_begin || sub_begin + subslice.len() > self_begin + self.text().len() {
            None
        } else {
            Some(sub_begin - self_begin)
        }
    }
}
