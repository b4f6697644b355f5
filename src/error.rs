/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`StamError`] type, the one error type returned by all fallible
//! operations in this library.

use std::error::Error;
use std::fmt;

use crate::types::*;

/// This is the error type used throughout this library. Every variant carries a static context
/// string (usually the name of the function that raised it) to ease debugging.
#[derive(Debug)]
pub enum StamError {
    /// This error is raised when the specified internal handle is not valid (the item does not exist, or no longer exists)
    HandleError(&'static str),

    /// This error is raised when the specified public ID does not exist
    /// The first parameter is the requested public ID
    IdNotFoundError(String, &'static str),

    /// This error is raised when an item has no public ID but one is expected
    NoIdError(&'static str),

    /// This error is raised when an item has no internal handle but one is expected, i.e. it is not bound to a store yet
    Unbound(&'static str),

    /// This error is raised when an item is bound to a store a second time
    AlreadyBound(&'static str),

    /// This error is raised when an item with the same public ID already exists in the same namespace
    /// The first parameter is the public ID
    DuplicateIdError(String, &'static str),

    /// This error is raised when a cursor points outside of the text it applies to
    CursorOutOfBounds(Cursor, &'static str),

    /// This error is raised when an offset is invalid, i.e. the end precedes the begin after resolution
    InvalidOffset(Cursor, Cursor, &'static str),

    /// This error is raised when resolving an [`crate::Selector::AnnotationSelector`] chain loops back onto itself.
    /// The first parameter is the ID (or handle) of the annotation at which the cycle was detected.
    CyclicSelectorError(String, &'static str),

    /// This error is raised when including a substore would make the inclusion graph cyclic.
    /// The first parameter is the filename that was already included higher up the chain.
    CyclicSubStoreError(String, &'static str),

    /// This error is raised when an item can not be removed because other items still reference it
    InUse(&'static str),

    /// This error is raised when alignment did not complete before the configured deadline
    AlignmentTimeout(&'static str),

    /// This error is raised when a builder or selector lacks information needed to build the item.
    /// The first parameter describes what is missing.
    IncompleteError(String, &'static str),

    /// This error is raised on invalid values
    ValueError(String, &'static str),

    /// Wraps a regular expression compilation error
    RegexError(regex::Error, &'static str),

    /// Wraps an I/O error, the second parameter is the filename (if any)
    IOError(std::io::Error, String, &'static str),

    /// Wraps a deserialisation error, including the path to the offending element. The second parameter is the filename.
    JsonError(
        serde_path_to_error::Error<serde_json::Error>,
        String,
        &'static str,
    ),

    /// Category for other errors, the parameter describes the problem
    OtherError(&'static str),
}

impl StamError {
    /// Is this an error about something that was not found? This covers both unknown public IDs
    /// and invalid/removed handles.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IdNotFoundError(..) | Self::HandleError(..))
    }

    /// Is this an error about an offset or cursor that is out of bounds?
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::CursorOutOfBounds(..) | Self::InvalidOffset(..))
    }

    /// Returns the name of the error variant
    pub fn name(&self) -> &'static str {
        match self {
            Self::HandleError(..) => "HandleError",
            Self::IdNotFoundError(..) => "IdNotFoundError",
            Self::NoIdError(..) => "NoIdError",
            Self::Unbound(..) => "Unbound",
            Self::AlreadyBound(..) => "AlreadyBound",
            Self::DuplicateIdError(..) => "DuplicateIdError",
            Self::CursorOutOfBounds(..) => "CursorOutOfBounds",
            Self::InvalidOffset(..) => "InvalidOffset",
            Self::CyclicSelectorError(..) => "CyclicSelectorError",
            Self::CyclicSubStoreError(..) => "CyclicSubStoreError",
            Self::InUse(..) => "InUse",
            Self::AlignmentTimeout(..) => "AlignmentTimeout",
            Self::IncompleteError(..) => "IncompleteError",
            Self::ValueError(..) => "ValueError",
            Self::RegexError(..) => "RegexError",
            Self::IOError(..) => "IOError",
            Self::JsonError(..) => "JsonError",
            Self::OtherError(..) => "OtherError",
        }
    }
}

impl From<&StamError> for String {
    /// Returns the error message as a String
    fn from(error: &StamError) -> String {
        match error {
            StamError::HandleError(contextmsg) => {
                format!("HandleError: Invalid handle, item does not exist ({})", contextmsg)
            }
            StamError::IdNotFoundError(id, contextmsg) => {
                format!("IdNotFoundError: No such ID: {} ({})", id, contextmsg)
            }
            StamError::NoIdError(contextmsg) => {
                format!("NoIdError: Item has no public ID ({})", contextmsg)
            }
            StamError::Unbound(contextmsg) => format!(
                "Unbound: Item is not bound yet, add it to a store first ({})",
                contextmsg
            ),
            StamError::AlreadyBound(contextmsg) => {
                format!("AlreadyBound: Item is already bound ({})", contextmsg)
            }
            StamError::DuplicateIdError(id, contextmsg) => {
                format!("DuplicateIdError: ID already exists: {} ({})", id, contextmsg)
            }
            StamError::CursorOutOfBounds(cursor, contextmsg) => format!(
                "CursorOutOfBounds: Cursor is out of bounds: {:?} ({})",
                cursor, contextmsg
            ),
            StamError::InvalidOffset(begin, end, contextmsg) => format!(
                "InvalidOffset: Offset is invalid: {:?}-{:?} ({})",
                begin, end, contextmsg
            ),
            StamError::CyclicSelectorError(id, contextmsg) => format!(
                "CyclicSelectorError: Annotation selector chain contains a cycle at {} ({})",
                id, contextmsg
            ),
            StamError::CyclicSubStoreError(filename, contextmsg) => format!(
                "CyclicSubStoreError: Substore {} is already included higher up the chain ({})",
                filename, contextmsg
            ),
            StamError::InUse(contextmsg) => format!(
                "InUse: Item can not be removed because it is still referenced ({})",
                contextmsg
            ),
            StamError::AlignmentTimeout(contextmsg) => format!(
                "AlignmentTimeout: Alignment did not complete before the deadline ({})",
                contextmsg
            ),
            StamError::IncompleteError(msg, contextmsg) => {
                format!("IncompleteError: Not enough data to build: {} ({})", msg, contextmsg)
            }
            StamError::ValueError(msg, contextmsg) => {
                format!("ValueError: Invalid value: {} ({})", msg, contextmsg)
            }
            StamError::RegexError(err, contextmsg) => {
                format!("RegexError: Invalid regular expression: {} ({})", err, contextmsg)
            }
            StamError::IOError(err, filename, contextmsg) => {
                format!("IOError: {}: {} ({})", filename, err, contextmsg)
            }
            StamError::JsonError(err, filename, contextmsg) => {
                format!(
                    "JsonError: Parsing failed at {}: {}: {} ({})",
                    err.path(),
                    filename,
                    err.inner(),
                    contextmsg
                )
            }
            StamError::OtherError(contextmsg) => format!("OtherError: {}", contextmsg),
        }
    }
}

impl fmt::Display for StamError {
    /// Formats the error message for printing
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let errmsg: String = String::from(self);
        write!(f, "[StamError] {}", errmsg)
    }
}

impl Error for StamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IOError(err, ..) => Some(err),
            Self::JsonError(err, ..) => Some(err),
            Self::RegexError(err, ..) => Some(err),
            _ => None,
        }
    }
}
