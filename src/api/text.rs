/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module implements the [`Text`] trait for resources and text selections in the high-level API,
//! and the [`FindText`] trait with the text search methods built on top of it.

use regex::{Regex, RegexSet};
use smallvec::{smallvec, SmallVec};

use crate::config::Configurable;
use crate::error::StamError;
use crate::resources::TextResource;
use crate::selector::Offset;
use crate::store::*;
use crate::text::Text;
use crate::textselection::{ResultTextSelection, TextSelection};
use crate::types::*;

/// Text search methods, available on everything that implements [`Text`] in the high-level API:
/// resources (`ResultItem<TextResource>`) and text selections ([`ResultTextSelection`]).
/// All results are text selections on the underlying resource, with absolute offsets.
pub trait FindText<'store, 'slf>: Text<'store, 'slf>
where
    'store: 'slf,
{
    /// Returns a [`ResultTextSelection`] that corresponds to the offset (relative to this text). If the text selection
    /// already exists on the resource, the existing (bound) one is returned.
    /// If it doesn't exist yet, an unbound one is returned, it is not added to the resource.
    fn textselection(&'slf self, offset: &Offset)
        -> Result<ResultTextSelection<'store>, StamError>;

    /// Searches the text using one or more regular expressions, returns an iterator over the matches along with the matching expression,
    /// this is held by the [`FindRegexMatch`] struct.
    ///
    /// Passing multiple regular expressions at once is more efficient than calling this function anew for each one.
    /// If capture groups are used in the regular expression, only those parts will be returned (the rest is context).
    ///
    /// The `allow_overlap` parameter determines if matches of different expressions may overlap.
    /// Results are returned in the order they are found in the text.
    fn find_text_regex<'regex>(
        &'slf self,
        expressions: &'regex [Regex],
        precompiledset: Option<&RegexSet>,
        allow_overlap: bool,
    ) -> Result<FindRegexIter<'store, 'regex>, StamError>;

    /// Searches for the specified text fragment, returns an iterator over all non-overlapping matches.
    /// This search is case sensitive, use [`Self::find_text_nocase()`] otherwise.
    fn find_text<'fragment>(&'slf self, fragment: &'fragment str)
        -> FindTextIter<'store, 'fragment>;

    /// Searches for the specified text fragment without regard for casing.
    fn find_text_nocase(&'slf self, fragment: &str) -> FindNoCaseTextIter<'store>;

    /// Returns an iterator of text selections that represent partitions of the text given the specified delimiter.
    /// Empty partitions are skipped. No text is modified.
    fn split_text<'b>(&'slf self, delimiter: &'b str) -> SplitTextIter<'store, 'b>;

    /// Strips all occurrences of any character in `chars` from both the beginning and end of the text,
    /// returning a smaller text selection. No text is modified.
    fn strip_text(&'slf self, chars: &[char]) -> Result<ResultTextSelection<'store>, StamError> {
        self.strip_text_with(|c| chars.contains(&c))
    }

    /// Strips all characters that pass the supplied function from both the beginning and end of the text
    fn strip_text_with<F>(&'slf self, f: F) -> Result<ResultTextSelection<'store>, StamError>
    where
        F: Fn(char) -> bool,
    {
        let text = self.text();
        let stripbegin = text.chars().take_while(|c| f(*c)).count();
        if stripbegin == self.textlen() {
            //everything is stripped, return an empty selection at the start
            return self.textselection(&Offset::simple(0, 0));
        }
        let stripend = text.chars().rev().take_while(|c| f(*c)).count();
        self.textselection(&Offset::simple(stripbegin, self.textlen() - stripend))
    }
}

impl<'store, 'slf> Text<'store, 'slf> for ResultItem<'store, TextResource>
where
    'store: 'slf,
{
    fn text(&'slf self) -> &'store str {
        self.as_ref().text()
    }

    fn textlen(&self) -> usize {
        self.as_ref().textlen()
    }

    fn utf8byte(&self, abscursor: usize) -> Result<usize, StamError> {
        self.as_ref().utf8byte(abscursor)
    }

    fn utf8byte_to_charpos(&self, bytecursor: usize) -> Result<usize, StamError> {
        self.as_ref().utf8byte_to_charpos(bytecursor)
    }

    fn absolute_cursor(&self, cursor: usize) -> usize {
        cursor
    }
}

impl<'store, 'slf> FindText<'store, 'slf> for ResultItem<'store, TextResource>
where
    'store: 'slf,
{
    fn textselection(&self, offset: &Offset) -> Result<ResultTextSelection<'store>, StamError> {
        let textselection = self.as_ref().textselection_by_offset(offset)?;
        Ok(ResultTextSelection::new(
            self.rootstore(),
            self.as_ref(),
            textselection,
        ))
    }

    fn find_text_regex<'regex>(
        &self,
        expressions: &'regex [Regex],
        precompiledset: Option<&RegexSet>,
        allow_overlap: bool,
    ) -> Result<FindRegexIter<'store, 'regex>, StamError> {
        debug(self.as_ref().config(), || {
            format!("find_text_regex: expressions={:?}", expressions)
        });
        FindRegexIter::new(*self, self.text(), 0, expressions, precompiledset, allow_overlap)
    }

    fn find_text<'fragment>(&self, fragment: &'fragment str) -> FindTextIter<'store, 'fragment> {
        FindTextIter::new(*self, self.text(), 0, fragment)
    }

    fn find_text_nocase(&self, fragment: &str) -> FindNoCaseTextIter<'store> {
        FindNoCaseTextIter::new(*self, self.text(), 0, fragment)
    }

    fn split_text<'b>(&self, delimiter: &'b str) -> SplitTextIter<'store, 'b> {
        SplitTextIter::new(*self, self.text(), 0, delimiter)
    }
}

impl<'store, 'slf> Text<'store, 'slf> for ResultTextSelection<'store>
where
    'store: 'slf,
{
    fn text(&'slf self) -> &'store str {
        let resource = self.resource().as_ref();
        let beginbyte = resource
            .utf8byte(self.begin())
            .expect("utf8byte conversion should succeed for a valid text selection");
        let endbyte = resource
            .utf8byte(self.end())
            .expect("utf8byte conversion should succeed for a valid text selection");
        &resource.text()[beginbyte..endbyte]
    }

    fn textlen(&self) -> usize {
        self.end() - self.begin()
    }

    /// Converts a unicode point to a utf-8 byte, both *relative* to this text selection
    fn utf8byte(&self, abscursor: usize) -> Result<usize, StamError> {
        if abscursor > self.textlen() {
            return Err(StamError::CursorOutOfBounds(
                Cursor::BeginAligned(abscursor),
                "ResultTextSelection::utf8byte: cursor exceeds the length of the text selection",
            ));
        }
        let resource = self.resource().as_ref();
        let beginbyte = resource.utf8byte(self.begin())?;
        Ok(resource.utf8byte(self.absolute_cursor(abscursor))? - beginbyte)
    }

    /// Converts a utf-8 byte to a unicode point, both *relative* to this text selection
    fn utf8byte_to_charpos(&self, bytecursor: usize) -> Result<usize, StamError> {
        let resource = self.resource().as_ref();
        let beginbyte = resource.utf8byte(self.begin())?;
        let endbyte = resource.utf8byte(self.end())?;
        if beginbyte + bytecursor > endbyte {
            return Err(StamError::CursorOutOfBounds(
                Cursor::BeginAligned(bytecursor),
                "ResultTextSelection::utf8byte_to_charpos: byte exceeds the length of the text selection",
            ));
        }
        Ok(resource.utf8byte_to_charpos(beginbyte + bytecursor)? - self.begin())
    }

    fn absolute_cursor(&self, cursor: usize) -> usize {
        self.begin() + cursor
    }
}

impl<'store, 'slf> FindText<'store, 'slf> for ResultTextSelection<'store>
where
    'store: 'slf,
{
    fn textselection(&self, offset: &Offset) -> Result<ResultTextSelection<'store>, StamError> {
        let offset = self.absolute_offset(offset)?;
        let resource = self.resource();
        let textselection = resource.as_ref().textselection_by_offset(&offset)?;
        Ok(ResultTextSelection::new(
            self.rootstore(),
            resource.as_ref(),
            textselection,
        ))
    }

    fn find_text_regex<'regex>(
        &'slf self,
        expressions: &'regex [Regex],
        precompiledset: Option<&RegexSet>,
        allow_overlap: bool,
    ) -> Result<FindRegexIter<'store, 'regex>, StamError> {
        let resource = self.resource();
        debug(resource.as_ref().config(), || {
            format!(
                "ResultTextSelection::find_text_regex: expressions={:?}",
                expressions
            )
        });
        let beginbyte = resource.as_ref().utf8byte(self.begin())?;
        FindRegexIter::new(
            resource,
            self.text(),
            beginbyte,
            expressions,
            precompiledset,
            allow_overlap,
        )
    }

    fn find_text<'fragment>(
        &'slf self,
        fragment: &'fragment str,
    ) -> FindTextIter<'store, 'fragment> {
        let text = self.text();
        let resource = self.resource();
        let beginbyte = resource.subslice_utf8_offset(text).unwrap_or(0);
        FindTextIter::new(resource, text, beginbyte, fragment)
    }

    fn find_text_nocase(&'slf self, fragment: &str) -> FindNoCaseTextIter<'store> {
        FindNoCaseTextIter::new(self.resource(), self.text(), self.begin(), fragment)
    }

    fn split_text<'b>(&'slf self, delimiter: &'b str) -> SplitTextIter<'store, 'b> {
        let text = self.text();
        let resource = self.resource();
        let beginbyte = resource.subslice_utf8_offset(text).unwrap_or(0);
        SplitTextIter::new(resource, text, beginbyte, delimiter)
    }
}

/// Creates a text selection on the resource from absolute utf-8 byte offsets
fn textselection_from_bytes<'store>(
    resource: &ResultItem<'store, TextResource>,
    beginbyte: usize,
    endbyte: usize,
) -> Result<ResultTextSelection<'store>, StamError> {
    let begin = resource.as_ref().utf8byte_to_charpos(beginbyte)?;
    let end = resource.as_ref().utf8byte_to_charpos(endbyte)?;
    Ok(ResultTextSelection::new(
        resource.rootstore(),
        resource.as_ref(),
        TextSelection::new(begin, end),
    ))
}

/// This iterator is produced by [`FindText::find_text()`] and searches a text for a single fragment
pub struct FindTextIter<'store, 'fragment> {
    resource: ResultItem<'store, TextResource>,
    /// The text that is searched, a slice of the resource text
    text: &'store str,
    /// Byte offset of `text` in the resource text
    beginbyte: usize,
    /// Byte position in `text` where the search continues
    cursor: usize,
    fragment: &'fragment str,
}

impl<'store, 'fragment> FindTextIter<'store, 'fragment> {
    fn new(
        resource: ResultItem<'store, TextResource>,
        text: &'store str,
        beginbyte: usize,
        fragment: &'fragment str,
    ) -> Self {
        Self {
            resource,
            text,
            beginbyte,
            cursor: 0,
            fragment,
        }
    }
}

impl<'store, 'fragment> Iterator for FindTextIter<'store, 'fragment> {
    type Item = ResultTextSelection<'store>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fragment.is_empty() || self.cursor > self.text.len() {
            return None;
        }
        let foundbytepos = self.cursor + self.text[self.cursor..].find(self.fragment)?;
        let endbytepos = foundbytepos + self.fragment.len();
        self.cursor = endbytepos;
        match textselection_from_bytes(
            &self.resource,
            self.beginbyte + foundbytepos,
            self.beginbyte + endbytepos,
        ) {
            Ok(textselection) => Some(textselection),
            Err(e) => {
                eprintln!("WARNING: FindTextIter ended prematurely: {}", e);
                None
            }
        }
    }
}

#[inline]
fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// This iterator is produced by [`FindText::find_text_nocase()`] and searches a text for a single fragment, without regard for casing.
/// Characters are compared one by one after lowercasing, so positions never shift.
pub struct FindNoCaseTextIter<'store> {
    resource: ResultItem<'store, TextResource>,
    chars: Vec<char>,
    /// Absolute character position of the first of `chars`
    begin: usize,
    cursor: usize,
    fragment: Vec<char>,
}

impl<'store> FindNoCaseTextIter<'store> {
    fn new(
        resource: ResultItem<'store, TextResource>,
        text: &'store str,
        begin: usize,
        fragment: &str,
    ) -> Self {
        Self {
            resource,
            chars: text.chars().map(fold_case).collect(),
            begin,
            cursor: 0,
            fragment: fragment.chars().map(fold_case).collect(),
        }
    }
}

impl<'store> Iterator for FindNoCaseTextIter<'store> {
    type Item = ResultTextSelection<'store>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fragment.is_empty() || self.fragment.len() > self.chars.len() {
            return None;
        }
        let last = self.chars.len() - self.fragment.len();
        while self.cursor <= last {
            let pos = self.cursor;
            if self.chars[pos..pos + self.fragment.len()] == self.fragment[..] {
                self.cursor = pos + self.fragment.len();
                let begin = self.begin + pos;
                return Some(ResultTextSelection::new(
                    self.resource.rootstore(),
                    self.resource.as_ref(),
                    TextSelection::new(begin, begin + self.fragment.len()),
                ));
            }
            self.cursor += 1;
        }
        None
    }
}

/// This iterator is produced by [`FindText::split_text()`]
pub struct SplitTextIter<'store, 'b> {
    resource: ResultItem<'store, TextResource>,
    text: &'store str,
    beginbyte: usize,
    iter: std::str::Split<'store, &'b str>,
}

impl<'store, 'b> SplitTextIter<'store, 'b> {
    fn new(
        resource: ResultItem<'store, TextResource>,
        text: &'store str,
        beginbyte: usize,
        delimiter: &'b str,
    ) -> Self {
        Self {
            resource,
            text,
            beginbyte,
            iter: text.split(delimiter),
        }
    }
}

impl<'store, 'b> Iterator for SplitTextIter<'store, 'b> {
    type Item = ResultTextSelection<'store>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let part = self.iter.next()?;
            if part.is_empty() {
                continue;
            }
            let beginbyte = self.beginbyte + (part.as_ptr() as usize - self.text.as_ptr() as usize);
            return textselection_from_bytes(&self.resource, beginbyte, beginbyte + part.len())
                .ok();
        }
    }
}

/// Does an initial pass over the regular expression set, if there are enough expressions to make this worthwhile,
/// identifying which regular expressions match at all and are to be searched for in subsequent passes.
fn select_expressions(
    text: &str,
    expressions: &[Regex],
    precompiledset: Option<&RegexSet>,
) -> Result<Vec<usize>, StamError> {
    if expressions.len() > 2 {
        Ok(match precompiledset {
            Some(regexset) => regexset.matches(text).into_iter().collect(),
            None => RegexSet::new(expressions.iter().map(|x| x.as_str()))
                .map_err(|e| StamError::RegexError(e, "find_text_regex: compiling expression set"))?
                .matches(text)
                .into_iter()
                .collect(),
        })
    } else {
        Ok((0..expressions.len()).collect())
    }
}

/// Wrapper over iterator regex Matches or CaptureMatches
enum Matches<'r, 't> {
    NoCapture(regex::Matches<'r, 't>),
    WithCapture(regex::CaptureMatches<'r, 't>),
}

/// Wrapper over regex Match or Captures
enum Match<'t> {
    NoCapture(regex::Match<'t>),
    WithCapture(regex::Captures<'t>),
}

impl<'t> Match<'t> {
    /// Byte offsets of the participating capture groups, or of the whole match if there are no groups
    fn spans(&self) -> SmallVec<[(usize, usize, usize); 2]> {
        match self {
            Self::NoCapture(m) => smallvec!((0, m.start(), m.end())),
            Self::WithCapture(m) => m
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(i, group)| group.map(|group| (i, group.start(), group.end())))
                .collect(),
        }
    }

    fn begin(&self) -> usize {
        self.spans()
            .iter()
            .map(|(_, begin, _)| *begin)
            .min()
            .unwrap_or(0)
    }

    fn end(&self) -> usize {
        self.spans()
            .iter()
            .map(|(_, _, end)| *end)
            .max()
            .unwrap_or(0)
    }
}

impl<'r, 't> Iterator for Matches<'r, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::NoCapture(iter) => iter.next().map(Match::NoCapture),
            Self::WithCapture(iter) => iter.next().map(Match::WithCapture),
        }
    }
}

/// A single regular-expression match, as returned by [`FindRegexIter`].
pub struct FindRegexMatch<'store, 'r> {
    expression: &'r Regex,
    expression_index: usize,
    textselections: SmallVec<[ResultTextSelection<'store>; 2]>,
    /// The numbers of the capture groups that matched (1-indexed)
    capturegroups: SmallVec<[usize; 2]>,
}

impl<'store, 'r> FindRegexMatch<'store, 'r> {
    /// Does this match return multiple text selections?
    /// This only happens when the expression contains multiple capture groups.
    pub fn multi(&self) -> bool {
        self.textselections.len() > 1
    }

    /// Returns the regular expression that matched
    pub fn expression(&self) -> &'r Regex {
        self.expression
    }

    /// Returns the index of the regular expression that matched
    pub fn expression_index(&self) -> usize {
        self.expression_index
    }

    pub fn textselections(&self) -> &[ResultTextSelection<'store>] {
        &self.textselections
    }

    /// The numbers of the capture groups (1-indexed) that matched, parallel to [`Self::textselections()`].
    /// Empty if the expression has no capture groups.
    pub fn capturegroups(&self) -> &[usize] {
        &self.capturegroups
    }

    /// Returns the matched text, only if there is a single text selection
    pub fn as_str(&self) -> Option<&'store str> {
        if self.multi() {
            None
        } else {
            self.textselections
                .first()
                .map(|textselection| textselection.text())
        }
    }

    /// Returns the texts of all the text selections of this match
    pub fn text(&self) -> Vec<&'store str> {
        self.textselections
            .iter()
            .map(|textselection| textselection.text())
            .collect()
    }
}

/// This iterator is produced by [`FindText::find_text_regex()`]
pub struct FindRegexIter<'store, 'regex> {
    resource: ResultItem<'store, TextResource>,
    expressions: &'regex [Regex],
    /// Indices into `expressions` of the expressions that are searched for
    selectexpressions: Vec<usize>,
    /// One iterator per selected expression
    matchiters: Vec<Matches<'regex, 'store>>,
    /// Buffers the next match for each selected expression
    nextmatches: Vec<Option<Match<'store>>>,
    beginbyte: usize,
    allow_overlap: bool,
}

impl<'store, 'regex> FindRegexIter<'store, 'regex> {
    fn new(
        resource: ResultItem<'store, TextResource>,
        text: &'store str,
        beginbyte: usize,
        expressions: &'regex [Regex],
        precompiledset: Option<&RegexSet>,
        allow_overlap: bool,
    ) -> Result<Self, StamError> {
        let selectexpressions = select_expressions(text, expressions, precompiledset)?;
        let mut matchiters = Vec::with_capacity(selectexpressions.len());
        let mut nextmatches = Vec::with_capacity(selectexpressions.len());
        for i in selectexpressions.iter() {
            let re = &expressions[*i];
            let mut iter = if re.captures_len() > 1 {
                Matches::WithCapture(re.captures_iter(text))
            } else {
                Matches::NoCapture(re.find_iter(text))
            };
            nextmatches.push(iter.next());
            matchiters.push(iter);
        }
        Ok(Self {
            resource,
            expressions,
            selectexpressions,
            matchiters,
            nextmatches,
            beginbyte,
            allow_overlap,
        })
    }

    fn match_to_result(
        &self,
        m: &Match<'store>,
        selectexpression_index: usize,
    ) -> Result<FindRegexMatch<'store, 'regex>, StamError> {
        let expression_index = self.selectexpressions[selectexpression_index];
        let mut textselections = SmallVec::new();
        let mut capturegroups = SmallVec::new();
        for (group, begin, end) in m.spans() {
            textselections.push(textselection_from_bytes(
                &self.resource,
                self.beginbyte + begin,
                self.beginbyte + end,
            )?);
            if group > 0 {
                capturegroups.push(group);
            }
        }
        Ok(FindRegexMatch {
            expression: &self.expressions[expression_index],
            expression_index,
            textselections,
            capturegroups,
        })
    }
}

impl<'store, 'regex> Iterator for FindRegexIter<'store, 'regex> {
    type Item = FindRegexMatch<'store, 'regex>;

    fn next(&mut self) -> Option<Self::Item> {
        //find the next match in line amongst all the iterators
        let (i, _) = self
            .nextmatches
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|m| (i, m.begin())))
            .min_by_key(|(_, begin)| *begin)?;
        let m = self.nextmatches[i].take()?;

        if !self.allow_overlap {
            for j in 0..self.nextmatches.len() {
                while j != i
                    && self.nextmatches[j]
                        .as_ref()
                        .map(|m2| m2.begin() >= m.begin() && m2.begin() < m.end())
                        .unwrap_or(false)
                {
                    self.nextmatches[j] = self.matchiters[j].next();
                }
            }
        }

        let result = self.match_to_result(&m, i);
        self.nextmatches[i] = self.matchiters[i].next();
        match result {
            Ok(result) => Some(result),
            Err(e) => {
                eprintln!("WARNING: FindRegexIter ended prematurely: {}", e);
                None
            }
        }
    }
}
