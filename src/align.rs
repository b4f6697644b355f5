/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module implements sequence alignment between two text selections. Alignment finds
//! the runs of identical text that two texts have in common and expresses them as a
//! [`Transposition`], which can be turned into annotations in the STAM transposition vocabulary.

use nanoid::nanoid;
use std::time::Instant;

use crate::annotation::AnnotationBuilder;
use crate::config::Configurable;
use crate::datavalue::DataValue;
use crate::error::StamError;
use crate::selector::{Offset, SelectorBuilder};
use crate::text::Text;
use crate::textselection::{ResultTextSelection, TextSelection};
use crate::types::*;

/// The dataset holding the vocabulary for transpositions
pub const TRANSPOSE_SET: &str = "https://w3id.org/stam/extensions/stam-transpose/";
/// The key that marks an annotation as a transposition
pub const TRANSPOSITION_KEY: &str = "Transposition";

/// The algorithm and scoring parameters for alignment.
/// Scores are added for each pair of characters that is aligned (`equal` for identical characters, `align` for different ones)
/// and for each character that is skipped in the source (`delete`) or target (`insert`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignmentAlgorithm {
    /// Local alignment: finds the best scoring region, unaligned text at the edges is not penalised
    SmithWaterman {
        equal: isize,
        align: isize,
        insert: isize,
        delete: isize,
    },
    /// Global alignment: all of both texts participates
    NeedlemanWunsch {
        equal: isize,
        align: isize,
        insert: isize,
        delete: isize,
    },
}

impl Default for AlignmentAlgorithm {
    fn default() -> Self {
        Self::SmithWaterman {
            equal: 2,
            align: -1,
            insert: -1,
            delete: -1,
        }
    }
}

impl AlignmentAlgorithm {
    /// Selects an algorithm with default scores by name: `local`/`smithwaterman` or `global`/`needlemanwunsch` (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, StamError> {
        match name.to_lowercase().as_str() {
            "local" | "smithwaterman" => Ok(Self::default()),
            "global" | "needlemanwunsch" => Ok(Self::NeedlemanWunsch {
                equal: 1,
                align: -1,
                insert: -1,
                delete: -1,
            }),
            _ => Err(StamError::ValueError(
                name.to_string(),
                "Algorithm must be 'local' (smithwaterman) or 'global' (needlemanwunsch)",
            )),
        }
    }

    fn is_local(&self) -> bool {
        matches!(self, Self::SmithWaterman { .. })
    }

    fn scores(&self) -> (isize, isize, isize, isize) {
        match *self {
            Self::SmithWaterman {
                equal,
                align,
                insert,
                delete,
            }
            | Self::NeedlemanWunsch {
                equal,
                align,
                insert,
                delete,
            } => (equal, align, insert, delete),
        }
    }
}

/// A quantity that is either an absolute number or relative to some total (0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbsoluteOrRelative {
    Absolute(usize),
    Relative(f64),
}

impl AbsoluteOrRelative {
    /// Resolves to an absolute number, relative values are taken as a fraction of `total`
    pub fn as_absolute(&self, total: usize) -> usize {
        match *self {
            Self::Absolute(n) => n,
            Self::Relative(fraction) => (fraction * total as f64).round() as usize,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// Compare characters case-sensitively (default true)
    pub case_sensitive: bool,

    /// Alignment algorithm and its scores
    pub algorithm: AlignmentAlgorithm,

    /// Prefix for the IDs of annotations generated by [`Transposition::annotation_builders()`], if no other prefix is passed there
    pub annotation_id_prefix: Option<String>,

    /// Strip leading and trailing whitespace from each alignment
    pub trim: bool,

    /// Only return the single longest alignment
    pub simple_only: bool,

    /// Alignments shorter than this (in unicode points) are discarded
    pub minimal_align_length: usize,

    /// The maximum number of unaligned characters (source and target combined) between the first and last alignment.
    /// Relative values are a fraction of the length of the source text. If exceeded, nothing is returned.
    pub max_errors: Option<AbsoluteOrRelative>,

    /// Give up with [`StamError::AlignmentTimeout`] when this point in time has passed
    pub deadline: Option<Instant>,

    /// Print all found alignments to standard error
    pub verbose: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            algorithm: AlignmentAlgorithm::default(),
            annotation_id_prefix: None,
            trim: false,
            simple_only: false,
            minimal_align_length: 0,
            max_errors: None,
            deadline: None,
            verbose: false,
        }
    }
}

/// A pair of text selections with identical text (modulo case if alignment was case-insensitive)
#[derive(Debug, Clone)]
pub struct Alignment<'store> {
    source: ResultTextSelection<'store>,
    target: ResultTextSelection<'store>,
}

impl<'store> Alignment<'store> {
    pub fn source(&self) -> &ResultTextSelection<'store> {
        &self.source
    }

    pub fn target(&self) -> &ResultTextSelection<'store> {
        &self.target
    }
}

/// The result of aligning two texts: the alignments found, in textual order
#[derive(Debug, Clone)]
pub struct Transposition<'store> {
    alignments: Vec<Alignment<'store>>,
    score: isize,
}

impl<'store> Transposition<'store> {
    pub fn alignments(&self) -> &[Alignment<'store>] {
        &self.alignments
    }

    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    /// The score of the underlying alignment path
    pub fn score(&self) -> isize {
        self.score
    }

    /// Produces annotations that express this transposition in the STAM transposition vocabulary, pass them to
    /// [`crate::AnnotationStore::annotate()`] in the returned order.
    ///
    /// With a single alignment, this is a simple transposition: one annotation with a directional selector over two text selectors.
    /// Otherwise two annotations are made, one per side, each with a composite selector over its text selections, plus
    /// the transposition itself pointing to both sides via a directional selector.
    ///
    /// `dataset` is the dataset that holds the transposition key, usually [`TRANSPOSE_SET`]. Generated IDs start with `id_prefix`.
    pub fn annotation_builders(
        &self,
        dataset: &str,
        id_prefix: &str,
    ) -> Vec<AnnotationBuilder<'static>> {
        let mut builders = Vec::new();
        let textselector = |textselection: &ResultTextSelection<'store>| {
            SelectorBuilder::textselector(
                textselection.resource().handle(),
                Offset::simple(textselection.begin(), textselection.end()),
            )
        };
        let transposition = AnnotationBuilder::new()
            .with_id(format!("{}transposition-{}", id_prefix, nanoid!()))
            .with_data(dataset.to_string(), TRANSPOSITION_KEY, DataValue::Null);
        if self.alignments.len() == 1 {
            let alignment = &self.alignments[0];
            builders.push(
                transposition.with_target(SelectorBuilder::directionalselector([
                    textselector(&alignment.source),
                    textselector(&alignment.target),
                ])),
            );
        } else if !self.alignments.is_empty() {
            let source_id = format!("{}source-{}", id_prefix, nanoid!());
            let target_id = format!("{}target-{}", id_prefix, nanoid!());
            builders.push(
                AnnotationBuilder::new()
                    .with_id(source_id.clone())
                    .with_target(SelectorBuilder::compositeselector(
                        self.alignments.iter().map(|a| textselector(&a.source)),
                    )),
            );
            builders.push(
                AnnotationBuilder::new()
                    .with_id(target_id.clone())
                    .with_target(SelectorBuilder::compositeselector(
                        self.alignments.iter().map(|a| textselector(&a.target)),
                    )),
            );
            builders.push(
                transposition.with_target(SelectorBuilder::directionalselector([
                    SelectorBuilder::annotationselector(source_id, None),
                    SelectorBuilder::annotationselector(target_id, None),
                ])),
            );
        }
        builders
    }
}

/// A run of aligned characters, as (source begin, target begin, length), relative to the aligned texts
type Run = (usize, usize, usize);

fn check_deadline(config: &AlignmentConfig) -> Result<(), StamError> {
    if let Some(deadline) = config.deadline {
        if Instant::now() >= deadline {
            return Err(StamError::AlignmentTimeout("align_texts"));
        }
    }
    Ok(())
}

/// Computes the alignment path and returns the runs of identical characters on it, plus the score of the path.
fn align_chars(
    source: &[char],
    target: &[char],
    config: &AlignmentConfig,
) -> Result<(Vec<Run>, isize), StamError> {
    let (equal, align, insert, delete) = config.algorithm.scores();
    let local = config.algorithm.is_local();
    let n = source.len();
    let m = target.len();
    let width = m + 1;
    let same = |i: usize, j: usize| -> bool {
        if config.case_sensitive {
            source[i] == target[j]
        } else {
            source[i].to_lowercase().eq(target[j].to_lowercase())
        }
    };

    let mut matrix: Vec<isize> = vec![0; (n + 1) * width];
    if !local {
        for i in 1..=n {
            matrix[i * width] = i as isize * delete;
        }
        for j in 1..=m {
            matrix[j] = j as isize * insert;
        }
    }

    let mut best = (0, 0, 0); //score, i, j
    for i in 1..=n {
        check_deadline(config)?;
        for j in 1..=m {
            let diagonal = matrix[(i - 1) * width + j - 1] + if same(i - 1, j - 1) { equal } else { align };
            let deleted = matrix[(i - 1) * width + j] + delete;
            let inserted = matrix[i * width + j - 1] + insert;
            let mut score = diagonal.max(deleted).max(inserted);
            if local {
                score = score.max(0);
                // ties go to the first maximum in row-major order
                if score > best.0 {
                    best = (score, i, j);
                }
            }
            matrix[i * width + j] = score;
        }
    }
    let (score, mut i, mut j) = if local {
        best
    } else {
        (matrix[n * width + m], n, m)
    };

    let mut matches: Vec<(usize, usize)> = Vec::new();
    while i > 0 || j > 0 {
        let current = matrix[i * width + j];
        if local && current == 0 {
            break;
        }
        // walking backwards, gaps win ties so that matches end up as early as possible
        if j > 0 && current == matrix[i * width + j - 1] + insert {
            j -= 1;
            continue;
        }
        if i > 0 && current == matrix[(i - 1) * width + j] + delete {
            i -= 1;
            continue;
        }
        if i > 0 && j > 0 {
            let is_same = same(i - 1, j - 1);
            let previous = matrix[(i - 1) * width + j - 1];
            if is_same && current == previous + equal {
                matches.push((i - 1, j - 1));
                i -= 1;
                j -= 1;
                continue;
            } else if !is_same && current == previous + align {
                i -= 1;
                j -= 1;
                continue;
            }
        }
        break;
    }
    matches.reverse();

    let mut runs: Vec<Run> = Vec::new();
    for (si, ti) in matches {
        match runs.last_mut() {
            Some((sbegin, tbegin, len)) if *sbegin + *len == si && *tbegin + *len == ti => {
                *len += 1;
            }
            _ => runs.push((si, ti, 1)),
        }
    }
    Ok((runs, score))
}

/// Strips whitespace from both ends of a run, returns None if nothing remains
fn trim_run(source: &[char], (sbegin, tbegin, len): Run) -> Option<Run> {
    let lead = source[sbegin..sbegin + len]
        .iter()
        .take_while(|c| c.is_whitespace())
        .count();
    if lead == len {
        return None;
    }
    let trail = source[sbegin..sbegin + len]
        .iter()
        .rev()
        .take_while(|c| c.is_whitespace())
        .count();
    Some((sbegin + lead, tbegin + lead, len - lead - trail))
}

/// Aligns the text of two text selections and returns the transpositions found, which is either none or one.
/// Empty texts, or texts without anything in common, yield an empty result.
/// Work happens at the level of unicode points.
pub fn align_texts<'store>(
    source: &ResultTextSelection<'store>,
    target: &ResultTextSelection<'store>,
    config: &AlignmentConfig,
) -> Result<Vec<Transposition<'store>>, StamError> {
    let sourcechars: Vec<char> = source.text().chars().collect();
    let targetchars: Vec<char> = target.text().chars().collect();
    let storeconfig = source.rootstore().config();
    debug(storeconfig, || {
        format!(
            "align_texts: start, matrix {}x{}, algorithm {:?}",
            sourcechars.len() + 1,
            targetchars.len() + 1,
            config.algorithm
        )
    });
    if sourcechars.is_empty() || targetchars.is_empty() {
        return Ok(Vec::new());
    }

    let (mut runs, score) = align_chars(&sourcechars, &targetchars, config)?;
    if config.trim {
        runs = runs
            .into_iter()
            .filter_map(|run| trim_run(&sourcechars, run))
            .collect();
    }
    runs.retain(|(_, _, len)| *len > 0 && *len >= config.minimal_align_length);

    if let (Some(max_errors), Some(first), Some(last)) = (config.max_errors, runs.first(), runs.last()) {
        let aligned: usize = runs.iter().map(|(_, _, len)| len).sum();
        let sourcespan = last.0 + last.2 - first.0;
        let targetspan = last.1 + last.2 - first.1;
        let errors = (sourcespan - aligned) + (targetspan - aligned);
        if errors > max_errors.as_absolute(sourcechars.len()) {
            debug(storeconfig, || {
                format!("align_texts: {} errors exceeds the maximum, discarding", errors)
            });
            return Ok(Vec::new());
        }
    }

    if config.simple_only {
        let mut longest: Option<Run> = None;
        for run in runs.iter() {
            if longest.map(|l| run.2 > l.2).unwrap_or(true) {
                longest = Some(*run);
            }
        }
        runs = longest.into_iter().collect();
    }

    debug(storeconfig, || {
        format!("align_texts: end, score {}, {} alignments", score, runs.len())
    });
    if runs.is_empty() {
        return Ok(Vec::new());
    }

    let sourceresource = source.resource();
    let targetresource = target.resource();
    let mut alignments = Vec::with_capacity(runs.len());
    for (sbegin, tbegin, len) in runs {
        let alignment = Alignment {
            source: ResultTextSelection::new(
                source.rootstore(),
                sourceresource.as_ref(),
                TextSelection::new(source.begin() + sbegin, source.begin() + sbegin + len),
            ),
            target: ResultTextSelection::new(
                target.rootstore(),
                targetresource.as_ref(),
                TextSelection::new(target.begin() + tbegin, target.begin() + tbegin + len),
            ),
        };
        if config.verbose {
            eprintln!(
                "[STAM ALIGN] {}:{}-{} \"{}\" -> {}:{}-{} \"{}\"",
                sourceresource.id().unwrap_or("(no id)"),
                alignment.source.begin(),
                alignment.source.end(),
                alignment.source.text(),
                targetresource.id().unwrap_or("(no id)"),
                alignment.target.begin(),
                alignment.target.end(),
                alignment.target.text(),
            );
        }
        alignments.push(alignment);
    }
    Ok(vec![Transposition { alignments, score }])
}

impl<'store> ResultTextSelection<'store> {
    /// Aligns the text of this text selection with that of another one, see [`align_texts()`].
    pub fn align_text(
        &self,
        other: &ResultTextSelection<'store>,
        config: &AlignmentConfig,
    ) -> Result<Vec<Transposition<'store>>, StamError> {
        align_texts(self, other, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(source: &str, target: &str, config: &AlignmentConfig) -> Vec<Run> {
        let source: Vec<char> = source.chars().collect();
        let target: Vec<char> = target.chars().collect();
        align_chars(&source, &target, config).unwrap().0
    }

    #[test]
    fn local_exact_substring() {
        let config = AlignmentConfig::default();
        assert_eq!(runs("world", "hello world", &config), vec![(0, 6, 5)]);
    }

    #[test]
    fn local_gap_splits_runs() {
        let config = AlignmentConfig::default();
        assert_eq!(
            runs("abcd", "xxabyycdxx", &config),
            vec![(0, 2, 2), (2, 6, 2)]
        );
    }

    #[test]
    fn global_aligns_everything() {
        let config = AlignmentConfig {
            algorithm: AlignmentAlgorithm::from_name("global").unwrap(),
            ..Default::default()
        };
        assert_eq!(runs("abc", "abc", &config), vec![(0, 0, 3)]);
    }

    #[test]
    fn ties_prefer_earliest_match() {
        let global = AlignmentConfig {
            algorithm: AlignmentAlgorithm::from_name("global").unwrap(),
            ..Default::default()
        };
        assert_eq!(runs("a", "aa", &global), vec![(0, 0, 1)]);
        assert_eq!(runs("aa", "a", &global), vec![(0, 0, 1)]);
        let local = AlignmentConfig::default();
        assert_eq!(runs("a", "aa", &local), vec![(0, 0, 1)]);
    }

    #[test]
    fn case_insensitive() {
        let config = AlignmentConfig {
            case_sensitive: false,
            ..Default::default()
        };
        assert_eq!(runs("HELLO", "hello", &config), vec![(0, 0, 5)]);
        assert!(runs("HELLO", "hello", &AlignmentConfig::default()).is_empty());
    }

    #[test]
    fn trim_whitespace() {
        let source: Vec<char> = "  ab ".chars().collect();
        assert_eq!(trim_run(&source, (0, 10, 5)), Some((2, 12, 2)));
        assert_eq!(trim_run(&source, (0, 10, 2)), None);
    }

    #[test]
    fn deadline_exceeded() {
        let config = AlignmentConfig {
            deadline: Some(Instant::now()),
            ..Default::default()
        };
        let source: Vec<char> = "abc".chars().collect();
        assert!(matches!(
            align_chars(&source, &source, &config),
            Err(StamError::AlignmentTimeout(_))
        ));
    }

    #[test]
    fn unknown_algorithm() {
        assert!(AlignmentAlgorithm::from_name("fuzzy").is_err());
        assert_eq!(
            AlignmentAlgorithm::from_name("SmithWaterman").unwrap(),
            AlignmentAlgorithm::default()
        );
    }
}
