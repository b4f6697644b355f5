mod common;
use crate::common::*;

use stam::*;

const EXCERPT: &str = "human beings are free and equal in rights";

fn setup_alignment() -> Result<AnnotationStore, StamError> {
    setup_example_humanrights()?.with_resource(
        TextResourceBuilder::new()
            .with_id("excerpt")
            .with_text(EXCERPT),
    )
}

fn whole<'store>(
    store: &'store AnnotationStore,
    resource: &str,
) -> Result<ResultTextSelection<'store>, StamError> {
    store.resource(resource)?.textselection(&Offset::whole())
}

#[test]
fn align_humanrights() -> Result<(), StamError> {
    let store = setup_alignment()?;
    let source = whole(&store, "excerpt")?;
    let target = whole(&store, "humanrights")?;
    let transpositions = align_texts(&source, &target, &AlignmentConfig::default())?;
    assert_eq!(transpositions.len(), 1);
    let transposition = &transpositions[0];
    assert_eq!(transposition.len(), 3);
    assert_eq!(transposition.score(), 68);
    for alignment in transposition.alignments() {
        assert_eq!(alignment.source().text(), alignment.target().text());
        assert_eq!(alignment.source().resource().id(), Some("excerpt"));
        assert_eq!(alignment.target().resource().id(), Some("humanrights"));
    }
    let first = &transposition.alignments()[0];
    //the space after "are" is matched with the earliest candidate
    assert_eq!(first.source().text(), "human beings are ");
    assert_eq!((first.target().begin(), first.target().end()), (4, 21));
    let second = &transposition.alignments()[1];
    assert_eq!(second.source().text(), "free and equal in ");
    Ok(())
}

#[test]
fn align_options() -> Result<(), StamError> {
    let store = setup_alignment()?;
    let source = whole(&store, "excerpt")?;
    let target = whole(&store, "humanrights")?;

    let config = AlignmentConfig {
        trim: true,
        ..Default::default()
    };
    let transpositions = source.align_text(&target, &config)?;
    assert_eq!(
        transpositions[0].alignments()[1].source().text(),
        "free and equal in"
    );

    let config = AlignmentConfig {
        minimal_align_length: 3,
        ..Default::default()
    };
    let transpositions = source.align_text(&target, &config)?;
    assert_eq!(transpositions[0].len(), 2);

    let config = AlignmentConfig {
        simple_only: true,
        ..Default::default()
    };
    let transpositions = source.align_text(&target, &config)?;
    assert_eq!(transpositions[0].len(), 1);
    assert_eq!(
        transpositions[0].alignments()[0].target().text(),
        "free and equal in "
    );
    Ok(())
}

#[test]
fn align_max_errors() -> Result<(), StamError> {
    let store = setup_alignment()?;
    let source = whole(&store, "excerpt")?;
    let target = whole(&store, "humanrights")?;
    //one unaligned character in the source, six in the target
    let config = AlignmentConfig {
        max_errors: Some(AbsoluteOrRelative::Absolute(5)),
        ..Default::default()
    };
    assert!(align_texts(&source, &target, &config)?.is_empty());
    let config = AlignmentConfig {
        max_errors: Some(AbsoluteOrRelative::Absolute(7)),
        ..Default::default()
    };
    assert_eq!(align_texts(&source, &target, &config)?.len(), 1);
    let config = AlignmentConfig {
        max_errors: Some(AbsoluteOrRelative::Relative(0.05)),
        ..Default::default()
    };
    assert!(align_texts(&source, &target, &config)?.is_empty());
    Ok(())
}

#[test]
fn align_global() -> Result<(), StamError> {
    let store = AnnotationStore::default()
        .with_resource(
            TextResourceBuilder::new()
                .with_id("source")
                .with_text("Hello world"),
        )?
        .with_resource(
            TextResourceBuilder::new()
                .with_id("target")
                .with_text("Hello big world"),
        )?;
    let source = whole(&store, "source")?;
    let target = whole(&store, "target")?;
    let config = AlignmentConfig {
        algorithm: AlignmentAlgorithm::from_name("global")?,
        ..Default::default()
    };
    let transpositions = align_texts(&source, &target, &config)?;
    assert_eq!(transpositions.len(), 1);
    let texts: Vec<_> = transpositions[0]
        .alignments()
        .iter()
        .map(|alignment| alignment.target().text())
        .collect();
    assert_eq!(texts, vec!["Hello ", "world"]);
    assert_eq!(transpositions[0].score(), 7);
    Ok(())
}

#[test]
fn align_nothing() -> Result<(), StamError> {
    let store = AnnotationStore::default()
        .with_resource(TextResourceBuilder::new().with_id("source").with_text("abc"))?
        .with_resource(TextResourceBuilder::new().with_id("target").with_text("xyz"))?
        .with_resource(TextResourceBuilder::new().with_id("empty").with_text(""))?;
    let source = whole(&store, "source")?;
    let target = whole(&store, "target")?;
    let empty = whole(&store, "empty")?;
    assert!(align_texts(&source, &target, &AlignmentConfig::default())?.is_empty());
    assert!(align_texts(&source, &empty, &AlignmentConfig::default())?.is_empty());
    assert!(align_texts(&empty, &source, &AlignmentConfig::default())?.is_empty());
    Ok(())
}

#[test]
fn align_to_annotations() -> Result<(), StamError> {
    let mut store = setup_alignment()?;
    let builders = {
        let source = whole(&store, "excerpt")?;
        let target = whole(&store, "humanrights")?;
        let transpositions = align_texts(&source, &target, &AlignmentConfig::default())?;
        transpositions[0].annotation_builders(TRANSPOSE_SET, "align-")
    };
    assert_eq!(builders.len(), 3);
    let mut handles = Vec::new();
    for builder in builders {
        handles.push(store.annotate(builder)?);
    }

    let transposition = store.annotation(handles[2])?;
    assert!(transposition
        .id()
        .map(|id| id.starts_with("align-transposition-"))
        .unwrap_or(false));
    assert!(transposition.has_data(TRANSPOSE_SET, TRANSPOSITION_KEY, &DataOperator::Any));
    let sides = transposition.annotations_in_targets_unsorted().count();
    assert_eq!(sides, 2);

    let source = store.annotation(handles[0])?;
    let target = store.annotation(handles[1])?;
    assert_eq!(source.text(), target.text());
    assert_eq!(source.text().len(), 3);
    assert_eq!(source.resources()[0].id(), Some("excerpt"));
    assert_eq!(target.resources()[0].id(), Some("humanrights"));
    Ok(())
}

#[test]
fn align_simple_to_annotation() -> Result<(), StamError> {
    let mut store = setup_alignment()?;
    let builders = {
        let source = whole(&store, "excerpt")?;
        let target = whole(&store, "humanrights")?;
        let config = AlignmentConfig {
            simple_only: true,
            ..Default::default()
        };
        let transpositions = align_texts(&source, &target, &config)?;
        transpositions[0].annotation_builders(TRANSPOSE_SET, "")
    };
    assert_eq!(builders.len(), 1);
    for builder in builders {
        store.annotate(builder)?;
    }
    let key = store.key(TRANSPOSE_SET, TRANSPOSITION_KEY)?;
    let annotations = key.annotations();
    assert_eq!(annotations.len(), 1);
    assert_eq!(
        annotations[0].text(),
        vec!["free and equal in ", "free and equal in "]
    );
    Ok(())
}
