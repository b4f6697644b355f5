#![allow(dead_code)]
use stam::*;

pub const HUMANRIGHTS: &str = "All human beings are born free and equal in dignity and rights.";

pub fn setup_example_1() -> Result<AnnotationStore, StamError> {
    //instantiate with builder pattern
    let store = AnnotationStore::new(Config::default().with_debug(true))
        .with_id("test")
        .with_resource(
            TextResourceBuilder::new()
                .with_id("testres")
                .with_text("Hello world"),
        )?
        .with_dataset(
            AnnotationDataSetBuilder::new()
                .with_id("testdataset")
                .with_key("pos")
                .with_key_value_id("pos", "noun", "D1"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("A1")
                .with_target(SelectorBuilder::textselector(
                    "testres",
                    Offset::simple(6, 11),
                ))
                .with_existing_data("testdataset", "D1"),
        )?;
    Ok(store)
}

pub fn setup_example_2() -> Result<AnnotationStore, StamError> {
    //two words and a composite annotation over both, declared in reverse textual order
    let store = AnnotationStore::default()
        .with_id("test")
        .with_resource(
            TextResourceBuilder::new()
                .with_id("testres")
                .with_text("Hello world"),
        )?
        .with_dataset(AnnotationDataSetBuilder::new().with_id("testdataset"))?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("A1")
                .with_target(SelectorBuilder::textselector(
                    "testres",
                    Offset::simple(6, 11),
                ))
                .with_data_with_id("testdataset", "pos", "noun", "D1"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("A2")
                .with_target(SelectorBuilder::textselector(
                    "testres",
                    Offset::simple(0, 5),
                ))
                .with_data_with_id("testdataset", "pos", "interjection", "D2"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("Word")
                .with_target(SelectorBuilder::compositeselector([
                    SelectorBuilder::annotationselector("A1", None),
                    SelectorBuilder::annotationselector("A2", None),
                ]))
                .with_data("testdataset", "type", "phrase"),
        )?;
    Ok(store)
}

pub fn setup_example_3() -> Result<AnnotationStore, StamError> {
    //this example includes a higher-order annotation with relative offset
    let store = AnnotationStore::default()
        .with_id("test")
        .with_resource(TextResourceBuilder::new().with_id("testres").with_text(
            "I have no special talent. I am only passionately curious. -- Albert Einstein",
        ))?
        .with_dataset(AnnotationDataSetBuilder::new().with_id("testdataset"))?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("sentence2")
                .with_target(SelectorBuilder::textselector(
                    "testres",
                    Offset::simple(26, 57),
                ))
                .with_data("testdataset", "type", "sentence"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("sentence2word2")
                .with_target(SelectorBuilder::annotationselector(
                    "sentence2",
                    Some(Offset::simple(2, 4)),
                ))
                .with_data("testdataset", "type", "word"),
        )?;
    Ok(store)
}

pub fn setup_example_humanrights() -> Result<AnnotationStore, StamError> {
    let store = AnnotationStore::default()
        .with_id("humanrights")
        .with_resource(
            TextResourceBuilder::new()
                .with_id("humanrights")
                .with_text(HUMANRIGHTS),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("Sentence1")
                .with_target(SelectorBuilder::textselector(
                    "humanrights",
                    Offset::simple(0, 63),
                ))
                .with_data("structure", "type", "sentence"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("Phrase1")
                .with_target(SelectorBuilder::textselector(
                    "humanrights",
                    Offset::simple(17, 40),
                ))
                .with_data("structure", "type", "phrase"),
        )?;
    Ok(store)
}
