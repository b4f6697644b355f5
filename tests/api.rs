mod common;
use crate::common::*;

use stam::*;

#[test]
fn sanity_check() -> Result<(), StamError> {
    // Instantiate the store
    let mut store = AnnotationStore::default().with_id("test");

    // Insert a text resource into the store
    store.insert(TextResource::from_string(
        "testres",
        "Hello world",
        Config::default(),
    ))?;

    // Create a dataset with one key and insert it into the store
    let mut dataset = AnnotationDataSet::new(Config::default()).with_id("testdataset");
    dataset.insert(DataKey::new("pos"))?; //returns a DataKeyHandle, not further used in this test
    let set_handle = store.insert(dataset)?;

    //get by handle (internal id)
    let dataset = store.dataset(set_handle)?;
    assert_eq!(dataset.id(), Some("testdataset"));

    //get by directly by id
    let resource = store.resource("testres")?;
    assert_eq!(resource.id(), Some("testres"));
    assert_eq!(resource.textlen(), 11);
    Ok(())
}

#[test]
fn lookup_not_found() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let err = store.annotation("nonexistent").unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, StamError::IdNotFoundError(..)));
    assert!(store.resource("nonexistent").is_err());
    assert!(store.dataset("nonexistent").is_err());
    assert!(store.key("testdataset", "nonexistent").is_err());
    assert!(store.annotationdata("testdataset", "nonexistent").is_err());
    assert!(store.annotationdata("nonexistent", "D1").is_err());
    Ok(())
}

#[test]
fn annotation_text() -> Result<(), StamError> {
    let store = setup_example_1()?;
    let annotation = store.annotation("A1")?;
    assert_eq!(annotation.text(), vec!["world"]);
    assert_eq!(annotation.text_simple(), Some("world"));
    let resources: Vec<_> = annotation.resources();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].id(), Some("testres"));
    Ok(())
}

#[test]
fn find_text() -> Result<(), StamError> {
    let store = setup_example_1()?;
    let resource = store.resource("testres")?;
    let results: Vec<_> = resource.find_text("world").collect();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].begin(), 6);
    assert_eq!(results[0].end(), 11);
    assert_eq!(results[0].text(), "world");
    //the span is referenced by A1, so it is bound
    assert!(results[0].is_bound());
    let annotations = results[0].annotations();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].id(), Some("A1"));
    Ok(())
}

#[test]
fn find_text_multiple() -> Result<(), StamError> {
    let store = AnnotationStore::default().with_resource(
        TextResourceBuilder::new()
            .with_id("testres")
            .with_text("the cat and the dog and the bird"),
    )?;
    let resource = store.resource("testres")?;
    let begins: Vec<usize> = resource.find_text("the").map(|ts| ts.begin()).collect();
    assert_eq!(begins, vec![0, 12, 24]);
    assert!(resource.find_text("").next().is_none());
    assert!(resource.find_text("fish").next().is_none());
    //nothing is referenced, so everything is unbound
    assert!(resource.find_text("dog").all(|ts| !ts.is_bound()));
    Ok(())
}

#[test]
fn find_text_nocase() -> Result<(), StamError> {
    let store = AnnotationStore::default().with_resource(
        TextResourceBuilder::new()
            .with_id("testres")
            .with_text("Straße und STRASSE, Ähre und ähre"),
    )?;
    let resource = store.resource("testres")?;
    let results: Vec<_> = resource.find_text_nocase("ähre").collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text(), "Ähre");
    assert_eq!(results[1].text(), "ähre");
    assert_eq!(resource.find_text_nocase("straße").count(), 1);
    Ok(())
}

#[test]
fn find_text_in_textselection() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let phrase = store.annotation("Phrase1")?;
    let textselection = phrase.textselections().next().expect("phrase has text");
    //"are born free and equal", "and" also occurs outside of the phrase
    let results: Vec<_> = textselection.find_text("and").collect();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].begin(), 31);
    assert_eq!(results[0].text(), "and");
    let results: Vec<_> = textselection.find_text_nocase("FREE").collect();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].begin(), 26);
    Ok(())
}

#[test]
fn split_text() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let resource = store.resource("humanrights")?;
    let words: Vec<_> = resource.split_text(" ").collect();
    assert_eq!(words.len(), 12);
    assert_eq!(words[0].text(), "All");
    assert_eq!(words[1].begin(), 4);
    assert_eq!(words[11].text(), "rights.");

    let phrase = resource.textselection(&Offset::simple(17, 40))?;
    let words: Vec<_> = phrase.split_text(" ").collect();
    assert_eq!(words.len(), 5);
    assert_eq!(words[0].text(), "are");
    assert_eq!(words[0].begin(), 17);
    assert_eq!(words[4].text(), "equal");
    assert_eq!(words[4].end(), 40);
    Ok(())
}

#[test]
fn split_text_skips_empty() -> Result<(), StamError> {
    let store = AnnotationStore::default().with_resource(
        TextResourceBuilder::new()
            .with_id("testres")
            .with_text(";a;;b;"),
    )?;
    let resource = store.resource("testres")?;
    let parts: Vec<_> = resource.split_text(";").map(|ts| ts.text()).collect();
    assert_eq!(parts, vec!["a", "b"]);
    Ok(())
}

#[test]
fn strip_text() -> Result<(), StamError> {
    let store = AnnotationStore::default().with_resource(
        TextResourceBuilder::new()
            .with_id("testres")
            .with_text("  Hello world. \n"),
    )?;
    let resource = store.resource("testres")?;
    let stripped = resource.strip_text(&[' ', '\n', '.'])?;
    assert_eq!(stripped.text(), "Hello world");
    assert_eq!(stripped.begin(), 2);
    assert_eq!(stripped.end(), 13);
    let stripped = stripped.strip_text_with(|c| c == 'H' || c == 'd')?;
    assert_eq!(stripped.text(), "ello worl");
    Ok(())
}

#[test]
fn find_text_regex() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let resource = store.resource("humanrights")?;
    let expressions = vec![Regex::new(r"\b\w+ity\b").unwrap(), Regex::new(r"\bh\w+").unwrap()];
    let matches: Vec<_> = resource.find_text_regex(&expressions, None, false)?.collect();
    assert_eq!(matches.len(), 2);
    //results are in textual order
    assert_eq!(matches[0].as_str(), Some("human"));
    assert_eq!(matches[0].expression_index(), 1);
    assert_eq!(matches[1].as_str(), Some("dignity"));
    assert_eq!(matches[1].expression_index(), 0);
    Ok(())
}

#[test]
fn find_text_regex_capture() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let resource = store.resource("humanrights")?;
    let expressions = vec![Regex::new(r"born (\w+) and (\w+)").unwrap()];
    let matches: Vec<_> = resource.find_text_regex(&expressions, None, false)?.collect();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].multi());
    assert_eq!(matches[0].text(), vec!["free", "equal"]);
    assert_eq!(matches[0].capturegroups(), &[1, 2]);
    assert_eq!(matches[0].textselections()[0].begin(), 26);
    Ok(())
}

#[test]
fn textselection_by_offset() -> Result<(), StamError> {
    let store = setup_example_1()?;
    let resource = store.resource("testres")?;
    //exists already because of A1
    let textselection = resource.textselection(&Offset::simple(6, 11))?;
    assert!(textselection.is_bound());
    let textselection = resource.textselection(&Offset::new(
        Cursor::BeginAligned(0),
        Cursor::EndAligned(-6),
    ))?;
    assert!(!textselection.is_bound());
    assert_eq!(textselection.text(), "Hello");
    assert!(textselection.annotations().is_empty());
    //relative to a text selection
    let world = resource.textselection(&Offset::simple(6, 11))?;
    let sub = world.textselection(&Offset::simple(1, 3))?;
    assert_eq!((sub.begin(), sub.end()), (7, 9));
    assert_eq!(sub.text(), "or");
    assert_eq!(
        sub.relative_offset(&world),
        Some(Offset::simple(1, 3))
    );
    assert_eq!(world.relative_offset(&sub), None);
    Ok(())
}

#[test]
fn textselection_out_of_bounds() -> Result<(), StamError> {
    let mut store = setup_example_1()?;
    let resource = store.resource("testres")?;
    let err = resource.textselection(&Offset::simple(6, 12)).unwrap_err();
    assert!(err.is_out_of_bounds());
    assert!(resource.textselection(&Offset::simple(7, 6)).is_err());
    let err = store
        .annotate(
            AnnotationBuilder::new()
                .with_id("A2")
                .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 20)))
                .with_data("testdataset", "pos", "verb"),
        )
        .unwrap_err();
    assert!(err.is_out_of_bounds());
    Ok(())
}

#[test]
fn text_by_offset() -> Result<(), StamError> {
    let store = setup_example_1()?;
    let resource = store.resource("testres")?;
    assert_eq!(resource.text_by_offset(&Offset::simple(0, 5))?, "Hello");
    assert_eq!(
        resource.text_by_offset(&Offset::new(Cursor::EndAligned(-5), Cursor::EndAligned(0)))?,
        "world"
    );
    assert_eq!(resource.text_by_offset(&Offset::whole())?, "Hello world");
    Ok(())
}

#[test]
fn composite_ordering() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let word = store.annotation("Word")?;

    //textual order
    let ids: Vec<_> = word
        .annotations_in_targets()
        .iter()
        .map(|a| a.id().expect("annotation has id"))
        .collect();
    assert_eq!(ids, vec!["A2", "A1"]);

    //order pointed to
    let ids: Vec<_> = word
        .annotations_in_targets_unsorted()
        .map(|a| a.id().expect("annotation has id"))
        .collect();
    assert_eq!(ids, vec!["A1", "A2"]);

    let texts: Vec<_> = word.textselections().map(|ts| ts.text()).collect();
    assert_eq!(texts, vec!["Hello", "world"]);
    assert_eq!(word.text(), vec!["Hello", "world"]);
    assert_eq!(word.text_simple(), None);
    Ok(())
}

#[test]
fn directional_ordering() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    store.annotate(
        AnnotationBuilder::new()
            .with_id("Directed")
            .with_target(SelectorBuilder::directionalselector([
                SelectorBuilder::annotationselector("A1", None),
                SelectorBuilder::annotationselector("A2", None),
            ])),
    )?;
    let directed = store.annotation("Directed")?;
    //declaration order is kept for directional selectors
    assert_eq!(directed.text(), vec!["world", "Hello"]);
    Ok(())
}

#[test]
fn annotations_referencing() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let a1 = store.annotation("A1")?;
    let ids: Vec<_> = a1.annotations().map(|a| a.id().expect("id")).collect();
    assert_eq!(ids, vec!["Word"]);
    let word = store.annotation("Word")?;
    assert_eq!(word.annotations().count(), 0);
    Ok(())
}

#[test]
fn relative_annotation_selector() -> Result<(), StamError> {
    let store = setup_example_3()?;
    let word = store.annotation("sentence2word2")?;
    assert_eq!(word.text_simple(), Some("am"));
    let textselection = word.textselections().next().expect("word has text");
    assert_eq!((textselection.begin(), textselection.end()), (28, 30));
    let ids: Vec<_> = word
        .annotations_in_targets()
        .iter()
        .map(|a| a.id().expect("id"))
        .collect();
    assert_eq!(ids, vec!["sentence2"]);
    Ok(())
}

#[test]
fn related_text_embedding() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let phrase = store.annotation("Phrase1")?;
    let sentence = store.annotation("Sentence1")?;

    let results = phrase.related_text(&TextSelectionOperator::embedded());
    assert_eq!(results.len(), 1);
    assert_eq!((results[0].begin(), results[0].end()), (0, 63));

    let results = sentence.related_text(&TextSelectionOperator::embeds());
    assert_eq!(results.len(), 1);
    assert_eq!((results[0].begin(), results[0].end()), (17, 40));
    assert_eq!(results[0].text(), "are born free and equal");

    let annotations = sentence.annotations_by_related_text(&TextSelectionOperator::embeds());
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].id(), Some("Phrase1"));
    Ok(())
}

#[test]
fn related_text_negation() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let phrase = store.annotation("Phrase1")?;
    let sentence = store.annotation("Sentence1")?;
    assert!(sentence
        .related_text(&TextSelectionOperator::embeds().not())
        .is_empty());
    let results = phrase.related_text(&TextSelectionOperator::embeds().not());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].begin(), 0);
    Ok(())
}

#[test]
fn related_text_equals_index_consistency() -> Result<(), StamError> {
    for store in [setup_example_2()?, setup_example_3()?, setup_example_humanrights()?] {
        for annotation in store.annotations() {
            for textselection in annotation.textselections() {
                let equal = textselection.related_text(&TextSelectionOperator::equals());
                assert!(equal.contains(&textselection));
                assert!(textselection
                    .annotations()
                    .iter()
                    .any(|a| a.handle() == annotation.handle()));
            }
        }
    }
    Ok(())
}

#[test]
fn textselection_test_symmetry() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let resource = store.resource("humanrights")?;
    let sentence = resource.textselection(&Offset::simple(0, 63))?;
    let phrase = resource.textselection(&Offset::simple(17, 40))?;
    let word = resource.textselection(&Offset::simple(4, 9))?;
    let operators = [
        TextSelectionOperator::embeds(),
        TextSelectionOperator::embedded(),
        TextSelectionOperator::before(),
        TextSelectionOperator::after(),
        TextSelectionOperator::overlaps(),
        TextSelectionOperator::leftadjacent(),
    ];
    for a in [&sentence, &phrase, &word] {
        for b in [&sentence, &phrase, &word] {
            for operator in operators.iter() {
                let inverse = operator.inverse().expect("operator has an inverse");
                assert_eq!(a.test(operator, b), b.test(&inverse, a));
            }
        }
    }
    assert!(sentence.test(&TextSelectionOperator::embeds(), &phrase));
    assert!(phrase.test(&TextSelectionOperator::embedded(), &sentence));
    assert!(word.test(&TextSelectionOperator::before(), &phrase));
    assert!(!phrase.test(&TextSelectionOperator::overlaps(), &word));
    Ok(())
}

#[test]
fn composite_related_text() -> Result<(), StamError> {
    let store = setup_example_2()?.with_annotation(
        AnnotationBuilder::new()
            .with_id("Sentence")
            .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 11)))
            .with_data("testdataset", "type", "sentence"),
    )?;
    let word = store.annotation("Word")?;
    //the parts of the composite are not related to themselves
    let ids: Vec<_> = word
        .annotations_by_related_text(&TextSelectionOperator::embedded())
        .iter()
        .map(|a| a.id().expect("id").to_string())
        .collect();
    assert_eq!(ids, vec!["Sentence"]);
    let ids: Vec<_> = word
        .annotations_by_related_text(&TextSelectionOperator::EmbeddedAll)
        .iter()
        .map(|a| a.id().expect("id").to_string())
        .collect();
    assert_eq!(ids, vec!["Sentence"]);
    let results = word.related_text(&TextSelectionOperator::SameRangeAll);
    assert_eq!(results.len(), 1);
    assert_eq!((results[0].begin(), results[0].end()), (0, 11));

    let a1 = store.annotation("A1")?;
    let results = a1.related_text(&TextSelectionOperator::InSet);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text(), "world");
    Ok(())
}

#[test]
fn data_deduplication() -> Result<(), StamError> {
    let store = setup_example_2()?.with_annotation(
        AnnotationBuilder::new()
            .with_id("A3")
            .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 11)))
            .with_data("testdataset", "pos", "noun"),
    )?;
    let dataset = store.dataset("testdataset")?;
    //pos=noun, pos=interjection, type=phrase
    assert_eq!(dataset.data_len(), 3);
    assert_eq!(dataset.keys_len(), 2);
    let data = store.annotationdata("testdataset", "D1")?;
    let ids: Vec<_> = data.annotations().map(|a| a.id().expect("id")).collect();
    assert_eq!(ids, vec!["A1", "A3"]);
    assert_eq!(data.annotations_len(), 2);
    Ok(())
}

#[test]
fn data_navigation() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let data = store.annotationdata("testdataset", "D1")?;
    assert_eq!(data.key().as_str(), "pos");
    assert_eq!(data.value(), &DataValue::from("noun"));
    assert_eq!(data.set().id(), Some("testdataset"));
    assert!(data.test(&DataOperator::Equals("noun")));

    let key = store.key("testdataset", "pos")?;
    assert_eq!(key.set().id(), Some("testdataset"));
    assert_eq!(key.data().count(), 2);
    let ids: Vec<_> = key.annotations().iter().map(|a| a.id().expect("id")).collect();
    assert_eq!(ids, vec!["A1", "A2"]);
    assert!(key.test("pos"));

    let dataset = store.dataset("testdataset")?;
    assert_eq!(
        dataset
            .data_by_value("pos", &DataValue::from("interjection"))
            .and_then(|d| d.id()),
        Some("D2")
    );
    assert!(dataset.data_by_value("pos", &DataValue::from("verb")).is_none());
    assert_eq!(dataset.annotations().count(), 3);
    Ok(())
}

#[test]
fn find_data() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let results = store.find_data("testdataset", "pos", &DataOperator::Equals("noun"));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id(), Some("D1"));

    let results = store.find_data("testdataset", "pos", &DataOperator::Any);
    assert_eq!(results.len(), 2);

    let results = store.find_data(false, false, &DataOperator::Equals("phrase"));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key().as_str(), "type");

    assert!(store
        .find_data("nonexistent", "pos", &DataOperator::Any)
        .is_empty());
    assert!(store
        .find_data("testdataset", "nonexistent", &DataOperator::Any)
        .is_empty());
    assert!(store.test_data("testdataset", false, &DataOperator::Equals("interjection")));
    assert!(!store.test_data("testdataset", false, &DataOperator::Equals("verb")));

    let dataset = store.dataset("testdataset")?;
    assert_eq!(
        dataset
            .find_data(false, &DataOperator::Equals("noun").not())
            .len(),
        2
    );
    Ok(())
}

#[test]
fn annotation_find_data() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let annotation = store.annotation("A1")?;
    assert_eq!(annotation.data().count(), 1);
    let results = annotation.find_data("testdataset", "pos", &DataOperator::Any);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value(), &DataValue::from("noun"));
    assert!(annotation.has_data("testdataset", "pos", &DataOperator::Equals("noun")));
    assert!(!annotation.has_data("testdataset", "pos", &DataOperator::Equals("verb")));
    assert!(!annotation.has_data("testdataset", "type", &DataOperator::Any));
    assert!(annotation.has_data(false, false, &DataOperator::Any));
    Ok(())
}

#[test]
fn metadata_annotations() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    store.annotate(
        AnnotationBuilder::new()
            .with_id("ResourceMeta")
            .with_target(SelectorBuilder::resourceselector("testres"))
            .with_data("metadata", "author", "proycon"),
    )?;
    store.annotate(
        AnnotationBuilder::new()
            .with_id("SetMeta")
            .with_target(SelectorBuilder::datasetselector("testdataset"))
            .with_data("metadata", "description", "part-of-speech tags"),
    )?;

    let annotation = store.annotation("ResourceMeta")?;
    assert_eq!(annotation.textselections().count(), 0);
    //a resource selector degenerates to the full text
    assert_eq!(annotation.text_simple(), Some("Hello world"));
    assert_eq!(annotation.resources().len(), 1);

    let resource = store.resource("testres")?;
    let ids: Vec<_> = resource
        .annotations_as_metadata()
        .map(|a| a.id().expect("id"))
        .collect();
    assert_eq!(ids, vec!["ResourceMeta"]);
    let ids: Vec<_> = resource
        .annotations()
        .iter()
        .map(|a| a.id().expect("id"))
        .collect();
    assert_eq!(ids, vec!["A2", "Word", "A1"]);

    let annotation = store.annotation("SetMeta")?;
    assert!(annotation.text().is_empty());
    let datasets: Vec<_> = annotation.datasets().map(|d| d.handle()).collect();
    assert_eq!(datasets, vec![store.dataset("testdataset")?.handle()]);
    let dataset = store.dataset("testdataset")?;
    let ids: Vec<_> = dataset
        .annotations_as_metadata()
        .map(|a| a.id().expect("id"))
        .collect();
    assert_eq!(ids, vec!["SetMeta"]);
    Ok(())
}

#[test]
fn textual_order() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let ids: Vec<_> = store
        .annotations()
        .textual_order()
        .iter()
        .map(|a| a.id().expect("id"))
        .collect();
    //Word and A2 both start at 0, the shorter key sorts first
    assert_eq!(ids, vec!["A2", "Word", "A1"]);
    Ok(())
}

#[test]
fn enumeration() -> Result<(), StamError> {
    let store = setup_example_2()?;
    assert_eq!(store.resources_len(true), 1);
    assert_eq!(store.datasets_len(true), 1);
    assert_eq!(store.annotations_len(true), 3);
    assert_eq!(store.substores_len(true), 0);
    let ids: Vec<_> = store.annotations().map(|a| a.id().expect("id")).collect();
    assert_eq!(ids, vec!["A1", "A2", "Word"]);
    let resource = store.resource("testres")?;
    assert_eq!(resource.textselections_len(), 2);
    let begins: Vec<_> = resource.textselections().map(|ts| ts.begin()).collect();
    assert_eq!(begins, vec![0, 6]);
    let dataset = store.dataset("testdataset")?;
    let keys: Vec<_> = dataset.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["pos", "type"]);
    Ok(())
}

#[test]
fn annotate_is_atomic() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    let result = store.annotate(
        AnnotationBuilder::new()
            .with_id("Broken")
            .with_target(SelectorBuilder::compositeselector([
                SelectorBuilder::textselector("testres", Offset::simple(0, 5)),
                SelectorBuilder::annotationselector("nonexistent", None),
            ]))
            .with_data("newdataset", "pos", "verb"),
    );
    assert!(result.is_err());
    assert!(store.annotation("Broken").is_err());
    assert!(store.dataset("newdataset").is_err());
    assert_eq!(store.annotations_len(true), 3);
    Ok(())
}

#[test]
fn duplicate_id() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    let err = store
        .annotate(
            AnnotationBuilder::new()
                .with_id("A1")
                .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 5))),
        )
        .unwrap_err();
    assert!(matches!(err, StamError::DuplicateIdError(..)));
    Ok(())
}
