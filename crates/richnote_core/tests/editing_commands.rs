use richnote_core::{
    Block, BlockType, CommandEngine, Document, IndentDirection, MarkType, Node, NodeKey, Parent,
    Schema, Selection, Snapshot, Text,
};

fn key(value: &str) -> NodeKey {
    NodeKey::from(value)
}

fn paragraph(name: &str, text: &str) -> Block {
    Block::with_key(name, BlockType::Paragraph).child(Text::with_key(format!("{name}.t"), text))
}

fn item(name: &str) -> Block {
    Block::with_key(name, BlockType::ListItem).child(Text::with_key(format!("{name}.t"), name))
}

fn two_paragraphs() -> Document {
    Document::with_key(
        "doc",
        vec![
            paragraph("a", "first"),
            paragraph("b", "second"),
            paragraph("tail", ""),
        ],
    )
    .unwrap()
}

fn parent_block<'a>(doc: &'a Document, name: &str) -> Option<&'a Block> {
    match doc.get_parent(&key(name))? {
        Parent::Block(block) => Some(block),
        Parent::Root => None,
    }
}

#[test]
fn heading_document_gains_trailing_paragraph_once() {
    let doc = Document::with_key(
        "doc",
        vec![Block::with_key("h", BlockType::HeadingOne).child(Text::with_key("h.t", "Title"))],
    )
    .unwrap();
    let schema = Schema::standard();

    let normalized = schema.normalize(&doc).unwrap();
    assert_eq!(normalized.nodes().len(), 2);
    assert_eq!(normalized.nodes()[0].key(), &key("h"));
    let tail = normalized.last_block().unwrap();
    assert_eq!(tail.kind, BlockType::Paragraph);
    assert_eq!(tail.text(), "");
    assert_eq!(schema.normalize(&normalized).unwrap(), normalized);
}

#[test]
fn bulleted_list_wraps_two_paragraphs_in_place() {
    let engine = CommandEngine::standard();
    let doc = two_paragraphs();
    let selection = Selection::between("a.t", "b.t");

    let outcome = engine
        .set_block_type(&doc, &selection, &BlockType::BulletedList)
        .unwrap();
    let document = outcome.document;

    assert_eq!(document.nodes().len(), 2);
    let list = document.nodes()[0].as_block().unwrap();
    assert_eq!(list.kind, BlockType::BulletedList);
    let children: Vec<&NodeKey> = list.nodes.iter().map(|node| node.key()).collect();
    assert_eq!(children, [&key("a"), &key("b")]);
    for name in ["a", "b"] {
        assert_eq!(document.get_block(&key(name)).unwrap().kind, BlockType::ListItem);
    }
    assert_eq!(document.nodes()[1].key(), &key("tail"));
    assert_eq!(outcome.selection, selection);
}

#[test]
fn second_bulleted_toggle_restores_paragraphs() {
    let engine = CommandEngine::standard();
    let doc = two_paragraphs();
    let selection = Selection::between("a.t", "b.t");

    let listed = engine
        .set_block_type(&doc, &selection, &BlockType::BulletedList)
        .unwrap();
    let restored = engine
        .set_block_type(&listed.document, &listed.selection, &BlockType::BulletedList)
        .unwrap();

    assert_eq!(restored.document, doc);
}

#[test]
fn switching_list_type_keeps_items() {
    let engine = CommandEngine::standard();
    let doc = Document::with_key(
        "doc",
        vec![
            Block::with_key("numbers", BlockType::NumberedList)
                .child(item("one"))
                .child(item("two")),
            paragraph("tail", ""),
        ],
    )
    .unwrap();
    let selection = Selection::between("one.t", "two.t");

    let outcome = engine
        .set_block_type(&doc, &selection, &BlockType::BulletedList)
        .unwrap();
    let document = outcome.document;

    assert!(!document.contains(&key("numbers")));
    for name in ["one", "two"] {
        assert_eq!(document.get_block(&key(name)).unwrap().kind, BlockType::ListItem);
        assert_eq!(
            parent_block(&document, name).unwrap().kind,
            BlockType::BulletedList
        );
    }
    assert_eq!(
        parent_block(&document, "one").unwrap().key,
        parent_block(&document, "two").unwrap().key
    );
}

#[test]
fn mark_toggle_is_an_involution_over_mixed_blocks() {
    let engine = CommandEngine::standard();
    let doc = Document::with_key(
        "doc",
        vec![
            paragraph("a", "first"),
            Block::with_key("list", BlockType::BulletedList).child(item("li")),
            paragraph("tail", ""),
        ],
    )
    .unwrap();

    for mark in [MarkType::Bold, MarkType::Italic, MarkType::Underlined, MarkType::Code] {
        let selection = Selection::between("a.t", "li.t");
        let once = engine.toggle_mark(&doc, &selection, &mark).unwrap();
        assert_ne!(once.document, doc);
        let twice = engine
            .toggle_mark(&once.document, &once.selection, &mark)
            .unwrap();
        assert_eq!(twice.document, doc, "{mark}");
        assert_eq!(twice.selection, selection);
    }
}

#[test]
fn tab_and_shift_tab_change_nesting_depth() {
    let engine = CommandEngine::standard();
    let doc = Document::with_key(
        "doc",
        vec![
            Block::with_key("list", BlockType::BulletedList)
                .child(item("one"))
                .child(item("two")),
            paragraph("tail", ""),
        ],
    )
    .unwrap();
    let selection = Selection::collapsed("two.t", 0);

    let nested = engine
        .indent(&doc, &selection, IndentDirection::Indent)
        .unwrap()
        .expect("selection is inside a list");
    assert_eq!(nested.document.ancestors(&key("two")).len(), 2);
    assert_eq!(nested.document.ancestors(&key("one")).len(), 1);

    let lifted = engine
        .indent(&nested.document, &selection, IndentDirection::Outdent)
        .unwrap()
        .expect("selection is inside a list");
    assert_eq!(lifted.document, doc);
}

#[test]
fn commands_never_touch_their_input() {
    let engine = CommandEngine::standard();
    let doc = two_paragraphs();
    let before = serde_json::to_string(&doc).unwrap();

    let selection = Selection::between("a.t", "b.t");
    engine.toggle_mark(&doc, &selection, &MarkType::Bold).unwrap();
    engine
        .set_block_type(&doc, &selection, &BlockType::NumberedList)
        .unwrap();
    engine.insert_image(&doc, &selection, "x.png", None).unwrap();

    assert_eq!(serde_json::to_string(&doc).unwrap(), before);
    let first = doc.get_node(&key("a.t")).and_then(Node::as_text).unwrap();
    assert!(first.marks.is_empty());
}

#[test]
fn snapshot_json_round_trips_and_normalizes_once() {
    let fixture = serde_json::json!({
        "document": {
            "key": "doc",
            "nodes": [
                {
                    "key": "quote",
                    "type": "block-quote",
                    "nodes": [
                        { "key": "quote.t", "text": "cited", "marks": [{ "type": "italic" }] }
                    ]
                },
                { "key": "img", "type": "image", "nodes": [], "data": { "src": "a.png" } }
            ]
        }
    });

    let snapshot = Snapshot::from_json(&fixture.to_string()).unwrap();
    let reparsed = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(reparsed, snapshot);

    let image = snapshot.document.get_block(&key("img")).unwrap();
    assert_eq!(image.src(), Some("a.png"));
    assert!(image.is_void());

    let schema = Schema::standard();
    let once = schema.normalize(&snapshot.document).unwrap();
    assert_eq!(once.nodes().len(), 3);
    assert_eq!(schema.normalize(&once).unwrap(), once);
}

#[test]
fn list_unwrap_dissolves_the_whole_wrapper() {
    let engine = CommandEngine::standard();
    let doc = Document::with_key(
        "doc",
        vec![
            Block::with_key("numbers", BlockType::NumberedList)
                .child(item("one"))
                .child(item("two")),
            paragraph("tail", ""),
        ],
    )
    .unwrap();
    let only_first = Selection::collapsed("one.t", 0);

    let switched = engine
        .set_block_type(&doc, &only_first, &BlockType::BulletedList)
        .unwrap()
        .document;
    assert!(!switched.contains(&key("numbers")));
    assert_eq!(
        parent_block(&switched, "one").unwrap().kind,
        BlockType::BulletedList
    );
    assert!(parent_block(&switched, "two").is_none());
    assert_eq!(switched.get_block(&key("two")).unwrap().kind, BlockType::ListItem);

    let lifted = engine
        .indent(&doc, &only_first, IndentDirection::Outdent)
        .unwrap()
        .expect("selection is inside a list");
    let roots: Vec<&NodeKey> = lifted.document.nodes().iter().map(|node| node.key()).collect();
    assert_eq!(roots, [&key("one"), &key("two"), &key("tail")]);
}
