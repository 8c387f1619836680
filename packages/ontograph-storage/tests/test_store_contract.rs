//! Behaviour shared by every `GraphStore` adapter.

use ontograph_storage::{
    ErrorKind, GraphEdge, GraphNode, GraphStore, InMemoryGraphStore, PropertyValue,
    SqliteGraphStore,
};

fn adapters() -> Vec<(&'static str, Box<dyn GraphStore>)> {
    vec![
        ("memory", Box::new(InMemoryGraphStore::new())),
        ("sqlite", Box::new(SqliteGraphStore::in_memory().unwrap())),
    ]
}

fn seed(store: &dyn GraphStore) {
    let mut tx = store.begin().unwrap();
    tx.create_node(
        &GraphNode::new("DOID:4", "Term")
            .with_property("name", PropertyValue::Single("disease".into())),
    )
    .unwrap();
    tx.create_node(
        &GraphNode::new("DOID:162", "Term")
            .with_property("name", PropertyValue::Single("cancer".into()))
            .with_property(
                "synonym",
                PropertyValue::Single("malignant neoplasm [EXACT]".into()),
            ),
    )
    .unwrap();
    tx.create_node(
        &GraphNode::new("http://example.org/A", "Entity")
            .with_property("notation", PropertyValue::Single("TEST:100".into()))
            .with_property("uri", PropertyValue::Single("http://example.org/A".into())),
    )
    .unwrap();
    tx.create_edge(&GraphEdge::new("DOID:162", "SUBCLASS_OF", "DOID:4"))
        .unwrap();
    tx.commit().unwrap();
}

#[test]
fn test_lookups_agree_across_adapters() {
    for (name, store) in adapters() {
        seed(store.as_ref());
        let tx = store.begin().unwrap();

        let by_notation = tx.find_by_key("TEST:100").unwrap();
        assert_eq!(
            by_notation.map(|n| n.identifier),
            Some("http://example.org/A".to_string()),
            "{name}"
        );

        let by_label = tx.find_by_label("Malignant Neoplasm").unwrap();
        assert_eq!(by_label.len(), 1, "{name}");
        assert_eq!(by_label[0].identifier, "DOID:162", "{name}");

        let prefixed: Vec<String> = tx
            .nodes_with_key_prefix("DOID:")
            .unwrap()
            .into_iter()
            .map(|n| n.identifier)
            .collect();
        assert_eq!(prefixed, vec!["DOID:162", "DOID:4"], "{name}");

        assert_eq!(tx.outgoing("DOID:162", Some("SUBCLASS_OF")).unwrap().len(), 1, "{name}");
        assert!(tx.outgoing("DOID:4", None).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn test_explicit_rollback_discards_writes() {
    for (name, store) in adapters() {
        let mut tx = store.begin().unwrap();
        tx.create_node(&GraphNode::new("DOID:4", "Term")).unwrap();
        tx.rollback().unwrap();

        let tx = store.begin().unwrap();
        assert!(tx.nodes().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn test_dangling_edges_rejected_everywhere() {
    for (name, store) in adapters() {
        seed(store.as_ref());
        let mut tx = store.begin().unwrap();
        let err = tx
            .create_edge(&GraphEdge::new("DOID:4", "SUBCLASS_OF", "DOID:0"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DanglingEdge, "{name}");
    }
}

#[test]
fn test_sqlite_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let store = SqliteGraphStore::new(&path).unwrap();
        seed(&store);
    }

    let store = SqliteGraphStore::new(&path).unwrap();
    let tx = store.begin().unwrap();
    assert_eq!(tx.nodes().unwrap().len(), 3);
    assert_eq!(tx.incoming("DOID:4", None).unwrap().len(), 1);
}
