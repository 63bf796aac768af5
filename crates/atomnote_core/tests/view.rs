use atomnote_core::db::open_db_in_memory;
use atomnote_core::repo::atom_list::insert_at;
use atomnote_core::semantics::view::materialize;
use atomnote_core::{
    AdjacencyStyle, AtomDefaults, GraphRepository, NoFilter, Note, NotesError, NotesService,
    RangeFilter, RecordingActivityLog, SqliteFullTextIndex, SqliteGraphRepository,
};

fn create(repo: &SqliteGraphRepository<'_>, id: &str, value: &str) {
    let mut atom = repo.create_atom(Some(id), &AtomDefaults::default()).unwrap();
    atom.value = Some(value.to_string());
    repo.update_atom(&atom).unwrap();
}

fn child_ids(note: &Note) -> Vec<&str> {
    note.children
        .iter()
        .map(|child| child.id.as_deref().unwrap())
        .collect()
}

/// p -> [a, b], q -> [a], a -> [x]
fn seed(repo: &SqliteGraphRepository<'_>) {
    for (id, value) in [("p", "P"), ("q", "Q"), ("a", "A"), ("b", "B"), ("x", "X")] {
        create(repo, id, value);
    }
    insert_at(repo, "p", 0, "a").unwrap();
    insert_at(repo, "p", 1, "b").unwrap();
    insert_at(repo, "q", 0, "a").unwrap();
    insert_at(repo, "a", 0, "x").unwrap();
}

#[test]
fn height_zero_returns_leaf_root() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    seed(&repo);

    let root = repo.get_atom("p").unwrap();
    let note = materialize(&repo, root.as_ref(), None, 0, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(note.id.as_deref(), Some("p"));
    assert_eq!(note.value.as_deref(), Some("P"));
    assert!(note.children.is_empty());
}

#[test]
fn forward_view_follows_list_order_to_height() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    seed(&repo);

    let root = repo.get_atom("p").unwrap();
    let one = materialize(&repo, root.as_ref(), None, 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(child_ids(&one), ["a", "b"]);
    assert!(one.children[0].children.is_empty());

    let two = materialize(&repo, root.as_ref(), None, 2, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(child_ids(&two.children[0]), ["x"]);
}

#[test]
fn hidden_neighbour_is_listed_as_leaf() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    seed(&repo);
    let mut a = repo.get_atom("a").unwrap().unwrap();
    a.weight = Some(0.0);
    repo.update_atom(&a).unwrap();

    let filter = RangeFilter::try_new((0.0, 0.5, 1.0), (0.25, 0.5, 1.0)).unwrap();
    let root = repo.get_atom("p").unwrap();
    let note = materialize(&repo, root.as_ref(), None, 3, &filter, AdjacencyStyle::Forward)
        .unwrap();

    assert_eq!(child_ids(&note), ["a", "b"]);
    assert_eq!(note.children[0].value.as_deref(), Some("A"));
    assert!(note.children[0].children.is_empty());
}

#[test]
fn backward_view_lists_owners() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    seed(&repo);

    let root = repo.get_atom("a").unwrap();
    let note = materialize(&repo, root.as_ref(), None, 1, &NoFilter, AdjacencyStyle::Backward)
        .unwrap();
    assert_eq!(child_ids(&note), ["p", "q"]);
}

#[test]
fn undirected_view_skips_parent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    seed(&repo);

    let root = repo.get_atom("a").unwrap();
    let all = materialize(&repo, root.as_ref(), None, 1, &NoFilter, AdjacencyStyle::Undirected)
        .unwrap();
    assert_eq!(child_ids(&all), ["p", "q", "x"]);

    let parent = repo.get_atom("p").unwrap();
    let from_p = materialize(
        &repo,
        root.as_ref(),
        parent.as_ref(),
        1,
        &NoFilter,
        AdjacencyStyle::Undirected,
    )
    .unwrap();
    assert_eq!(child_ids(&from_p), ["q", "x"]);
}

#[test]
fn missing_root_is_null_root() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();

    let err = materialize(&repo, None, None, 1, &NoFilter, AdjacencyStyle::Forward).unwrap_err();
    assert!(matches!(err, NotesError::NullRoot));
}

#[test]
fn service_view_logs_and_resolves_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = NotesService::new(
        SqliteGraphRepository::try_new(&conn).unwrap(),
        SqliteFullTextIndex::new(&conn),
    );
    seed(service.graph());
    let mut log = RecordingActivityLog::new();

    let note = service
        .view("p", 1, &NoFilter, AdjacencyStyle::Forward, Some(&mut log))
        .unwrap();
    assert_eq!(child_ids(&note), ["a", "b"]);
    assert_eq!(log.count("view"), 1);

    let err = service
        .view("ghost", 1, &NoFilter, AdjacencyStyle::Forward, None)
        .unwrap_err();
    assert!(matches!(err, NotesError::NullRoot));
}

#[test]
fn custom_view_lists_leaves_in_given_order() {
    let conn = open_db_in_memory().unwrap();
    let service = NotesService::new(
        SqliteGraphRepository::try_new(&conn).unwrap(),
        SqliteFullTextIndex::new(&conn),
    );
    seed(service.graph());

    let ids = vec!["b".to_string(), "a".to_string()];
    let note = service.custom_view(&ids, &NoFilter).unwrap();
    assert!(note.id.is_none());
    assert_eq!(child_ids(&note), ["b", "a"]);
    assert!(note.children[1].children.is_empty());

    let err = service
        .custom_view(&["nope".to_string()], &NoFilter)
        .unwrap_err();
    assert!(matches!(err, NotesError::AtomNotFound(id) if id == "nope"));
}
