use atomnote_core::db::open_db_in_memory;
use atomnote_core::repo::atom_list::insert_at;
use atomnote_core::{
    AdjacencyStyle, AtomDefaults, FullTextIndex, GraphRepository, NoFilter, Note, NotesError,
    NotesService, PropertyQueryEngine, QueryError, RangeFilter, SearchError, SearchQuery,
    SqliteFullTextIndex, SqliteGraphRepository,
};
use rusqlite::Connection;

type Service<'conn> = NotesService<SqliteGraphRepository<'conn>, SqliteFullTextIndex<'conn>>;

fn service(conn: &Connection) -> Service<'_> {
    NotesService::new(
        SqliteGraphRepository::try_new(conn).unwrap(),
        SqliteFullTextIndex::new(conn),
    )
}

/// Creates an atom through an update so its value reaches the index.
fn create(service: &Service<'_>, id: &str, value: &str, weight: Option<f32>, created: i64) {
    service
        .graph()
        .create_atom(Some(id), &AtomDefaults::default())
        .unwrap();
    let mut desired = Note {
        value: Some(value.to_string()),
        weight,
        ..Note::with_id(id)
    };
    service
        .update(id, &mut desired, 0, &NoFilter, AdjacencyStyle::Forward, None)
        .unwrap();
    service
        .graph()
        .connection()
        .execute(
            "UPDATE atoms SET created = ?2 WHERE id = ?1;",
            rusqlite::params![id, created],
        )
        .unwrap();
}

fn child_ids(note: &Note) -> Vec<&str> {
    note.children
        .iter()
        .map(|child| child.id.as_deref().unwrap())
        .collect()
}

#[test]
fn search_ranks_by_weight_then_newest() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    create(&service, "t1", "river light", Some(0.2), 1);
    create(&service, "t2", "river stone", Some(0.9), 2);
    create(&service, "t3", "river bank", Some(0.9), 3);
    create(&service, "other", "mountain", Some(1.0), 4);

    let note = service
        .search(&SearchQuery::new("river"), 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();

    assert!(note.id.is_none());
    assert_eq!(
        note.value.as_deref(),
        Some("full text search results for \"river\"")
    );
    assert_eq!(child_ids(&note), ["t3", "t2", "t1"]);
}

#[test]
fn search_terms_are_anded() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    create(&service, "a", "red apple", None, 1);
    create(&service, "b", "red brick", None, 2);

    let note = service
        .search(&SearchQuery::new("red apple"), 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(child_ids(&note), ["a"]);
}

#[test]
fn blank_search_returns_empty_listing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    create(&service, "a", "anything", None, 1);

    let note = service
        .search(&SearchQuery::new("   "), 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();
    assert!(note.children.is_empty());
}

#[test]
fn search_hides_filtered_hits_and_expands_to_depth_minus_one() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    create(&service, "shown", "harbor", Some(0.8), 1);
    create(&service, "hidden", "harbor", Some(0.1), 2);
    create(&service, "kid", "boat", Some(0.8), 3);
    insert_at(service.graph(), "shown", 0, "kid").unwrap();
    let filter = RangeFilter::try_new((0.0, 0.5, 1.0), (0.5, 0.5, 1.0)).unwrap();

    let flat = service
        .search(&SearchQuery::new("harbor"), 1, &filter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(child_ids(&flat), ["shown"]);
    assert!(flat.children[0].children.is_empty());

    let deep = service
        .search(&SearchQuery::new("harbor"), 2, &filter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(child_ids(&deep.children[0]), ["kid"]);
}

#[test]
fn raw_syntax_errors_surface_as_invalid_query() {
    let conn = open_db_in_memory().unwrap();
    let index = SqliteFullTextIndex::new(&conn);

    let mut query = SearchQuery::new("\"unterminated");
    query.raw_fts_syntax = true;
    let err = index.search(&query).unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery { .. }));
}

#[test]
fn find_roots_lists_unreferenced_visible_atoms_ranked() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    create(&service, "light", "light root", Some(0.3), 1);
    create(&service, "heavy", "heavy root", Some(0.9), 2);
    create(&service, "ghost", "hidden root", Some(0.0), 3);
    create(&service, "child", "nested", Some(1.0), 4);
    insert_at(service.graph(), "heavy", 0, "child").unwrap();
    let filter = RangeFilter::try_new((0.0, 0.5, 1.0), (0.2, 0.5, 1.0)).unwrap();

    let note = service
        .find_roots(&filter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(child_ids(&note), ["heavy", "light"]);
    assert!(note.children.iter().all(|child| child.children.is_empty()));
}

#[test]
fn run_query_matches_properties_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    create(&service, "a", "Rust Book", Some(0.5), 1);
    create(&service, "b", "rusty nail", Some(0.7), 2);
    create(&service, "c", "Go Book", Some(0.9), 3);
    let mut b = service.graph().get_atom("b").unwrap().unwrap();
    b.alias = Some("hardware".to_string());
    service.graph().update_atom(&b).unwrap();

    let engine = PropertyQueryEngine::new(service.graph());
    let note = service
        .run_query(&engine, r#"value="RUST""#, 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(note.value.as_deref(), Some(r#"query results for "value="RUST"""#));
    assert_eq!(child_ids(&note), ["b", "a"]);

    let note = service
        .run_query(
            &engine,
            r#"value="rust" and alias="hard""#,
            1,
            &NoFilter,
            AdjacencyStyle::Forward,
        )
        .unwrap();
    assert_eq!(child_ids(&note), ["b"]);
}

#[test]
fn run_query_reports_bad_syntax() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let engine = PropertyQueryEngine::new(service.graph());

    let err = service
        .run_query(&engine, "value=rust", 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap_err();
    assert!(matches!(
        err,
        NotesError::Query(QueryError::InvalidSyntax { position: 0, .. })
    ));
}

#[test]
fn reindex_restores_lost_index_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    create(&service, "a", "compass", None, 1);
    create(&service, "b", "sextant", None, 2);
    conn.execute("DELETE FROM atom_search;", []).unwrap();

    assert!(service
        .search(&SearchQuery::new("compass"), 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap()
        .children
        .is_empty());
    assert_eq!(service.reindex().unwrap(), 2);
    let note = service
        .search(&SearchQuery::new("compass"), 1, &NoFilter, AdjacencyStyle::Forward)
        .unwrap();
    assert_eq!(child_ids(&note), ["a"]);
}
