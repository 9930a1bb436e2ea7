use drift::{
    ActualColumn, ColumnDescriptor, Config, Discrepancy, Error, StaticCatalog, TableCheck,
    TableDef, TypeEquivalence, TypeFamily, check_namespace,
};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn example_table() -> TableDef {
    TableDef::new(
        "table",
        [
            ColumnDescriptor::new("id", "integer"),
            ColumnDescriptor::new("name", "text"),
            ColumnDescriptor::new("stop_lat", "double"),
        ],
    )
    .unwrap()
}

#[test]
fn test_missing_column_scenario() {
    init_tracing();
    let table = example_table();
    let columns = [
        ActualColumn::new("id", "integer"),
        ActualColumn::new("name", "character varying"),
    ];

    let check = TableCheck::new(&table, "ns", &columns, &TypeEquivalence::postgres());
    assert_eq!(
        check.missing_columns(),
        &[Discrepancy::Missing {
            column: "stop_lat".into(),
            expected_type: "double".to_string(),
        }]
    );
    assert!(check.columns_with_wrong_type().is_empty());
    insta::assert_snapshot!(
        check.migration_statement().unwrap(),
        @"ALTER TABLE ns.table ADD COLUMN stop_lat double;"
    );
}

#[test]
fn test_wrong_type_scenario() {
    init_tracing();
    let table = example_table();
    let columns = [
        ActualColumn::new("id", "integer"),
        ActualColumn::new("name", "text"),
        ActualColumn::new("stop_lat", "text"),
    ];

    let check = TableCheck::new(&table, "ns", &columns, &TypeEquivalence::postgres());
    assert!(check.missing_columns().is_empty());
    assert_eq!(
        check.columns_with_wrong_type(),
        &[Discrepancy::WrongType {
            column: "stop_lat".into(),
            expected_type: "double".to_string(),
            actual_type: "text".to_string(),
        }]
    );
    insta::assert_snapshot!(
        check.migration_statement().unwrap(),
        @"ALTER TABLE ns.table ALTER COLUMN stop_lat TYPE double;"
    );
}

#[test]
fn test_clean_table_has_no_statement() {
    let table = example_table();
    let columns = [
        ActualColumn::new("id", "int4"),
        ActualColumn::new("name", "varchar(255)"),
        ActualColumn::new("stop_lat", "double precision"),
    ];

    let check = TableCheck::new(&table, "ns", &columns, &TypeEquivalence::postgres());
    assert!(!check.has_issues());
    assert!(matches!(
        check.migration_statement(),
        Err(Error::NoIssues { .. })
    ));
}

#[test]
fn test_configured_family_changes_classification() {
    let table = TableDef::new("shapes", [ColumnDescriptor::new("shape_pt_geom", "geometry")])
        .unwrap();
    let columns = [ActualColumn::new("shape_pt_geom", "USER-DEFINED")];

    let check = TableCheck::new(&table, "feed_1", &columns, &TypeEquivalence::postgres());
    assert_eq!(check.columns_with_wrong_type().len(), 1);

    let config = Config {
        builtin_families: None,
        type_families: vec![TypeFamily::new("geometry", ["user-defined"])],
    };
    let types = TypeEquivalence::from_config(&config).unwrap();
    let check = TableCheck::new(&table, "feed_1", &columns, &types);
    assert!(!check.has_issues());
}

#[test]
fn test_families_loaded_from_config_file() {
    let project = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(project.path().join(".config")).unwrap();
    std::fs::write(
        project.path().join(drift_config::CONFIG_PATH),
        r#"
type_families (
  {canonical geometry, spellings ("USER-DEFINED")}
)
"#,
    )
    .unwrap();
    let nested = project.path().join("feeds/2024-06");
    std::fs::create_dir_all(&nested).unwrap();

    let (config, path) = drift_config::load_from(&nested).unwrap();
    assert_eq!(path, project.path().join(".config/drift.styx"));

    let table = TableDef::new(
        "shapes",
        [
            ColumnDescriptor::new("shape_id", "text"),
            ColumnDescriptor::new("shape_pt_geom", "geometry"),
        ],
    )
    .unwrap();
    let columns = [
        ActualColumn::new("shape_id", "character varying"),
        ActualColumn::new("shape_pt_geom", "USER-DEFINED"),
    ];

    let types = TypeEquivalence::from_config(&config).unwrap();
    let check = TableCheck::new(&table, "feed_2", &columns, &types);
    assert!(!check.has_issues(), "{}", check);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_namespaces_check_in_parallel() {
    init_tracing();
    let tables = std::sync::Arc::new(vec![example_table()]);
    let types = std::sync::Arc::new(TypeEquivalence::postgres());

    let mut catalog = StaticCatalog::new();
    catalog.insert(
        "feed_old",
        "table",
        [
            ActualColumn::new("id", "integer"),
            ActualColumn::new("name", "character varying"),
        ],
    );
    catalog.insert(
        "feed_new",
        "table",
        [
            ActualColumn::new("id", "integer"),
            ActualColumn::new("name", "text"),
            ActualColumn::new("stop_lat", "float8"),
        ],
    );
    let catalog = std::sync::Arc::new(catalog);

    let mut handles = Vec::new();
    for namespace in ["feed_old", "feed_new", "feed_empty"] {
        let (tables, types, catalog) = (tables.clone(), types.clone(), catalog.clone());
        handles.push(tokio::spawn(async move {
            let check = check_namespace(&*catalog, &namespace.into(), &tables, &types).await?;
            Ok::<_, Error>(check.migration_statements()?)
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(
        results,
        vec![
            vec!["ALTER TABLE feed_old.table ADD COLUMN stop_lat double;".to_string()],
            vec![],
            vec![
                "ALTER TABLE feed_empty.table ADD COLUMN id integer, ADD COLUMN name text, ADD COLUMN stop_lat double;"
                    .to_string()
            ],
        ]
    );
}

// ===== Properties =====

/// Expected type, and a different spelling of the same type.
const TYPES: &[(&str, &str)] = &[
    ("integer", "int4"),
    ("text", "character varying(64)"),
    ("double precision", "float8"),
    ("boolean", "bool"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Absent,
    Matching,
    Wrong,
}

fn state() -> impl Strategy<Value = State> {
    prop_oneof![Just(State::Absent), Just(State::Matching), Just(State::Wrong)]
}

fn layout() -> impl Strategy<Value = Vec<(usize, State)>> {
    prop::collection::vec((0..TYPES.len(), state()), 1..12)
}

/// A type spelling from a different family than `TYPES[ty]`.
fn wrong_type(ty: usize) -> &'static str {
    TYPES[(ty + 1) % TYPES.len()].0
}

fn build(layout: &[(usize, State)], extras: usize, reverse: bool) -> (TableDef, Vec<ActualColumn>) {
    let table = TableDef::new(
        "stop_times",
        layout
            .iter()
            .enumerate()
            .map(|(i, (ty, _))| ColumnDescriptor::new(format!("c{i}"), TYPES[*ty].0)),
    )
    .unwrap();

    let mut columns: Vec<ActualColumn> = layout
        .iter()
        .enumerate()
        .filter_map(|(i, (ty, state))| match state {
            State::Absent => None,
            State::Matching => Some(ActualColumn::new(format!("c{i}"), TYPES[*ty].1)),
            State::Wrong => Some(ActualColumn::new(format!("c{i}"), wrong_type(*ty))),
        })
        .collect();
    for i in 0..extras {
        columns.push(ActualColumn::new(format!("extra_{i}"), "text"));
    }
    if reverse {
        columns.reverse();
    }

    (table, columns)
}

proptest! {
    #[test]
    fn prop_discrepancies_match_layout(layout in layout(), extras in 0usize..4, reverse in any::<bool>()) {
        let (table, columns) = build(&layout, extras, reverse);
        let check = TableCheck::new(&table, "ns", &columns, &TypeEquivalence::postgres());

        let expected_missing: Vec<Discrepancy> = layout
            .iter()
            .enumerate()
            .filter(|(_, (_, state))| *state == State::Absent)
            .map(|(i, (ty, _))| Discrepancy::Missing {
                column: format!("c{i}").into(),
                expected_type: TYPES[*ty].0.to_string(),
            })
            .collect();
        let expected_wrong: Vec<Discrepancy> = layout
            .iter()
            .enumerate()
            .filter(|(_, (_, state))| *state == State::Wrong)
            .map(|(i, (ty, _))| Discrepancy::WrongType {
                column: format!("c{i}").into(),
                expected_type: TYPES[*ty].0.to_string(),
                actual_type: wrong_type(*ty).to_string(),
            })
            .collect();

        prop_assert_eq!(check.missing_columns(), expected_missing.as_slice());
        prop_assert_eq!(check.columns_with_wrong_type(), expected_wrong.as_slice());
        prop_assert_eq!(
            check.has_issues(),
            layout.iter().any(|(_, state)| *state != State::Matching)
        );
        prop_assert!(check.discrepancies().all(|d| !d.column().as_str().starts_with("extra_")));
    }

    #[test]
    fn prop_adds_precede_alters(layout in layout(), extras in 0usize..4, reverse in any::<bool>()) {
        let (table, columns) = build(&layout, extras, reverse);
        let check = TableCheck::new(&table, "ns", &columns, &TypeEquivalence::postgres());

        match check.migration_statement() {
            Ok(sql) => {
                prop_assert!(check.has_issues());
                prop_assert!(sql.starts_with("ALTER TABLE ns.stop_times "));
                prop_assert!(sql.ends_with(';'));

                let clauses: Vec<&str> = sql["ALTER TABLE ns.stop_times ".len()..sql.len() - 1]
                    .split(", ")
                    .collect();
                prop_assert_eq!(clauses.len(), check.discrepancies().count());

                let first_alter = clauses.iter().position(|c| c.starts_with("ALTER COLUMN "));
                let last_add = clauses.iter().rposition(|c| c.starts_with("ADD COLUMN "));
                if let (Some(first_alter), Some(last_add)) = (first_alter, last_add) {
                    prop_assert!(last_add < first_alter);
                }
            }
            Err(err) => {
                prop_assert!(!check.has_issues());
                prop_assert!(matches!(err, Error::NoIssues { .. }), "unexpected error: {}", err);
            }
        }
    }

    #[test]
    fn prop_widening_never_adds_issues(layout in layout(), extras in 0usize..8) {
        let (table, narrow) = build(&layout, 0, false);
        let (_, wide) = build(&layout, extras, false);
        let types = TypeEquivalence::postgres();

        let narrow_check = TableCheck::new(&table, "ns", &narrow, &types);
        let wide_check = TableCheck::new(&table, "ns", &wide, &types);

        prop_assert_eq!(narrow_check.missing_columns(), wide_check.missing_columns());
        prop_assert_eq!(
            narrow_check.columns_with_wrong_type(),
            wide_check.columns_with_wrong_type()
        );
    }

    #[test]
    fn prop_type_equivalence_is_reflexive(name in "[a-zA-Z ]{1,24}(\\([0-9]{1,3}\\))?") {
        let types = TypeEquivalence::postgres();
        prop_assert!(types.is_equivalent(&name, &name));
    }
}
