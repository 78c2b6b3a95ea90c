#[path = "../common/mod.rs"]
mod common;

use common::{project_with, sample_project, temp_layout};
use lookgen::config::ViewLayout;
use lookgen::generate::{FieldClass, GenerateError, Generator};
use lookgen::model::Named;
use lookgen::overrides::ColumnOverrides;
use lookgen::typemap::{TypeMap, TypeMapError};
use serde_json::json;

#[test]
fn test_every_column_maps_to_exactly_one_class() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("classify", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.orders", &layout).unwrap();

    let dim_names: Vec<&str> = view.dimensions.iter().map(|d| d.name()).collect();
    let group_names: Vec<&str> = view.dimension_groups.iter().map(|g| g.name()).collect();

    assert_eq!(dim_names, vec!["id", "status"]);
    assert_eq!(group_names, vec!["created"]);
    // never both dimension and dimension group
    assert!(dim_names.iter().all(|name| !group_names.contains(name)));
    // every catalog column accounted for
    assert_eq!(dim_names.len() + group_names.len(), 3);
}

#[test]
fn test_classify_is_exclusive_per_column() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let columns = project.catalog_columns("model.analytics.orders").unwrap();

    let defaults = ColumnOverrides::default();
    assert_eq!(
        generator.classify(&columns["id"], &defaults).unwrap(),
        FieldClass::Dimension
    );
    assert_eq!(
        generator.classify(&columns["created_at"], &defaults).unwrap(),
        FieldClass::DimensionGroup
    );

    let ignored = ColumnOverrides {
        ignore_dim: true,
        ..ColumnOverrides::default()
    };
    assert_eq!(
        generator.classify(&columns["id"], &ignored).unwrap(),
        FieldClass::Excluded
    );
}

#[test]
fn test_trailing_at_suffix_stripped_once() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.events": {
                    "metadata": {"schema": "PROD", "name": "EVENTS"},
                    "columns": {
                        "UPDATED_AT": {"type": "TIMESTAMP_NTZ", "name": "UPDATED_AT"},
                        "CREATED": {"type": "VARCHAR", "name": "CREATED"}
                    }
                }
            }
        }),
        json!({"nodes": {}}),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("strip-at", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.events", &layout).unwrap();

    assert_eq!(view.dimension_groups[0].name, "updated");
    // a name without the suffix is untouched
    assert_eq!(view.dimensions[0].name, "created");
    // the group still reads the physical column
    assert_eq!(
        view.dimension_groups[0].args["sql"],
        json!("${TABLE}.\"UPDATED_AT\"")
    );
}

#[test]
fn test_override_type_wins_sql_stays_inferred() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "metadata": {"schema": "PROD", "name": "ORDERS"},
                    "columns": {
                        "IS_OPEN": {"type": "VARCHAR", "name": "IS_OPEN"}
                    }
                }
            }
        }),
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "columns": {
                        "IS_OPEN": {
                            "name": "IS_OPEN",
                            "meta": {"lookgen": {"type": "yesno", "label": "Open?"}}
                        }
                    }
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("precedence", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.orders", &layout).unwrap();
    let dim = &view.dimensions[0];

    assert_eq!(dim.args["type"], json!("yesno"));
    assert_eq!(dim.args["label"], json!("Open?"));
    // sql remains inferred unless also overridden
    assert_eq!(dim.args["sql"], json!("${TABLE}.\"IS_OPEN\""));
}

#[test]
fn test_deterministic_output_across_runs() {
    let layout = temp_layout("determinism", ViewLayout::Flat);

    let first = {
        let project = sample_project();
        let generator = Generator::new(&project, TypeMap::builtin());
        let view = generator.build_view("model.analytics.orders", &layout).unwrap();
        lookgen::lkml::view(&view)
    };
    let second = {
        let project = sample_project();
        let generator = Generator::new(&project, TypeMap::builtin());
        let view = generator.build_view("model.analytics.orders", &layout).unwrap();
        lookgen::lkml::view(&view)
    };

    assert_eq!(first, second);
}

#[test]
fn test_implicit_count_measure() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("count", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.orders", &layout).unwrap();

    let counts: Vec<_> = view
        .measures
        .iter()
        .filter(|m| m.name == "count")
        .collect();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].args["type"], json!("count"));

    // declared measures coexist with the implicit one, sorted by name
    let names: Vec<&str> = view.measures.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["count", "total_orders"]);
}

#[test]
fn test_declared_measures_carry_attributes_and_fixed_sql() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("measures", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.orders", &layout).unwrap();
    let measure = view
        .measures
        .iter()
        .find(|m| m.name == "total_orders")
        .unwrap();

    assert_eq!(measure.args["type"], json!("count_distinct"));
    assert_eq!(measure.args["sql"], json!("${id}"));
    // inherited from the owning column
    assert_eq!(measure.args["description"], json!("Order key"));
    assert!(!measure.args.contains_key("name"));
}

#[test]
fn test_unmapped_type_fails_the_node() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.events": {
                    "metadata": {"schema": "PROD", "name": "EVENTS"},
                    "columns": {
                        "PAYLOAD": {"type": "JSONB", "name": "PAYLOAD"}
                    }
                }
            }
        }),
        json!({"nodes": {}}),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("unmapped", ViewLayout::Flat);

    let result = generator.build_view("model.analytics.events", &layout);
    match result {
        Err(GenerateError::ColumnType { node, column, source }) => {
            assert_eq!(node, "model.analytics.events");
            assert_eq!(column, "payload");
            assert!(matches!(source, TypeMapError::Unmapped(t) if t == "JSONB"));
        }
        other => panic!("expected ColumnType error, got {other:?}"),
    }
}

#[test]
fn test_ignored_column_skips_type_resolution() {
    // ignore-dim is the escape hatch for columns the active type table
    // cannot cover, so it must win before resolution
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.events": {
                    "metadata": {"schema": "PROD", "name": "EVENTS"},
                    "columns": {
                        "PAYLOAD": {"type": "JSONB", "name": "PAYLOAD"},
                        "ID": {"type": "NUMBER", "name": "ID"}
                    }
                }
            }
        }),
        json!({
            "nodes": {
                "model.analytics.events": {
                    "columns": {
                        "PAYLOAD": {"name": "PAYLOAD", "meta": {"lookgen": {"ignore-dim": true}}}
                    }
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("ignored", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.events", &layout).unwrap();
    let names: Vec<&str> = view.dimensions.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["id"]);
    assert!(view.dimension_groups.is_empty());
}

#[test]
fn test_synthetic_dimension_from_metadata_only_column() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "metadata": {"schema": "PROD", "name": "ORDERS"},
                    "columns": {
                        "ID": {"type": "NUMBER", "name": "ID"}
                    }
                }
            }
        }),
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "columns": {
                        "LIFETIME_VALUE": {
                            "name": "LIFETIME_VALUE",
                            "description": "Computed downstream",
                            "meta": {"lookgen": {
                                "metadata-only": true,
                                "field-kind": "dimension",
                                "label": "LTV"
                            }}
                        },
                        "NOT_FLAGGED": {
                            "name": "NOT_FLAGGED",
                            "meta": {"lookgen": {"field-kind": "dimension"}}
                        },
                        "WRONG_KIND": {
                            "name": "WRONG_KIND",
                            "meta": {"lookgen": {"metadata-only": true, "field-kind": "parameter"}}
                        }
                    }
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("synthetic", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.orders", &layout).unwrap();
    let names: Vec<&str> = view.dimensions.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["id", "lifetime_value"]);

    let synthetic = &view.dimensions[1];
    // declared attributes and description only, nothing inferred
    assert_eq!(synthetic.args["label"], json!("LTV"));
    assert_eq!(synthetic.args["description"], json!("Computed downstream"));
    assert!(!synthetic.args.contains_key("sql"));
    assert!(!synthetic.args.contains_key("type"));
}

#[test]
fn test_malformed_measure_is_node_scoped() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "metadata": {"schema": "PROD", "name": "ORDERS"},
                    "columns": {
                        "ID": {"type": "NUMBER", "name": "ID"}
                    }
                }
            }
        }),
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "columns": {
                        "ID": {
                            "name": "ID",
                            "meta": {"lookgen": {"measures": [{"type": "sum"}]}}
                        }
                    }
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("malformed", ViewLayout::Flat);

    let result = generator.build_view("model.analytics.orders", &layout);
    assert!(matches!(
        result,
        Err(GenerateError::ColumnOverrides { node, column, .. })
            if node == "model.analytics.orders" && column == "id"
    ));
}

#[test]
fn test_view_identity_and_label_default() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("identity", ViewLayout::Flat);

    let orders = generator.build_view("model.analytics.orders", &layout).unwrap();
    assert_eq!(orders.name, "orders");
    assert_eq!(orders.sql_table_name, "\"PROD\".\"ORDERS\"");
    assert_eq!(orders.args["view_label"], json!("Orders"));

    // prefix stripping in the derived label
    let customers = generator
        .build_view("model.analytics.customers", &layout)
        .unwrap();
    assert_eq!(customers.name, "dim_customers");
    assert_eq!(customers.args["view_label"], json!("Customers"));
}

#[test]
fn test_declared_view_label_wins() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "metadata": {"schema": "PROD", "name": "ORDERS"},
                    "columns": {"ID": {"type": "NUMBER", "name": "ID"}}
                }
            }
        }),
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "config": {"meta": {"lookgen": {"view_label": "All Orders"}}}
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("view-label", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.orders", &layout).unwrap();
    assert_eq!(view.args["view_label"], json!("All Orders"));
}

#[test]
fn test_description_attached_only_when_nonempty() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("descriptions", ViewLayout::Flat);

    let view = generator.build_view("model.analytics.orders", &layout).unwrap();

    let id = view.dimensions.iter().find(|d| d.name == "id").unwrap();
    assert_eq!(id.args["description"], json!("Order key"));

    // status has no manifest entry at all
    let status = view.dimensions.iter().find(|d| d.name == "status").unwrap();
    assert!(!status.args.contains_key("description"));
}
