#[path = "../common/mod.rs"]
mod common;

use common::{project_with, sample_project, temp_layout};
use lookgen::config::ViewLayout;
use lookgen::generate::Generator;
use lookgen::typemap::TypeMap;
use serde_json::json;
use std::path::Path;

#[test]
fn test_only_declared_explores_exist() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());

    let explores = generator.declared_explores();
    assert_eq!(explores.len(), 1);
    assert!(explores.contains_key("orders"));
    assert!(!explores.contains_key("customers"));
}

#[test]
fn test_explore_defaults_and_joins() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("explore-defaults", ViewLayout::Flat);

    let spec = generator.declared_explores().remove("orders").unwrap();
    let explore = generator.build_explore("orders", spec, &layout).unwrap();

    assert_eq!(explore.name, "orders");
    assert_eq!(explore.import_name(), "orders");
    // label derived from the explore identity
    assert_eq!(explore.args["label"], json!("Orders"));
    assert!(!explore.args.contains_key("from"));

    assert_eq!(explore.joins.len(), 1);
    let join = &explore.joins[0];
    assert_eq!(join.name, "customers");
    assert_eq!(join.args["relationship"], json!("many_to_one"));
    assert!(!join.args.contains_key("name"));
    assert_eq!(
        join.relative_path,
        Path::new("views/customers.view.lkml")
    );
}

#[test]
fn test_aliased_explore_records_from() {
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
                    "config": {"meta": {"lookgen": {
                        "explore": {"name": "all_orders", "joins": []}
                    }}}
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("explore-alias", ViewLayout::Flat);

    let spec = generator.declared_explores().remove("orders").unwrap();
    let explore = generator.build_explore("orders", spec, &layout).unwrap();

    // the declared name becomes the explore identity, the model stays
    // reachable through from
    assert_eq!(explore.name, "all_orders");
    assert_eq!(explore.args["from"], json!("orders"));
    assert_eq!(explore.import_name(), "orders");
    // and the default label follows the identity
    assert_eq!(explore.args["label"], json!("All Orders"));
}

#[test]
fn test_declared_label_is_kept() {
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
                    "config": {"meta": {"lookgen": {
                        "explore": {"label": "Order Book", "description": "Everything"}
                    }}}
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("explore-label", ViewLayout::Flat);

    let spec = generator.declared_explores().remove("orders").unwrap();
    let explore = generator.build_explore("orders", spec, &layout).unwrap();

    assert_eq!(explore.args["label"], json!("Order Book"));
    assert_eq!(explore.args["description"], json!("Everything"));
    assert!(explore.joins.is_empty());
}

#[test]
fn test_join_from_override_resolves_target_view() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "metadata": {"schema": "PROD", "name": "ORDERS"},
                    "columns": {"ID": {"type": "NUMBER", "name": "ID"}}
                },
                "model.analytics.customers": {
                    "metadata": {"schema": "PROD", "name": "DIM_CUSTOMERS"},
                    "columns": {"ID": {"type": "NUMBER", "name": "ID"}}
                }
            }
        }),
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "config": {"meta": {"lookgen": {
                        "explore": {"joins": [
                            {"name": "buyers", "from": "customers", "relationship": "many_to_one"}
                        ]}
                    }}}
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("join-from", ViewLayout::Flat);

    let spec = generator.declared_explores().remove("orders").unwrap();
    let explore = generator.build_explore("orders", spec, &layout).unwrap();

    let join = &explore.joins[0];
    assert_eq!(join.name, "buyers");
    assert_eq!(join.import_name(), "customers");
    assert_eq!(
        join.relative_path,
        Path::new("views/customers.view.lkml")
    );
}

#[test]
fn test_explore_file_includes_base_and_joined_views() {
    let project = sample_project();
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("explore-file", ViewLayout::Flat);

    let spec = generator.declared_explores().remove("orders").unwrap();
    let explore = generator.build_explore("orders", spec, &layout).unwrap();
    let file = generator.build_explore_file(explore, &layout).unwrap();

    assert_eq!(
        file.includes,
        vec![
            "/views/customers.view.lkml".to_string(),
            "/views/orders.view.lkml".to_string(),
        ]
    );
}

#[test]
fn test_model_export_lists_all_explores_sorted() {
    let project = project_with(
        json!({
            "nodes": {
                "model.analytics.orders": {
                    "metadata": {"schema": "PROD", "name": "ORDERS"},
                    "columns": {"ID": {"type": "NUMBER", "name": "ID"}}
                },
                "model.analytics.users": {
                    "metadata": {"schema": "PROD", "name": "USERS"},
                    "columns": {"ID": {"type": "NUMBER", "name": "ID"}}
                }
            }
        }),
        json!({
            "nodes": {
                "model.analytics.users": {
                    "config": {"meta": {"lookgen": {"explore": {}}}}
                },
                "model.analytics.orders": {
                    "config": {"meta": {"lookgen": {"explore": {"name": "all_orders"}}}}
                }
            }
        }),
    );
    let generator = Generator::new(&project, TypeMap::builtin());
    let layout = temp_layout("export", ViewLayout::Flat);

    let explores = generator.declared_explores();
    let export = generator.build_model_export("warehouse", &explores, &layout);

    assert_eq!(export.connection, "warehouse");
    // aliased explores are indexed under their declared identity
    assert_eq!(
        export.includes,
        vec![
            "/explores/all_orders.explore.lkml".to_string(),
            "/explores/users.explore.lkml".to_string(),
        ]
    );
}
