//! End-to-end runs over the library descriptor fixture.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use wasmbridge_core::collect::{collect_enums, collect_messages};
use wasmbridge_core::factory::json_factory;
use wasmbridge_core::filter::filter_packages;
use wasmbridge_core::resolve::resolve_package_references;
use wasmbridge_core::{
    build_generation_plan, DescriptorSet, Error, FilterCriteria, GeneratorConfig, ResolveError,
    TypeIndex,
};

fn fixture() -> DescriptorSet {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/descriptor.json");
    let text = fs::read_to_string(&path).expect("read fixture");
    DescriptorSet::from_json(&text).expect("parse fixture")
}

/// Criteria as the plugin would build them: defaults plus the request parameter.
fn request_criteria(set: &DescriptorSet, extra: &str) -> FilterCriteria {
    let mut config = GeneratorConfig::default();
    if let Some(parameter) = &set.parameter {
        config.apply_parameter(parameter).expect("request parameter");
    }
    config.apply_parameter(extra).expect("extra parameter");
    FilterCriteria::from_config(&config).expect("criteria")
}

#[test]
fn fixture_loads_with_annotations() {
    let set = fixture();
    assert_eq!(set.file.len(), 5);
    assert!(!set.file[0].generate, "timestamp.proto is only a dependency");
    assert!(set.file.iter().skip(1).all(|f| f.generate));

    let service_file = &set.file[4];
    let admin = &service_file.service[1];
    assert!(admin.annotations.excluded);
    let presenter = &service_file.service[2];
    assert!(presenter.annotations.browser_provided);
    assert_eq!(presenter.annotations.custom_name.as_deref(), Some("Presenter"));
    let fetch_cover = &service_file.service[0].method[4];
    assert!(fetch_cover.annotations.is_async);
}

#[test]
fn package_filter_drops_annotation_package() {
    let set = fixture();
    let criteria = request_criteria(&set, "");
    let outcome = filter_packages(&set.file, &criteria);

    let names: Vec<&str> = outcome.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["common.v1", "library.v1"]);
    assert_eq!(outcome.stats.total_packages, 3);
    assert_eq!(outcome.stats.included_packages, 2);
}

#[test]
fn full_plan_matches_fixture() -> anyhow::Result<()> {
    let set = fixture();
    let plan = build_generation_plan(&set, &request_criteria(&set, ""))?;

    assert_eq!(
        plan.stats.summary(),
        "Filtering Summary: 2/3 services, 4/7 methods, 6 messages, 3 enums from 2 packages"
    );

    let library = plan.package("library.v1").expect("library package");
    assert_eq!(library.filter.reason, "package has services, messages, enums");
    assert_eq!(library.js_namespace, "library_v1");
    assert_eq!(library.schema_registry_name, "libraryV1Schemas");
    assert_eq!(library.deserializer_name, "LibraryV1Deserializer");

    let services: Vec<(&str, &str)> = library
        .services
        .iter()
        .map(|s| (s.name.as_str(), s.js_name.as_str()))
        .collect();
    assert_eq!(
        services,
        vec![("LibraryService", "LibraryService"), ("PresenterService", "Presenter")]
    );
    assert!(library.services[1].browser_provided);

    let catalogue = &library.services[0];
    assert_eq!(catalogue.comment.as_deref(), Some("Catalogue access."));
    let methods: Vec<&str> = catalogue.methods.iter().map(|m| m.js_name.as_str()).collect();
    assert_eq!(methods, vec!["getBook", "listBooks", "loadCover"]);
    assert!(catalogue.methods[1].server_streaming);
    assert!(catalogue.methods[2].is_async);
    assert_eq!(catalogue.methods[0].comment.as_deref(), Some("Fetch a single book."));

    let messages: Vec<&str> = library.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(messages, vec!["Book", "Book_Chapter", "GetBookRequest"]);
    let enums: Vec<&str> = library.enums.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(enums, vec!["Genre", "Book_Format"]);
    assert_eq!(library.enums[0].values[1].comment.as_deref(), Some("Made up."));

    assert_eq!(library.counts.messages_found, 4);
    assert_eq!(library.counts.messages_kept, 3);
    assert_eq!(
        library.factory_methods,
        vec!["newBook", "newBook_Chapter", "newGetBookRequest"]
    );
    Ok(())
}

#[test]
fn cross_package_references_of_library() -> anyhow::Result<()> {
    let set = fixture();
    let plan = build_generation_plan(&set, &request_criteria(&set, ""))?;
    let library = plan.package("library.v1").expect("library package");

    assert_eq!(library.imports.len(), 1);
    let common = &library.imports[0];
    assert_eq!(common.package_name, "common.v1");
    assert_eq!(common.import_path, "../../common_v1");
    let types: Vec<&str> = common.types.iter().map(String::as_str).collect();
    assert_eq!(types, vec!["Label", "Person", "Status"]);

    assert_eq!(library.external_imports.len(), 1);
    let timestamp = &library.external_imports[0];
    assert_eq!(timestamp.proto_type, "google.protobuf.Timestamp");
    assert_eq!(timestamp.ts_type, "Date");
    assert!(timestamp.is_native);

    assert_eq!(library.factory_dependencies.len(), 1);
    let dependency = &library.factory_dependencies[0];
    assert_eq!(dependency.factory_name, "CommonV1Factory");
    assert_eq!(dependency.import_path, "../../common_v1/factory");
    assert_eq!(dependency.instance_name, "v1Factory");

    let common_plan = plan.package("common.v1").expect("common package");
    assert!(common_plan.imports.is_empty());
    assert!(common_plan.factory_dependencies.is_empty());
    Ok(())
}

#[test]
fn book_fields_describe_maps_and_oneofs() {
    let set = fixture();
    let index = TypeIndex::build(&set);
    let criteria = FilterCriteria::default();
    let files: Vec<_> = set.file.iter().filter(|f| f.package == "library.v1").collect();
    let messages = collect_messages(&files, &criteria, &index);
    let book = &messages.items[0];

    assert_eq!(book.comment.as_deref(), Some("A book in the catalogue."));
    assert_eq!(book.oneof_groups, vec!["edition"]);

    let labels = book.fields.iter().find(|f| f.name == "labels").expect("labels");
    assert!(labels.is_map);
    assert_eq!(labels.map_key_type.as_deref(), Some("string"));
    assert_eq!(labels.map_value_type.as_deref(), Some("Label"));

    let print_run = book.fields.iter().find(|f| f.name == "print_run").expect("print_run");
    assert_eq!(print_run.oneof_group.as_deref(), Some("edition"));
    assert_eq!(print_run.json_name, "printRun");
    assert_eq!(print_run.type_name, "int64");

    let enums = collect_enums(&files, &criteria);
    assert_eq!(enums.total_found, 2);
}

#[test]
fn factories_delegate_across_packages() -> anyhow::Result<()> {
    let set = fixture();
    let index = TypeIndex::build(&set);
    let criteria = FilterCriteria::default();
    let of_package = |package: &str| -> Vec<_> {
        set.file.iter().filter(|f| f.package == package).collect()
    };

    let common_messages = collect_messages(&of_package("common.v1"), &criteria, &index);
    let library_messages = collect_messages(&of_package("library.v1"), &criteria, &index);

    let mut library = json_factory("library.v1", &library_messages.items);
    library.add_dependency(Arc::new(json_factory("common.v1", &common_messages.items)));

    let person = library.create("common.v1.Person")?;
    assert_eq!(person, serde_json::json!({ "displayName": "", "home": null }));

    let book = library.create("library.v1.Book")?;
    assert_eq!(book["labels"], serde_json::json!({}));
    assert_eq!(book["chapters"], serde_json::json!([]));
    assert_eq!(book["printRun"], serde_json::Value::Null);

    let refs = resolve_package_references(
        "library.v1",
        &library_messages.items,
        &index,
        &criteria.type_mappings,
    );
    for type_name in &refs.foreign_messages {
        library.create(type_name)?;
    }
    assert!(refs.foreign_messages.contains("common.v1.Label"));

    let constructors = library.constructors();
    assert!(constructors.contains_key("common.v1.Person_Address"));
    assert!(constructors.contains_key("library.v1.Book_Chapter"));
    Ok(())
}

#[test]
fn client_filters_narrow_the_plan() -> anyhow::Result<()> {
    let set = fixture();
    let criteria = request_criteria(
        &set,
        "services=LibraryService,method_include=Get*,List*,method_rename=GetBook:fetchBook,exclude_nested_messages=true",
    );
    let plan = build_generation_plan(&set, &criteria)?;

    let library = plan.package("library.v1").expect("library package");
    assert_eq!(library.services.len(), 1);
    let methods: Vec<&str> = library.services[0].methods.iter().map(|m| m.js_name.as_str()).collect();
    assert_eq!(methods, vec!["fetchBook", "listBooks"]);

    let messages: Vec<&str> = library.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(messages, vec!["Book", "GetBookRequest"]);
    assert_eq!(
        plan.stats.summary(),
        "Filtering Summary: 1/3 services, 2/6 methods, 4 messages, 3 enums from 2 packages"
    );
    Ok(())
}

#[test]
fn nested_foreign_reference_needs_a_factory() {
    let mut set = fixture();
    // point Book.author at the nested address, then drop nested messages
    set.file[3].message_type[0].field[1].type_name = Some(".common.v1.Person.Address".to_string());
    let criteria = request_criteria(&set, "exclude_nested_messages=true");

    let err = build_generation_plan(&set, &criteria).unwrap_err();
    match err {
        Error::Resolve(ResolveError::UnknownType { type_name, method, .. }) => {
            assert_eq!(type_name, "common.v1.Person_Address");
            assert_eq!(method, "newPerson_Address");
        }
        other => panic!("unexpected error: {other}"),
    }
}
