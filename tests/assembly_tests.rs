mod common;

use common::*;
use serde_json::json;
use valuer::{
    AssemblyConfig, AssemblyError, AssemblyRequest, DataSource, DataUri, DOCX_MIME, FieldPath, FieldStatus,
    FilesystemConfigStore, FlowState, InMemoryConfigStore, RenderStage, ReportAssembler, TemplateInput,
};

fn request() -> AssemblyRequest {
    AssemblyRequest::new(SCHEMA_KEY, TemplateInput::Key(TEMPLATE_KEY.to_string()))
}

fn full_path() -> Vec<FlowState> {
    vec![
        FlowState::Idle,
        FlowState::LoadingInputs,
        FlowState::Validating,
        FlowState::Merging,
        FlowState::Mapping,
        FlowState::Rendering,
        FlowState::Done,
    ]
}

#[test]
fn ranked_sources_fill_the_template() -> TestResult {
    init_logging();
    let request = request()
        .with_source(DataSource::draft(json!({
            "owner": { "ownerName": "N/A" },
            "property": { "address": "1 Main St" }
        })))
        .with_source(DataSource::extracted(json!({
            "owner": { "ownerName": "Jane Doe" },
            "property": { "address": "somewhere else", "landArea": 650, "description": "Brick house\r\nTiled roof" },
            "valuation": { "marketValue": 850000 },
            "comparableSales": [ { "address": "3 Elm St", "price": 800000 } ]
        })));

    let report = assembler(residential_store()).assemble(request)?;
    let mut docx = GeneratedDocx::from_report(&report)?;
    let body = docx.document();

    assert!(body.contains("Owner: Jane Doe"));
    assert!(body.contains("Address: 1 Main St"));
    assert!(body.contains("Land: 650 m2"));
    assert!(body.contains("Value: 850000"));
    assert!(body.contains("1. 3 Elm St 800000"));
    assert!(body.contains("Brick house</w:t><w:br/><w:t xml:space=\"preserve\">Tiled roof"));
    assert!(!body.contains('['));

    // Seven non-empty leaves; the second comparable row is empty.
    assert_eq!(report.result.replacements_count, 7);
    assert_eq!(report.result.images_replaced_count, 0);
    assert_eq!(report.merged.source_of(&FieldPath::parse("owner.ownerName")), Some("extracted"));
    assert_eq!(report.merged.source_of(&FieldPath::parse("property.address")), Some("draft"));
    assert_eq!(report.transitions, full_path());
    assert!(report.warnings.is_empty());
    Ok(())
}

#[test]
fn higher_priority_list_replaces_lower_one() -> TestResult {
    let request = request()
        .with_source(DataSource::draft(json!({
            "comparableSales": [ { "address": "Kept", "price": 1 } ]
        })))
        .with_source(DataSource::extracted(json!({
            "comparableSales": [
                { "address": "Dropped A", "price": 2 },
                { "address": "Dropped B", "price": 3 }
            ]
        })));

    let report = assembler(residential_store()).assemble(request)?;
    let body = GeneratedDocx::from_report(&report)?.document();

    assert!(body.contains("1. Kept 1"));
    assert!(!body.contains("Dropped"));
    let rows = report.merged.get(&FieldPath::parse("comparableSales")).and_then(|v| v.as_array());
    assert_eq!(rows.map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn empty_leaves_render_blank_and_are_not_counted() -> TestResult {
    let report = assembler(residential_store()).assemble(request().with_source(DataSource::draft(json!({
        "owner": { "ownerName": "" },
        "property": { "address": "N/A" }
    }))))?;

    assert_eq!(report.result.replacements_count, 0);
    let body = GeneratedDocx::from_report(&report)?.document();
    assert!(body.contains(r#"<w:t xml:space="preserve">Owner: </w:t>"#));

    // The required owner is only reported once the merge left it empty.
    let required: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.path == FieldPath::parse("owner.ownerName"))
        .collect();
    assert_eq!(required.len(), 1);
    assert_eq!(required[0].source, None);
    assert!(matches!(required[0].status, FieldStatus::Constraint(_)));
    Ok(())
}

#[test]
fn source_findings_name_their_source() -> TestResult {
    let report = assembler(residential_store()).assemble(
        request()
            .with_source(DataSource::draft(json!({ "property": { "landArea": "quite large" } })))
            .with_source(DataSource::extracted(json!({ "owner": { "ownerName": "Jane" } }))),
    )?;

    let finding = report
        .warnings
        .iter()
        .find(|w| w.path == FieldPath::parse("property.landArea"))
        .ok_or("no finding for landArea")?;
    assert_eq!(finding.source.as_deref(), Some("draft"));
    assert!(matches!(finding.status, FieldStatus::WrongKind { .. }));
    Ok(())
}

#[test]
fn unknown_template_token_fails_rendering_and_keeps_progress() {
    init_logging();
    let store = residential_store();
    store
        .add(TEMPLATE_KEY, docx_lines(&["Owner: [ownerName]", "Owner again: [ownerNmae]"]))
        .unwrap();

    let failure = assembler(store)
        .assemble(request().with_source(DataSource::draft(json!({
            "owner": { "ownerName": "Jane" },
            "property": { "address": "1 Main St" }
        }))))
        .unwrap_err();

    assert_eq!(failure.failed_in, FlowState::Rendering);
    assert_eq!(failure.error.placeholder(), Some("ownerNmae"));
    match &failure.error {
        AssemblyError::Render(e) => assert_eq!(e.stage, RenderStage::Text),
        other => panic!("expected a render error, got {other:?}"),
    }
    assert_eq!(failure.progress.text_replacements, 2);
    assert_eq!(failure.transitions.last(), Some(&FlowState::Failed));
    assert!(failure.to_string().contains("rendering"));
}

#[test]
fn lenient_assembler_blanks_unknown_tokens() -> TestResult {
    let store = residential_store();
    store.add(TEMPLATE_KEY, docx_lines(&["Owner: [ownerName]", "Signed: [valuer_name]"]))?;
    let assembler = ReportAssembler::builder()
        .with_store(store)
        .with_strict_unknown_tokens(false)
        .build();

    let report = assembler.assemble(request().with_source(DataSource::draft(json!({ "owner": { "ownerName": "Jane" } }))))?;

    assert_eq!(report.unknown_tokens, vec!["valuer_name".to_string()]);
    let body = GeneratedDocx::from_report(&report)?.document();
    assert!(body.contains("Owner: Jane"));
    assert!(!body.contains("valuer_name"));
    Ok(())
}

#[test]
fn missing_schema_fails_while_loading() {
    let store = InMemoryConfigStore::new();
    store.add(TEMPLATE_KEY, residential_template()).unwrap();

    let failure = assembler(store).assemble(request()).unwrap_err();

    assert_eq!(failure.failed_in, FlowState::LoadingInputs);
    assert_eq!(failure.error.kind(), "config_load");
    assert_eq!(
        failure.transitions,
        vec![FlowState::Idle, FlowState::LoadingInputs, FlowState::Failed]
    );
    assert_eq!(failure.progress.text_replacements, 0);
}

#[test]
fn non_object_schema_is_rejected() {
    let store = InMemoryConfigStore::new();
    store.add_json(SCHEMA_KEY, &json!(["not", "a", "schema"])).unwrap();
    store.add(TEMPLATE_KEY, residential_template()).unwrap();

    let failure = assembler(store).assemble(request()).unwrap_err();

    assert_eq!(failure.failed_in, FlowState::LoadingInputs);
    assert!(matches!(failure.error, AssemblyError::Schema(_)));
}

#[test]
fn broken_schema_nodes_are_reported_not_fatal() -> TestResult {
    let store = InMemoryConfigStore::new();
    store.add_json(
        SCHEMA_KEY,
        &json!({
            "ownerName": { "label": "Owner", "placeholder": "ownerName" },
            "oops": 42
        }),
    )?;
    store.add(TEMPLATE_KEY, docx_lines(&["[ownerName]"]))?;

    let report = assembler(store).assemble(request().with_source(DataSource::draft(json!({ "ownerName": "Jane" }))))?;

    assert_eq!(report.schema_issues.len(), 1);
    assert_eq!(report.schema_issues[0].path, FieldPath::parse("oops"));
    assert_eq!(report.result.replacements_count, 1);
    Ok(())
}

#[test]
fn rendering_the_same_request_twice_is_byte_identical() -> TestResult {
    let assembler = assembler(residential_store());
    let make = || {
        request().with_source(DataSource::draft(json!({
            "owner": { "ownerName": "Jane" },
            "comparableSales": [ { "address": "3 Elm St", "price": 1 } ]
        })))
    };

    let first = assembler.assemble(make())?;
    let second = assembler.assemble(make())?;

    assert_eq!(first.result.document_bytes, second.result.document_bytes);
    Ok(())
}

#[test]
fn inline_data_uri_templates_are_accepted() -> TestResult {
    let store = InMemoryConfigStore::new();
    store.add_json(SCHEMA_KEY, &residential_schema())?;
    let template = DataUri::encode(DOCX_MIME, &docx_lines(&["Owner: [ownerName]"]));

    let report = assembler(store).assemble(
        AssemblyRequest::new(SCHEMA_KEY, TemplateInput::Inline(template.into_bytes()))
            .with_source(DataSource::draft(json!({ "owner": { "ownerName": "Jane" } }))),
    )?;

    assert!(GeneratedDocx::from_report(&report)?.document().contains("Owner: Jane"));
    assert!(report.result.to_data_uri().starts_with("data:application/vnd.openxmlformats"));
    Ok(())
}

#[test]
fn filesystem_store_serves_configuration_documents() -> TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("schemas"))?;
    std::fs::create_dir_all(dir.path().join("templates"))?;
    std::fs::write(dir.path().join(SCHEMA_KEY), serde_json::to_vec(&residential_schema())?)?;
    std::fs::write(dir.path().join(TEMPLATE_KEY), residential_template())?;

    let assembler = ReportAssembler::builder()
        .with_store(FilesystemConfigStore::new(dir.path()))
        .build();
    let report = assembler.assemble(request().with_source(DataSource::draft(json!({ "owner": { "ownerName": "Jane" } }))))?;
    assert!(GeneratedDocx::from_report(&report)?.document().contains("Owner: Jane"));

    let escaped = assembler
        .assemble(AssemblyRequest::new("../outside.json", TemplateInput::Key(TEMPLATE_KEY.to_string())))
        .unwrap_err();
    assert_eq!(escaped.error.kind(), "config_load");
    Ok(())
}

#[test]
fn batches_come_back_in_request_order() -> TestResult {
    let assembler = ReportAssembler::builder()
        .with_store(residential_store())
        .with_config(AssemblyConfig::default())
        .with_workers(3)
        .build();
    let owners = ["Ann", "Bob", "Cy", "Di", "Ed", "Flo"];
    let requests = owners
        .iter()
        .map(|owner| request().with_source(DataSource::draft(json!({ "owner": { "ownerName": owner } }))))
        .collect();

    let results = assembler.assemble_all(requests);

    assert_eq!(results.len(), owners.len());
    for (owner, result) in owners.iter().zip(results) {
        let report = result?;
        assert!(GeneratedDocx::from_report(&report)?.document().contains(&format!("Owner: {owner}")));
    }
    Ok(())
}
