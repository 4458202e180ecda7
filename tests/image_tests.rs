mod common;

use common::*;
use serde_json::json;
use valuer::{AssemblyRequest, ConfigStore, DataSource, DataUri, FlowState, ImageSlot, SchemaModel, TemplateInput};

const EMU_PER_PX: u64 = 9525;

fn photo_store(lines: &[&str]) -> valuer::InMemoryConfigStore {
    let store = residential_store();
    store.add(TEMPLATE_KEY, docx_lines(lines)).unwrap();
    store
        .add_json(
            IMAGE_CONFIG_KEY,
            &json!([
                { "placeholder": "front_photo", "cardName": "Front", "width": 100 },
                { "placeholder": "rear_photo", "width": "40px", "height": "30px" },
                { "placeholder": "site_plan", "width": 0, "height": null }
            ]),
        )
        .unwrap();
    store
}

fn request() -> AssemblyRequest {
    AssemblyRequest::new(SCHEMA_KEY, TemplateInput::Key(TEMPLATE_KEY.to_string()))
        .with_image_config(IMAGE_CONFIG_KEY)
        .with_source(DataSource::draft(json!({ "owner": { "ownerName": "Jane" } })))
}

#[test]
fn images_are_sized_from_the_table_and_the_image() -> TestResult {
    let store = photo_store(&["{%front_photo}", "{%rear_photo}", "{%site_plan}", "Owner: [ownerName]"]);
    let report = assembler(store).assemble(
        request()
            .with_image("front_photo", PNG_2X1.to_vec())
            .with_image("rear_photo", PNG_2X1.to_vec())
            .with_image("site_plan", PNG_2X1.to_vec()),
    )?;
    let body = GeneratedDocx::from_report(&report)?.document();

    // Width only: height follows the 2:1 aspect ratio.
    assert!(body.contains(&format!(r#"cx="{}" cy="{}""#, 100 * EMU_PER_PX, 50 * EMU_PER_PX)));
    // Both given: used as-is.
    assert!(body.contains(&format!(r#"cx="{}" cy="{}""#, 40 * EMU_PER_PX, 30 * EMU_PER_PX)));
    // Neither: the image's own size.
    assert!(body.contains(&format!(r#"cx="{}" cy="{}""#, 2 * EMU_PER_PX, EMU_PER_PX)));

    assert_eq!(report.result.images_replaced_count, 3);
    assert_eq!(report.result.replacements_count, 4);
    assert_eq!(report.result.text_replacements(), 1);
    Ok(())
}

#[test]
fn one_bad_image_is_reported_and_the_rest_render() -> TestResult {
    init_logging();
    let store = photo_store(&["{%front_photo}", "{%rear_photo}", "{%site_plan}", "Owner: [ownerName]"]);
    let report = assembler(store).assemble(
        request()
            .with_image("front_photo", PNG_2X1.to_vec())
            .with_image("rear_photo", b"definitely not an image".to_vec())
            .with_image("site_plan", PNG_2X1.to_vec()),
    )?;
    let mut docx = GeneratedDocx::from_report(&report)?;
    let body = docx.document();

    assert_eq!(report.result.images_replaced_count, 2);
    assert_eq!(report.image_errors.len(), 1);
    assert_eq!(report.image_errors[0].placeholder.as_str(), "rear_photo");
    assert_eq!(body.matches("<w:drawing>").count(), 2);
    assert!(!body.contains("rear_photo"));
    assert!(body.contains("Owner: Jane"));
    assert_eq!(report.transitions.last(), Some(&FlowState::Done));
    Ok(())
}

#[test]
fn base64_and_data_uri_images_are_decoded() -> TestResult {
    let store = photo_store(&["{%front_photo}", "{%rear_photo}"]);
    let uri = DataUri::encode("image/png", PNG_2X1);
    let bare = uri.split_once(',').map(|(_, b64)| b64.to_string()).ok_or("not a data-URI")?;

    let report = assembler(store).assemble(request().with_image("front_photo", uri).with_image("rear_photo", bare))?;

    assert_eq!(report.result.images_replaced_count, 2);
    assert!(report.image_errors.is_empty());
    Ok(())
}

#[test]
fn empty_image_input_is_a_decode_error() -> TestResult {
    let store = photo_store(&["{%front_photo}"]);
    let report = assembler(store).assemble(request().with_image("front_photo", ""))?;

    assert_eq!(report.result.images_replaced_count, 0);
    assert_eq!(report.image_errors.len(), 1);
    assert!(!GeneratedDocx::from_report(&report)?.document().contains("front_photo"));
    Ok(())
}

#[test]
fn package_is_wired_for_embedded_media() -> TestResult {
    let store = photo_store(&["{%front_photo}"]);
    let report = assembler(store).assemble(request().with_image("front_photo", PNG_2X1.to_vec()))?;
    let mut docx = GeneratedDocx::from_report(&report)?;

    assert!(docx.has_part("word/media/valuer_image1.png"));
    let rels = docx.part("word/_rels/document.xml.rels").ok_or("no relationships part")?;
    assert!(rels.contains(r#"Target="media/valuer_image1.png""#));
    let types = docx.part("[Content_Types].xml").ok_or("no content types")?;
    assert!(types.contains(r#"Extension="png""#));
    Ok(())
}

#[test]
fn malformed_image_table_fails_loading() {
    let store = residential_store();
    store.add(IMAGE_CONFIG_KEY, b"{ not json".to_vec()).unwrap();

    let failure = assembler(store).assemble(request()).unwrap_err();

    assert_eq!(failure.failed_in, FlowState::LoadingInputs);
    assert_eq!(failure.error.kind(), "config_load");
}

#[test]
fn re_rendering_merged_data_matches_assembly() -> TestResult {
    let lines = ["{%front_photo}", "{%rear_photo}", "Owner: [ownerName]"];
    let assembler = assembler(photo_store(&lines));
    let request = request()
        .with_image("front_photo", PNG_2X1.to_vec())
        .with_image("rear_photo", PNG_2X1.to_vec());
    let images = request.images.clone();
    let report = assembler.assemble(request)?;

    let model = SchemaModel::parse(&residential_schema())?;
    let slots: Vec<ImageSlot> = serde_json::from_slice(&assembler.store().read_document(IMAGE_CONFIG_KEY)?)?;
    let outcome = assembler.render_merged(&model, &docx_lines(&lines), &report.merged, &slots, &images)?;

    assert_eq!(outcome.result.document_bytes, report.result.document_bytes);
    assert_eq!(outcome.result.replacements_count, report.result.replacements_count);
    let body = GeneratedDocx::from_bytes(outcome.result.document_bytes)?.document();
    assert!(body.contains(&format!(r#"cx="{}" cy="{}""#, 100 * EMU_PER_PX, 50 * EMU_PER_PX)));
    Ok(())
}
