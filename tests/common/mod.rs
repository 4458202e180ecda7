#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::{Cursor, Read, Write};
use valuer::{AssemblyReport, InMemoryConfigStore, ReportAssembler};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const SCHEMA_KEY: &str = "schemas/residential.json";
pub const TEMPLATE_KEY: &str = "templates/residential.docx";
pub const IMAGE_CONFIG_KEY: &str = "images/residential.json";

/// A 2x1 RGB PNG.
pub const PNG_2X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
    0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x7B, 0x40, 0xE8, 0xDD, 0x00, 0x00, 0x00,
    0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0xF8, 0xCF, 0x00, 0x04, 0xFF, 0x01, 0x07, 0x00, 0x01, 0xFF,
    0xE2, 0x23, 0x9E, 0x59, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// Wrapper around a rendered package with helper methods
pub struct GeneratedDocx {
    pub bytes: Vec<u8>,
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl GeneratedDocx {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let archive = ZipArchive::new(Cursor::new(bytes.clone()))?;
        Ok(Self { bytes, archive })
    }

    pub fn from_report(report: &AssemblyReport) -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_bytes(report.result.document_bytes.clone())
    }

    /// A part's contents, or `None` if the package has no such part.
    pub fn part(&mut self, name: &str) -> Option<String> {
        let mut file = self.archive.by_name(name).ok()?;
        let mut out = String::new();
        file.read_to_string(&mut out).ok()?;
        Some(out)
    }

    pub fn document(&mut self) -> String {
        self.part("word/document.xml").unwrap_or_default()
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Save the package to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{name}.docx"), &self.bytes)
    }
}

/// Routes engine log output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One run holding `text` verbatim.
pub fn run(text: &str) -> String {
    format!("<w:r><w:t>{text}</w:t></w:r>")
}

/// A minimal Word package whose body holds one paragraph per entry.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs.iter().map(|p| format!("<w:p>{p}</w:p>")).collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in [("[Content_Types].xml", CONTENT_TYPES), ("word/document.xml", document.as_str())] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A one-paragraph-per-line template.
pub fn docx_lines(lines: &[&str]) -> Vec<u8> {
    let runs: Vec<String> = lines.iter().map(|line| run(line)).collect();
    let refs: Vec<&str> = runs.iter().map(String::as_str).collect();
    docx(&refs)
}

/// A residential valuation schema with sections, a repeated section and a
/// required numeric field.
pub fn residential_schema() -> Value {
    json!({
        "property": {
            "address": { "label": "Property address", "placeholder": "[address]" },
            "landArea": { "label": "Land area", "placeholder": "land_area", "validation": "area" },
            "description": { "label": "Description", "placeholder": "description" }
        },
        "owner": {
            "ownerName": { "label": "Owner", "placeholder": "ownerName", "validation": { "required": true } }
        },
        "valuation": {
            "marketValue": { "label": "Market value", "placeholder": "market_value", "type": "number" }
        },
        "comparableSales": {
            "$repeat": {
                "address": { "label": "Address", "placeholder": "comp_address" },
                "price": { "label": "Price", "placeholder": "comp_price", "type": "number" }
            },
            "$slots": 2
        }
    })
}

/// A template that uses every token of [`residential_schema`].
pub fn residential_template() -> Vec<u8> {
    docx_lines(&[
        "Address: [address]",
        "Land: [land_area] m2",
        "[description]",
        "Owner: [ownerName]",
        "Value: [market_value]",
        "1. [comp_address_1] [comp_price_1]",
        "2. [comp_address_2] [comp_price_2]",
    ])
}

/// A store holding the residential schema and template.
pub fn residential_store() -> InMemoryConfigStore {
    let store = InMemoryConfigStore::new();
    store.add_json(SCHEMA_KEY, &residential_schema()).unwrap();
    store.add(TEMPLATE_KEY, residential_template()).unwrap();
    store
}

pub fn assembler(store: InMemoryConfigStore) -> ReportAssembler {
    ReportAssembler::builder().with_store(store).build()
}
