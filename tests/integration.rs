use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pretty_assertions::assert_eq;

use examparse::core::model::QuestionRecord;
use examparse::parser::{ParserTrack, PdfReader, PdftotextWords};
use examparse::parser::layout_builder::ParserLayoutBuilder;
use examparse::pipeline::{
    build_questions, ensure_tool, export_questions, PipelineConfig, REQUIRED_TOOLS,
};
use examparse::OutputMode;

const PAGE_ONE: &str = r"
0 0 0 RG 306 40 m 306 752 l S
BT /F1 10 Tf 40 692 Td (1. Quanto vale x?) Tj 0 -14 Td (a\) um) Tj 0 -14 Td (b\) dois) Tj ET
BT /F1 10 Tf 330 692 Td (2. Segunda pergunta?) Tj ET
q 0.612 0.157 0.69 rg 40 560 200 80 re f 350 560 200 80 re f Q
BT /F1 10 Tf 60 600 Td (FIGURA) Tj ET
";

const PAGE_TWO: &str = r"
0 0 0 RG 306 40 m 306 752 l S
BT /F1 10 Tf 40 700 Td (3. Terceira) Tj ET
BT /F1 10 Tf 330 700 Td (4. Quarta) Tj ET
BT /F1 10 Tf 330 400 Td (5. Quinta) Tj ET
q 0.612 0.157 0.69 rg 350 100 200 80 re f Q
";

/// Two Letter-sized pages sharing a Helvetica font resource.
fn build_exam(path: &Path) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for content in [PAGE_ONE, PAGE_TWO] {
        let content_id = doc.add_object(Stream::new(
            lopdf::Dictionary::new(),
            content.trim().as_bytes().to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2_i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

fn poppler_available() -> bool {
    REQUIRED_TOOLS.iter().all(|tool| ensure_tool(tool).is_ok())
}

fn exam_in(dir: &Path) -> Result<PathBuf> {
    let input = dir.join("prova.pdf");
    build_exam(&input)?;
    Ok(input)
}

#[test]
fn test_words_from_synthetic_exam() -> Result<()> {
    if !poppler_available() {
        eprintln!("Skipping test: poppler-utils (pdftotext, pdftoppm) not installed");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let input = exam_in(dir.path())?;

    let track = ParserLayoutBuilder::new(PdfReader::new(input)?, PdftotextWords::new());
    assert_eq!(track.page_count(), 2);

    let page = track.analyze_page(0)?;
    assert_eq!(page.width, 612.0);
    assert!(page.segments.iter().any(|s| s.x0 == 306.0));
    let texts: Vec<&str> = page.words.iter().map(|w| w.text.as_str()).collect();
    assert!(texts.contains(&"Quanto"));
    assert!(texts.contains(&"FIGURA"));
    Ok(())
}

#[test]
fn test_full_pipeline_with_synthetic_exam() -> Result<()> {
    if !poppler_available() {
        eprintln!("Skipping test: poppler-utils (pdftotext, pdftoppm) not installed");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let input = exam_in(dir.path())?;
    let config = PipelineConfig::new(input, None);
    assert_eq!(config.output, dir.path().join("prova_output.json"));

    let records = build_questions(&config)?;

    let numbers: Vec<u32> = records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(records[0].statement, "<p>Quanto vale x?</p>");
    assert_eq!(records[0].alternatives["alternativa_a"], "<p>um</p>");
    assert_eq!(records[0].alternatives["alternativa_b"], "<p>dois</p>");
    assert!(records[0].has_image(), "left region belongs to question 1");
    assert!(records[1].has_image(), "right region belongs to question 2");
    assert!(!records[4].has_image(), "page two region is outside every window");
    assert!(records.iter().filter(|r| r.has_image()).count() <= 3);

    // text painted inside a marker is erased before the text is read
    assert!(records
        .iter()
        .all(|r| !r.statement.contains("FIGURA")
            && r.alternatives.values().all(|v| !v.contains("FIGURA"))));

    export_questions(&records, &config.output)?;
    assert!(config.output.exists(), "JSON output should exist");
    Ok(())
}

#[test]
fn test_plain_mode_has_no_images() -> Result<()> {
    if !poppler_available() {
        eprintln!("Skipping test: poppler-utils (pdftotext, pdftoppm) not installed");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let mut config = PipelineConfig::new(exam_in(dir.path())?, None);
    config.mode = OutputMode::Plain;
    config.max_questions = 3;

    let records = build_questions(&config)?;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].statement, "Quanto vale x?");
    assert!(records.iter().all(|r| r.image.is_empty()));
    Ok(())
}

#[test]
fn test_json_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("questions.json");

    let mut alternatives = IndexMap::new();
    alternatives.insert("alternativa_c".to_string(), "<p>Três</p>".to_string());
    alternatives.insert("alternativa_a".to_string(), "<p>Um</p>".to_string());
    let records = vec![
        QuestionRecord {
            number: 12,
            statement: "<p>Observe a função f(x) = x²</p>".to_string(),
            image: "iVBORw0KGgo=".to_string(),
            alternatives,
            correct_alternative: String::new(),
        },
        QuestionRecord {
            number: 13,
            statement: "Dissertativa".to_string(),
            image: String::new(),
            alternatives: IndexMap::new(),
            correct_alternative: String::new(),
        },
    ];

    export_questions(&records, &output)?;
    let raw = fs::read_to_string(&output)?;
    assert!(raw.contains("x²"), "non-ASCII stays literal");
    assert!(raw.contains("\"alternativa_correta\": \"\""));

    let loaded: Vec<QuestionRecord> = serde_json::from_str(&raw)?;
    assert_eq!(loaded, records);
    assert_eq!(
        loaded[0].alternatives.keys().collect::<Vec<_>>(),
        vec!["alternativa_c", "alternativa_a"]
    );
    Ok(())
}
