#![allow(dead_code)]

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Value};

use rpp_generator::models::EDUCATION_LEVEL;
use rpp_generator::{RPPRequest, RPPResponse};

pub fn request() -> RPPRequest {
    RPPRequest {
        school_name: "SMA 1".into(),
        teacher_name: "Budi".into(),
        level: EDUCATION_LEVEL.into(),
        grade: "10 (Fase E)".into(),
        subject: "Biologi".into(),
        topic: "Ekosistem".into(),
        cp: "Peserta didik mampu menganalisis interaksi dalam ekosistem".into(),
        conditions: "Siswa aktif, tersedia LCD Proyektor".into(),
        academic_year: "2024-2025".into(),
        semester: "Ganjil".into(),
        time_allocation: "2 JP x 45 Menit".into(),
        learning_method: "Problem Based Learning (PBL)".into(),
    }
}

fn task(prefix: &str, questions: usize) -> Value {
    json!({
        "title": format!("{prefix} judul"),
        "instructions": format!("{prefix} petunjuk kerja kelompok"),
        "questions": (1..=questions).map(|i| format!("{prefix}-Q{i} pertanyaan")).collect::<Vec<_>>()
    })
}

/// Model output as the generation service returns it. Every list item
/// carries a unique prefix so its occurrences can be counted.
pub fn response_json() -> Value {
    json!({
        "topic_refined": "Interaksi Makhluk Hidup di Ekosistem Sungai",
        "graduate_profile_dimensions": ["DPL-1 Penalaran Kritis", "DPL-2 Kolaborasi", "DPL-3 Kreativitas"],
        "learning_objectives": ["TP-1 Mengidentifikasi komponen", "TP-2 Menganalisis rantai makanan"],
        "design_elements": {
            "pedagogical_practice": "Sintaks PBL lima langkah",
            "learning_partnership": "Dinas Lingkungan Hidup",
            "learning_environment": "Bantaran sungai sekolah",
            "digital_utilization": "Simulasi jaring makanan daring"
        },
        "learning_flow": [
            { "phase": "Memahami", "activity": "FLOW-1 Orientasi masalah pencemaran", "duration": "20 menit" },
            { "phase": "Mengaplikasi", "activity": "FLOW-2 Studi kasus sungai tercemar limbah", "duration": "50 menit" },
            { "phase": "Merefleksi", "activity": "FLOW-3 Jurnal refleksi", "duration": "20 menit" }
        ],
        "assessments": {
            "as_learning": ["ASL-1 Refleksi diri"],
            "for_learning": ["AFL-1 Observasi diskusi", "AFL-2 Umpan balik lisan"],
            "of_learning": ["AOL-1 Laporan studi kasus", "AOL-2 Tes tertulis", "AOL-3 Presentasi"]
        },
        "lkpd": {
            "title": "Menyelidiki Ekosistem Sungai",
            "activities": {
                "understand": task("UND", 2),
                "apply": task("APP", 3),
                "reflect": task("REF", 1)
            }
        }
    })
}

pub fn response() -> RPPResponse {
    RPPResponse::from_json(&response_json().to_string()).unwrap()
}

/// Body of a successful `generateContent` call wrapping `text`.
pub fn envelope(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: Option<String>,
    pub text: String,
}

pub fn document_part(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

/// Paragraphs of `word/document.xml` in order, tables included.
pub fn paragraphs(xml: &str) -> Vec<Paragraph> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<Paragraph> = None;

    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.name().as_ref() == b"w:p" => {
                current = Some(Paragraph { style: None, text: String::new() });
            }
            Event::Empty(e) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(Paragraph { style: None, text: String::new() });
            }
            Event::Empty(e) if e.name().as_ref() == b"w:pStyle" => {
                if let (Some(p), Some(attr)) = (current.as_mut(), e.try_get_attribute("w:val").unwrap()) {
                    p.style = Some(attr.unescape_value().unwrap().into_owned());
                }
            }
            Event::Empty(e) if e.name().as_ref() == b"w:br" => {
                if let Some(p) = current.as_mut() {
                    p.text.push('\n');
                }
            }
            Event::Text(t) => {
                if let Some(p) = current.as_mut() {
                    p.text.push_str(&t.unescape().unwrap());
                }
            }
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                if let Some(p) = current.take() {
                    paragraphs.push(p);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    paragraphs
}

pub fn docx_headings(paragraphs: &[Paragraph]) -> Vec<String> {
    paragraphs
        .iter()
        .filter(|p| matches!(p.style.as_deref(), Some("Heading1" | "Heading2" | "Heading3")))
        .map(|p| p.text.clone())
        .collect()
}

pub fn html_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#x2f;", "/")
        .replace("&amp;", "&")
}

/// Text of every element with the `doc-heading` class, in document order.
pub fn html_headings(html: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut rest = html;
    while let Some(pos) = rest.find("class=\"doc-heading") {
        rest = &rest[pos..];
        let start = rest.find('>').unwrap() + 1;
        let end = rest[start..].find("</h").unwrap() + start;
        headings.push(html_unescape(rest[start..end].trim()));
        rest = &rest[end..];
    }
    headings
}
