//! Minimal WordprocessingML writer for the lesson plan export.
//!
//! A DOCX file is a ZIP archive of XML parts. Only the parts Word needs to
//! open the file are written: content types, package relationships, the
//! main document and its styles.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Block, LessonDocument, Section};
use crate::error::ExportError;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

// A4 with 1" margins, in twentieths of a point
const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const MARGIN: u32 = 1440;
const TEXT_WIDTH: u32 = PAGE_WIDTH - 2 * MARGIN;

const HEADER_FILL: &str = "E0E0E0";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="60" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="26"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading3">
    <w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="200" w:after="100"/><w:outlineLvl w:val="2"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="24"/></w:rPr>
  </w:style>
</w:styles>"#;

type XmlResult = Result<(), ExportError>;

#[derive(Debug, Default, Clone, Copy)]
struct Para<'a> {
    style: Option<&'a str>,
    align: Option<&'a str>,
    bottom_border: Option<&'a str>,
    before: Option<u32>,
    after: Option<u32>,
}

impl<'a> Para<'a> {
    fn styled(style: &'a str) -> Self {
        Self { style: Some(style), ..Self::default() }
    }

    fn centered() -> Self {
        Self { align: Some("center"), ..Self::default() }
    }

    fn is_plain(&self) -> bool {
        self.style.is_none()
            && self.align.is_none()
            && self.bottom_border.is_none()
            && self.before.is_none()
            && self.after.is_none()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Run {
    bold: bool,
    italic: bool,
}

const PLAIN: Run = Run { bold: false, italic: false };
const BOLD: Run = Run { bold: true, italic: false };
const ITALIC: Run = Run { bold: false, italic: true };

struct Body {
    xml: Writer<Vec<u8>>,
}

impl Body {
    fn new() -> Self {
        Self { xml: Writer::new(Vec::new()) }
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> XmlResult {
        let mut element = BytesStart::new(name);
        for &attr in attrs {
            element.push_attribute(attr);
        }
        self.xml.write_event(Event::Start(element))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> XmlResult {
        let mut element = BytesStart::new(name);
        for &attr in attrs {
            element.push_attribute(attr);
        }
        self.xml.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> XmlResult {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn run(&mut self, text: &str, run: Run) -> XmlResult {
        self.start("w:r", &[])?;
        if run.bold || run.italic {
            self.start("w:rPr", &[])?;
            if run.bold {
                self.empty("w:b", &[])?;
            }
            if run.italic {
                self.empty("w:i", &[])?;
            }
            self.end("w:rPr")?;
        }
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                self.empty("w:br", &[])?;
            }
            self.start("w:t", &[("xml:space", "preserve")])?;
            self.xml
                .write_event(Event::Text(BytesText::new(line.trim_end_matches('\r'))))?;
            self.end("w:t")?;
        }
        self.end("w:r")
    }

    fn paragraph(&mut self, para: Para<'_>, runs: &[(&str, Run)]) -> XmlResult {
        self.start("w:p", &[])?;
        if !para.is_plain() {
            self.start("w:pPr", &[])?;
            if let Some(style) = para.style {
                self.empty("w:pStyle", &[("w:val", style)])?;
            }
            if let Some(border) = para.bottom_border {
                self.start("w:pBdr", &[])?;
                self.empty(
                    "w:bottom",
                    &[("w:val", border), ("w:sz", "6"), ("w:space", "1"), ("w:color", "auto")],
                )?;
                self.end("w:pBdr")?;
            }
            if para.before.is_some() || para.after.is_some() {
                let before = para.before.map(|v| v.to_string());
                let after = para.after.map(|v| v.to_string());
                let mut attrs = Vec::new();
                if let Some(before) = before.as_deref() {
                    attrs.push(("w:before", before));
                }
                if let Some(after) = after.as_deref() {
                    attrs.push(("w:after", after));
                }
                self.empty("w:spacing", &attrs)?;
            }
            if let Some(align) = para.align {
                self.empty("w:jc", &[("w:val", align)])?;
            }
            self.end("w:pPr")?;
        }
        for &(text, run) in runs {
            self.run(text, run)?;
        }
        self.end("w:p")
    }

    fn text(&mut self, para: Para<'_>, text: &str, run: Run) -> XmlResult {
        self.paragraph(para, &[(text, run)])
    }

    fn spacer(&mut self) -> XmlResult {
        self.paragraph(Para::default(), &[])
    }

    fn page_break(&mut self) -> XmlResult {
        self.start("w:p", &[])?;
        self.start("w:r", &[])?;
        self.empty("w:br", &[("w:type", "page")])?;
        self.end("w:r")?;
        self.end("w:p")
    }

    /// Widths are percentages of the text area.
    fn table_start(&mut self, widths: &[u32], bordered: bool) -> XmlResult {
        self.start("w:tbl", &[])?;
        self.start("w:tblPr", &[])?;
        self.empty("w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
        self.start("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            if bordered {
                self.empty(
                    side,
                    &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
                )?;
            } else {
                self.empty(side, &[("w:val", "nil")])?;
            }
        }
        self.end("w:tblBorders")?;
        self.end("w:tblPr")?;

        self.start("w:tblGrid", &[])?;
        for pct in widths {
            let width = (TEXT_WIDTH * pct / 100).to_string();
            self.empty("w:gridCol", &[("w:w", &width)])?;
        }
        self.end("w:tblGrid")
    }

    fn table_end(&mut self) -> XmlResult {
        self.end("w:tbl")?;
        // keeps consecutive tables from merging
        self.spacer()
    }

    fn row_start(&mut self, header: bool) -> XmlResult {
        self.start("w:tr", &[])?;
        if header {
            self.start("w:trPr", &[])?;
            self.empty("w:tblHeader", &[])?;
            self.end("w:trPr")?;
        }
        Ok(())
    }

    fn cell_start(&mut self, width_pct: u32, fill: Option<&str>) -> XmlResult {
        let width = (width_pct * 50).to_string();
        self.start("w:tc", &[])?;
        self.start("w:tcPr", &[])?;
        self.empty("w:tcW", &[("w:w", &width), ("w:type", "pct")])?;
        if let Some(fill) = fill {
            self.empty("w:shd", &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill)])?;
        }
        self.end("w:tcPr")
    }

    fn text_cell(&mut self, width_pct: u32, fill: Option<&str>, text: &str, run: Run) -> XmlResult {
        self.cell_start(width_pct, fill)?;
        self.text(Para::default(), text, run)?;
        self.end("w:tc")
    }

    fn bullets(&mut self, items: &[String]) -> XmlResult {
        for item in items {
            self.text(Para::default(), &format!("\u{2022} {item}"), PLAIN)?;
        }
        Ok(())
    }

    fn section(&mut self, section: &Section) -> XmlResult {
        if let Some(heading) = &section.heading {
            self.text(Para::styled("Heading2"), heading, PLAIN)?;
        }
        for block in &section.blocks {
            self.block(block)?;
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> XmlResult {
        match block {
            Block::Title { title, subtitle } => {
                self.text(Para { style: Some("Heading1"), ..Para::centered() }, title, PLAIN)?;
                self.text(Para { after: Some(300), ..Para::centered() }, subtitle, BOLD)?;
            }
            Block::Identity { rows } => {
                self.table_start(&[25, 75], false)?;
                for row in rows {
                    self.row_start(false)?;
                    self.text_cell(25, None, &row.label, BOLD)?;
                    self.text_cell(75, None, &format!(": {}", row.text), PLAIN)?;
                    self.end("w:tr")?;
                }
                self.table_end()?;
            }
            Block::Tags { label, items } | Block::BulletList { label, items } => {
                self.text(Para { after: Some(100), ..Para::default() }, &format!("{label}:"), BOLD)?;
                self.bullets(items)?;
                self.spacer()?;
            }
            Block::DesignElements { items } => {
                self.table_start(&[30, 70], true)?;
                for item in items {
                    self.row_start(false)?;
                    self.text_cell(30, Some(HEADER_FILL), &item.label, BOLD)?;
                    self.text_cell(70, None, &item.text, PLAIN)?;
                    self.end("w:tr")?;
                }
                self.table_end()?;
            }
            Block::Flow { columns, entries } => {
                let widths = [20, 65, 15];
                self.table_start(&widths, true)?;
                self.row_start(true)?;
                for (column, width) in columns.iter().zip(widths) {
                    self.text_cell(width, Some(HEADER_FILL), column, BOLD)?;
                }
                self.end("w:tr")?;
                for entry in entries {
                    self.row_start(false)?;
                    self.text_cell(20, None, &entry.phase, BOLD)?;
                    self.text_cell(65, None, &entry.activity, PLAIN)?;
                    self.text_cell(15, None, &entry.duration, PLAIN)?;
                    self.end("w:tr")?;
                }
                self.table_end()?;
            }
            Block::Assessment { columns, rows } => {
                self.table_start(&[30, 70], true)?;
                self.row_start(true)?;
                self.text_cell(30, Some(HEADER_FILL), &columns[0], BOLD)?;
                self.text_cell(70, Some(HEADER_FILL), &columns[1], BOLD)?;
                self.end("w:tr")?;
                for row in rows {
                    self.row_start(false)?;
                    self.cell_start(30, None)?;
                    self.text(Para::default(), &row.label, BOLD)?;
                    self.text(Para::default(), &row.hint, ITALIC)?;
                    self.end("w:tc")?;
                    self.cell_start(70, None)?;
                    if row.items.is_empty() {
                        self.spacer()?;
                    } else {
                        self.bullets(&row.items)?;
                    }
                    self.end("w:tc")?;
                    self.end("w:tr")?;
                }
                self.table_end()?;
            }
            Block::Signatures { left, right } => {
                self.table_start(&[50, 50], false)?;
                self.row_start(false)?;
                for lines in [left, right] {
                    self.cell_start(50, None)?;
                    for (idx, line) in lines.iter().enumerate() {
                        let mut para = Para::centered();
                        if idx + 1 == lines.len() {
                            // room for the signature
                            para.before = Some(800);
                        }
                        self.text(para, line, PLAIN)?;
                    }
                    if lines.is_empty() {
                        self.spacer()?;
                    }
                    self.end("w:tc")?;
                }
                self.end("w:tr")?;
                self.table_end()?;
            }
            Block::WorksheetHeader { heading, title, meta } => {
                self.text(Para { style: Some("Heading1"), ..Para::centered() }, heading, PLAIN)?;
                self.text(Para { style: Some("Heading2"), ..Para::centered() }, title, PLAIN)?;
                self.text(Para { after: Some(300), ..Para::centered() }, meta, PLAIN)?;
            }
            Block::StudentIdentity { lines } => {
                self.table_start(&[100], true)?;
                for line in lines {
                    self.row_start(false)?;
                    self.cell_start(100, None)?;
                    self.text(Para { before: Some(100), after: Some(100), ..Para::default() }, line, PLAIN)?;
                    self.end("w:tc")?;
                    self.end("w:tr")?;
                }
                self.table_end()?;
            }
            Block::Task { heading, instructions, questions, answer_lines } => {
                self.text(
                    Para { bottom_border: Some("single"), ..Para::styled("Heading3") },
                    heading,
                    PLAIN,
                )?;
                self.text(Para { after: Some(100), ..Para::default() }, instructions, ITALIC)?;
                for (idx, question) in questions.iter().enumerate() {
                    self.text(
                        Para { before: Some(100), ..Para::default() },
                        &format!("{}. {}", idx + 1, question),
                        PLAIN,
                    )?;
                    for _ in 0..*answer_lines {
                        self.paragraph(
                            Para { bottom_border: Some("dotted"), before: Some(200), ..Para::default() },
                            &[],
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn section_properties(&mut self) -> XmlResult {
        let width = PAGE_WIDTH.to_string();
        let height = PAGE_HEIGHT.to_string();
        let margin = MARGIN.to_string();
        self.start("w:sectPr", &[])?;
        self.empty("w:pgSz", &[("w:w", &width), ("w:h", &height)])?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", &margin),
                ("w:right", &margin),
                ("w:bottom", &margin),
                ("w:left", &margin),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ],
        )?;
        self.end("w:sectPr")
    }
}

/// `word/document.xml`: lesson plan, page break, worksheet.
pub fn document_xml(document: &LessonDocument) -> Result<Vec<u8>, ExportError> {
    let mut body = Body::new();
    body.xml
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    body.start("w:document", &[("xmlns:w", W_NS)])?;
    body.start("w:body", &[])?;

    for section in &document.lesson_plan {
        body.section(section)?;
    }
    body.page_break()?;
    for section in &document.worksheet {
        body.section(section)?;
    }

    body.section_properties()?;
    body.end("w:body")?;
    body.end("w:document")?;
    Ok(body.xml.into_inner())
}

pub fn build_docx(document: &LessonDocument) -> Result<Vec<u8>, ExportError> {
    let document_part = document_xml(document)?;

    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("word/styles.xml", STYLES.as_bytes()),
        ("word/document.xml", &document_part),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in parts {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }
    let cursor = zip.finish()?;

    tracing::debug!(file = %document.file_name, bytes = cursor.get_ref().len(), "DOCX assembled");
    Ok(cursor.into_inner())
}
