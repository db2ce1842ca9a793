//! Lesson plan document shared by the HTML view and the DOCX export.
//!
//! [`LessonDocument::build`] is the only traversal of [`RPPResponse`]. Both
//! serializers walk its sections in order, so a field added to one of the
//! tables below shows up in both outputs.

pub mod docx;
pub mod html;

use serde::Serialize;

use crate::models::{Assessments, DesignElements, LkpdActivities, LkpdTask, Phase, RPPRequest, RPPResponse};

pub const LESSON_PLAN_TITLE: &str = "RENCANA PELAKSANAAN PEMBELAJARAN (RPP)";
pub const LESSON_PLAN_SUBTITLE: &str = "PENDEKATAN DEEP LEARNING";
pub const WORKSHEET_TITLE: &str = "LEMBAR KERJA PESERTA DIDIK (LKPD)";
const BLANK_LINE: &str = "______________________";

pub struct IdentityRow {
    pub label: &'static str,
    pub value: fn(&RPPRequest, &RPPResponse) -> String,
}

pub const IDENTITY_ROWS: [IdentityRow; 8] = [
    IdentityRow { label: "Nama Sekolah", value: |req, _| req.school_name.clone() },
    IdentityRow { label: "Nama Penyusun", value: |req, _| req.teacher_name.clone() },
    IdentityRow { label: "Mata Pelajaran", value: |req, _| req.subject.clone() },
    IdentityRow { label: "Kelas / Fase", value: |req, _| req.grade.clone() },
    IdentityRow {
        label: "Tahun Ajaran",
        value: |req, _| format!("{} (Semester {})", req.academic_year, req.semester),
    },
    IdentityRow { label: "Alokasi Waktu", value: |req, _| req.time_allocation.clone() },
    IdentityRow { label: "Model Pembelajaran", value: |req, _| req.learning_method.clone() },
    IdentityRow { label: "Materi / Tema", value: |_, resp| resp.topic_refined.clone() },
];

pub struct DesignElementRow {
    pub label: &'static str,
    pub text: fn(&DesignElements) -> &str,
}

pub const DESIGN_ELEMENTS: [DesignElementRow; 4] = [
    DesignElementRow { label: "Praktik Pedagogis", text: |d| d.pedagogical_practice.as_str() },
    DesignElementRow { label: "Kemitraan Pembelajaran", text: |d| d.learning_partnership.as_str() },
    DesignElementRow { label: "Lingkungan Pembelajaran", text: |d| d.learning_environment.as_str() },
    DesignElementRow { label: "Pemanfaatan Digital", text: |d| d.digital_utilization.as_str() },
];

pub struct AssessmentKind {
    pub label: &'static str,
    pub hint: &'static str,
    pub items: fn(&Assessments) -> &[String],
}

pub const ASSESSMENT_ROWS: [AssessmentKind; 3] = [
    AssessmentKind {
        label: "Assessment AS Learning",
        hint: "Penilaian diri dan sejawat",
        items: |a| a.as_learning.as_slice(),
    },
    AssessmentKind {
        label: "Assessment FOR Learning",
        hint: "Umpan balik dan proses",
        items: |a| a.for_learning.as_slice(),
    },
    AssessmentKind {
        label: "Assessment OF Learning",
        hint: "Pencapaian hasil",
        items: |a| a.of_learning.as_slice(),
    },
];

pub struct WorksheetTask {
    pub letter: char,
    pub phase: Phase,
    /// Blank answer lines after each question.
    pub answer_lines: usize,
    pub task: fn(&LkpdActivities) -> &LkpdTask,
}

pub const WORKSHEET_TASKS: [WorksheetTask; 3] = [
    WorksheetTask { letter: 'A', phase: Phase::Memahami, answer_lines: 2, task: |a| &a.understand },
    WorksheetTask { letter: 'B', phase: Phase::Mengaplikasi, answer_lines: 3, task: |a| &a.apply },
    WorksheetTask { letter: 'C', phase: Phase::Merefleksi, answer_lines: 2, task: |a| &a.reflect },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledText {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEntry {
    pub phase: String,
    pub duration: String,
    pub activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentRow {
    pub label: String,
    pub hint: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Title {
        title: String,
        subtitle: String,
    },
    Identity {
        rows: Vec<LabeledText>,
    },
    Tags {
        label: String,
        items: Vec<String>,
    },
    BulletList {
        label: String,
        items: Vec<String>,
    },
    DesignElements {
        items: Vec<LabeledText>,
    },
    Flow {
        columns: [String; 3],
        entries: Vec<FlowEntry>,
    },
    Assessment {
        columns: [String; 2],
        rows: Vec<AssessmentRow>,
    },
    Signatures {
        left: Vec<String>,
        right: Vec<String>,
    },
    WorksheetHeader {
        heading: String,
        title: String,
        meta: String,
    },
    StudentIdentity {
        lines: Vec<String>,
    },
    Task {
        heading: String,
        instructions: String,
        questions: Vec<String>,
        answer_lines: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonDocument {
    pub file_name: String,
    /// Everything before the page break.
    pub lesson_plan: Vec<Section>,
    /// Everything after the page break.
    pub worksheet: Vec<Section>,
}

struct SectionSpec {
    heading: Option<&'static str>,
    build: fn(&RPPRequest, &RPPResponse) -> Vec<Block>,
}

const LESSON_PLAN: &[SectionSpec] = &[
    SectionSpec { heading: None, build: title_and_identity },
    SectionSpec { heading: Some("I. IDENTIFIKASI"), build: identification },
    SectionSpec { heading: Some("II. DESAIN PEMBELAJARAN"), build: learning_design },
    SectionSpec {
        heading: Some("III. PENGALAMAN PEMBELAJARAN (HOLISTIK DAN STUDI KASUS)"),
        build: learning_experience,
    },
    SectionSpec { heading: Some("IV. ASESMEN PEMBELAJARAN"), build: assessment },
    SectionSpec { heading: None, build: signatures },
];

const WORKSHEET: &[SectionSpec] = &[
    SectionSpec { heading: None, build: worksheet_header },
    SectionSpec { heading: None, build: worksheet_tasks },
];

fn title_and_identity(req: &RPPRequest, resp: &RPPResponse) -> Vec<Block> {
    vec![
        Block::Title {
            title: LESSON_PLAN_TITLE.to_string(),
            subtitle: LESSON_PLAN_SUBTITLE.to_string(),
        },
        Block::Identity {
            rows: IDENTITY_ROWS
                .iter()
                .map(|row| LabeledText {
                    label: row.label.to_string(),
                    text: (row.value)(req, resp),
                })
                .collect(),
        },
    ]
}

fn identification(_: &RPPRequest, resp: &RPPResponse) -> Vec<Block> {
    vec![Block::Tags {
        label: "Dimensi Profil Lulusan".to_string(),
        items: resp.graduate_profile_dimensions.clone(),
    }]
}

fn learning_design(_: &RPPRequest, resp: &RPPResponse) -> Vec<Block> {
    vec![
        Block::BulletList {
            label: "Tujuan Pembelajaran".to_string(),
            items: resp.learning_objectives.clone(),
        },
        Block::DesignElements {
            items: DESIGN_ELEMENTS
                .iter()
                .map(|row| LabeledText {
                    label: row.label.to_string(),
                    text: (row.text)(&resp.design_elements).to_string(),
                })
                .collect(),
        },
    ]
}

fn learning_experience(_: &RPPRequest, resp: &RPPResponse) -> Vec<Block> {
    // array order, whatever the phase order is
    let entries = resp
        .learning_flow
        .iter()
        .map(|flow| FlowEntry {
            phase: flow.phase.to_string(),
            duration: flow.duration.clone(),
            activity: flow.activity.clone(),
        })
        .collect();

    vec![Block::Flow {
        columns: [
            "Tahapan".to_string(),
            "Deskripsi Aktivitas Pembelajaran".to_string(),
            "Waktu".to_string(),
        ],
        entries,
    }]
}

fn assessment(_: &RPPRequest, resp: &RPPResponse) -> Vec<Block> {
    vec![Block::Assessment {
        columns: ["Jenis Asesmen".to_string(), "Teknik dan Instrumen".to_string()],
        rows: ASSESSMENT_ROWS
            .iter()
            .map(|kind| AssessmentRow {
                label: kind.label.to_string(),
                hint: kind.hint.to_string(),
                items: (kind.items)(&resp.assessments).to_vec(),
            })
            .collect(),
    }]
}

fn signatures(req: &RPPRequest, _: &RPPResponse) -> Vec<Block> {
    let teacher = if req.teacher_name.trim().is_empty() {
        BLANK_LINE.to_string()
    } else {
        req.teacher_name.clone()
    };

    vec![Block::Signatures {
        left: vec![
            "Mengetahui,".to_string(),
            "Kepala Sekolah".to_string(),
            BLANK_LINE.to_string(),
        ],
        right: vec![
            "".to_string(),
            format!("Guru {}", req.subject),
            teacher,
        ],
    }]
}

fn worksheet_header(req: &RPPRequest, resp: &RPPResponse) -> Vec<Block> {
    vec![
        Block::WorksheetHeader {
            heading: WORKSHEET_TITLE.to_string(),
            title: resp.lkpd.title.clone(),
            meta: format!("Mapel: {} | Kelas: {}", req.subject, req.grade),
        },
        Block::StudentIdentity {
            lines: vec![
                "Nama Kelompok / Siswa : ___________________________________".to_string(),
                "Tanggal : ___________________________________".to_string(),
            ],
        },
    ]
}

fn worksheet_tasks(_: &RPPRequest, resp: &RPPResponse) -> Vec<Block> {
    WORKSHEET_TASKS
        .iter()
        .map(|spec| {
            let task = (spec.task)(&resp.lkpd.activities);
            Block::Task {
                heading: format!(
                    "{}. FASE {}: {}",
                    spec.letter,
                    spec.phase.as_str().to_uppercase(),
                    task.title
                ),
                instructions: task.instructions.clone(),
                questions: task.questions.clone(),
                answer_lines: spec.answer_lines,
            }
        })
        .collect()
}

fn build_sections(specs: &[SectionSpec], req: &RPPRequest, resp: &RPPResponse) -> Vec<Section> {
    specs
        .iter()
        .map(|spec| Section {
            heading: spec.heading.map(str::to_string),
            blocks: (spec.build)(req, resp),
        })
        .collect()
}

/// `RPP-DeepLearning-<subject>.docx`
pub fn export_file_name(subject: &str) -> String {
    format!("RPP-DeepLearning-{}.docx", subject.trim())
}

impl LessonDocument {
    pub fn build(req: &RPPRequest, resp: &RPPResponse) -> Self {
        Self {
            file_name: export_file_name(&req.subject),
            lesson_plan: build_sections(LESSON_PLAN, req, resp),
            worksheet: build_sections(WORKSHEET, req, resp),
        }
    }

    /// Every heading in document order, as both serializers emit them.
    pub fn headings(&self) -> Vec<String> {
        let mut headings = Vec::new();
        for section in self.lesson_plan.iter().chain(self.worksheet.iter()) {
            if let Some(heading) = &section.heading {
                headings.push(heading.clone());
            }
            for block in &section.blocks {
                match block {
                    Block::Title { title, .. } => headings.push(title.clone()),
                    Block::WorksheetHeader { heading, title, .. } => {
                        headings.push(heading.clone());
                        headings.push(title.clone());
                    }
                    Block::Task { heading, .. } => headings.push(heading.clone()),
                    _ => {}
                }
            }
        }
        headings
    }

    pub fn identity_rows(&self) -> &[LabeledText] {
        self.lesson_plan
            .iter()
            .flat_map(|section| section.blocks.iter())
            .find_map(|block| match block {
                Block::Identity { rows } => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LearningFlow, Lkpd};

    fn task(title: &str, questions: usize) -> LkpdTask {
        LkpdTask {
            title: title.into(),
            instructions: format!("Petunjuk {title}"),
            questions: (1..=questions).map(|i| format!("{title} soal {i}")).collect(),
        }
    }

    fn fixture() -> (RPPRequest, RPPResponse) {
        let request = RPPRequest {
            school_name: "SMA 1".into(),
            teacher_name: "Budi".into(),
            level: crate::models::EDUCATION_LEVEL.into(),
            grade: "10 (Fase E)".into(),
            subject: "Biologi".into(),
            topic: "Ekosistem".into(),
            cp: "...".into(),
            conditions: "...".into(),
            academic_year: "2024/2025".into(),
            semester: "Ganjil".into(),
            time_allocation: "2 JP".into(),
            learning_method: "Problem Based Learning (PBL)".into(),
        };
        let response = RPPResponse {
            topic_refined: "Ekosistem Sungai".into(),
            graduate_profile_dimensions: vec!["Kolaborasi".into()],
            learning_objectives: vec!["Menganalisis".into(), "Menyimpulkan".into()],
            design_elements: DesignElements {
                pedagogical_practice: "PBL".into(),
                learning_partnership: "Orang tua".into(),
                learning_environment: "Kelas".into(),
                digital_utilization: "Video".into(),
            },
            learning_flow: vec![
                LearningFlow { phase: Phase::Merefleksi, activity: "Jurnal".into(), duration: "10'".into() },
                LearningFlow { phase: Phase::Memahami, activity: "Baca".into(), duration: "20'".into() },
            ],
            assessments: Assessments {
                as_learning: vec!["Refleksi".into()],
                for_learning: vec![],
                of_learning: vec!["Tes".into(), "Produk".into()],
            },
            lkpd: Lkpd {
                title: "Lembar Ekosistem".into(),
                activities: LkpdActivities {
                    understand: task("Pahami", 2),
                    apply: task("Terapkan", 1),
                    reflect: task("Renungkan", 3),
                },
            },
        };
        (request, response)
    }

    #[test]
    fn identity_has_eight_rows_in_fixed_order() {
        let (req, resp) = fixture();
        let doc = LessonDocument::build(&req, &resp);
        let labels: Vec<&str> = doc.identity_rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Nama Sekolah",
                "Nama Penyusun",
                "Mata Pelajaran",
                "Kelas / Fase",
                "Tahun Ajaran",
                "Alokasi Waktu",
                "Model Pembelajaran",
                "Materi / Tema",
            ]
        );
        assert_eq!(doc.identity_rows()[4].text, "2024/2025 (Semester Ganjil)");
        assert_eq!(doc.identity_rows()[7].text, "Ekosistem Sungai");
    }

    #[test]
    fn flow_keeps_array_order() {
        let (req, resp) = fixture();
        let doc = LessonDocument::build(&req, &resp);
        let entries = doc
            .lesson_plan
            .iter()
            .flat_map(|s| s.blocks.iter())
            .find_map(|b| match b {
                Block::Flow { entries, .. } => Some(entries.clone()),
                _ => None,
            })
            .unwrap();
        let phases: Vec<&str> = entries.iter().map(|e| e.phase.as_str()).collect();
        assert_eq!(phases, vec!["Merefleksi", "Memahami"]);
    }

    #[test]
    fn headings_follow_fixed_order() {
        let (req, resp) = fixture();
        let doc = LessonDocument::build(&req, &resp);
        assert_eq!(
            doc.headings(),
            vec![
                LESSON_PLAN_TITLE.to_string(),
                "I. IDENTIFIKASI".to_string(),
                "II. DESAIN PEMBELAJARAN".to_string(),
                "III. PENGALAMAN PEMBELAJARAN (HOLISTIK DAN STUDI KASUS)".to_string(),
                "IV. ASESMEN PEMBELAJARAN".to_string(),
                WORKSHEET_TITLE.to_string(),
                "Lembar Ekosistem".to_string(),
                "A. FASE MEMAHAMI: Pahami".to_string(),
                "B. FASE MENGAPLIKASI: Terapkan".to_string(),
                "C. FASE MEREFLEKSI: Renungkan".to_string(),
            ]
        );
    }

    #[test]
    fn assessment_rows_keep_list_lengths() {
        let (req, resp) = fixture();
        let doc = LessonDocument::build(&req, &resp);
        let rows = doc
            .lesson_plan
            .iter()
            .flat_map(|s| s.blocks.iter())
            .find_map(|b| match b {
                Block::Assessment { rows, .. } => Some(rows.clone()),
                _ => None,
            })
            .unwrap();
        let lengths: Vec<usize> = rows.iter().map(|r| r.items.len()).collect();
        assert_eq!(lengths, vec![1, 0, 2]);
    }

    #[test]
    fn file_name_uses_subject() {
        assert_eq!(export_file_name(" Biologi "), "RPP-DeepLearning-Biologi.docx");
    }
}
