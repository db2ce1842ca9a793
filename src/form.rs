use minijinja::context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{RPPRequest, EDUCATION_LEVEL};
use crate::templates;

pub const SUBMIT_LABEL: &str = "Buat RPP & LKPD";
pub const BUSY_LABEL: &str = "Menyusun RPP Holistik...";

pub const DEFAULT_SEMESTER: &str = "Ganjil";
pub const DEFAULT_ACADEMIC_YEAR: &str = "2024/2025";
pub const DEFAULT_LEARNING_METHOD: &str = "Problem Based Learning (PBL)";

pub const GRADES: &[(&str, &str)] = &[
    ("10 (Fase E)", "Kelas 10 (Fase E)"),
    ("11 (Fase F)", "Kelas 11 (Fase F)"),
    ("12 (Fase F)", "Kelas 12 (Fase F)"),
];

pub const SEMESTERS: &[(&str, &str)] = &[("Ganjil", "Ganjil"), ("Genap", "Genap")];

pub const LEARNING_METHODS: &[(&str, &str)] = &[
    ("Problem Based Learning (PBL)", "Problem Based Learning (PBL)"),
    ("Project Based Learning (PjBL)", "Project Based Learning (PjBL)"),
    ("Discovery Learning", "Discovery Learning"),
    ("Inquiry Learning", "Inquiry Learning"),
    ("Cooperative Learning", "Cooperative Learning"),
    ("Pembelajaran Berdiferensiasi", "Pembelajaran Berdiferensiasi"),
    ("Teaching at the Right Level (TaRL)", "Teaching at the Right Level (TaRL)"),
];

/// Raw form submission. Every field is optional on the wire; blanks are
/// caught by [`FormInput::into_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormInput {
    pub school_name: String,
    pub teacher_name: String,
    pub subject: String,
    pub grade: String,
    pub semester: String,
    pub academic_year: String,
    pub time_allocation: String,
    pub learning_method: String,
    pub topic: String,
    pub cp: String,
    pub conditions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Select,
    Textarea,
}

pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub placeholder: &'static str,
    /// Fields with a default are not required.
    pub default: Option<&'static str>,
    pub options: &'static [(&'static str, &'static str)],
    pub value: fn(&FormInput) -> &str,
}

pub struct FieldGroup {
    pub legend: &'static str,
    pub fields: &'static [FieldSpec],
}

pub static FIELD_GROUPS: [FieldGroup; 2] = [
    FieldGroup {
        legend: "Identitas Perencanaan Pembelajaran",
        fields: &[
            FieldSpec {
                name: "schoolName",
                label: "Nama Sekolah",
                kind: FieldKind::Text,
                placeholder: "Contoh: SMA Negeri 1 Jakarta",
                default: None,
                options: &[],
                value: |f| f.school_name.as_str(),
            },
            FieldSpec {
                name: "teacherName",
                label: "Nama Penyusun",
                kind: FieldKind::Text,
                placeholder: "Nama Guru",
                default: None,
                options: &[],
                value: |f| f.teacher_name.as_str(),
            },
            FieldSpec {
                name: "subject",
                label: "Mata Pelajaran",
                kind: FieldKind::Text,
                placeholder: "Contoh: Biologi",
                default: None,
                options: &[],
                value: |f| f.subject.as_str(),
            },
            FieldSpec {
                name: "grade",
                label: "Kelas / Fase",
                kind: FieldKind::Select,
                placeholder: "Pilih Kelas",
                default: None,
                options: GRADES,
                value: |f| f.grade.as_str(),
            },
            FieldSpec {
                name: "semester",
                label: "Semester",
                kind: FieldKind::Select,
                placeholder: "",
                default: Some(DEFAULT_SEMESTER),
                options: SEMESTERS,
                value: |f| f.semester.as_str(),
            },
            FieldSpec {
                name: "academicYear",
                label: "Tahun Ajaran",
                kind: FieldKind::Text,
                placeholder: "2024/2025",
                default: Some(DEFAULT_ACADEMIC_YEAR),
                options: &[],
                value: |f| f.academic_year.as_str(),
            },
            FieldSpec {
                name: "timeAllocation",
                label: "Alokasi Waktu",
                kind: FieldKind::Text,
                placeholder: "Contoh: 2 JP x 45 Menit",
                default: None,
                options: &[],
                value: |f| f.time_allocation.as_str(),
            },
        ],
    },
    FieldGroup {
        legend: "Materi dan Model Pembelajaran",
        fields: &[
            FieldSpec {
                name: "learningMethod",
                label: "Model Pembelajaran",
                kind: FieldKind::Select,
                placeholder: "",
                default: Some(DEFAULT_LEARNING_METHOD),
                options: LEARNING_METHODS,
                value: |f| f.learning_method.as_str(),
            },
            FieldSpec {
                name: "topic",
                label: "Materi / Tema",
                kind: FieldKind::Text,
                placeholder: "Contoh: Perubahan Lingkungan",
                default: None,
                options: &[],
                value: |f| f.topic.as_str(),
            },
            FieldSpec {
                name: "cp",
                label: "Capaian Pembelajaran (CP)",
                kind: FieldKind::Textarea,
                placeholder: "Salin CP atau Tujuan Pembelajaran...",
                default: None,
                options: &[],
                value: |f| f.cp.as_str(),
            },
            FieldSpec {
                name: "conditions",
                label: "Kondisi Kelas",
                kind: FieldKind::Textarea,
                placeholder: "Contoh: Siswa aktif, suka visual, tersedia LCD Proyektor.",
                default: None,
                options: &[],
                value: |f| f.conditions.as_str(),
            },
        ],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Lengkapi isian berikut: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Pilihan {label} tidak dikenal: {value}")]
    UnknownOption { label: &'static str, value: String },
}

fn fields() -> impl Iterator<Item = &'static FieldSpec> {
    FIELD_GROUPS.iter().flat_map(|group| group.fields.iter())
}

impl FormInput {
    /// Draft that repopulates the form after a failed generation.
    pub fn from_request(request: &RPPRequest) -> Self {
        Self {
            school_name: request.school_name.clone(),
            teacher_name: request.teacher_name.clone(),
            subject: request.subject.clone(),
            grade: request.grade.clone(),
            semester: request.semester.clone(),
            academic_year: request.academic_year.clone(),
            time_allocation: request.time_allocation.clone(),
            learning_method: request.learning_method.clone(),
            topic: request.topic.clone(),
            cp: request.cp.clone(),
            conditions: request.conditions.clone(),
        }
    }

    pub fn into_request(self) -> Result<RPPRequest, FormError> {
        let missing: Vec<&'static str> = fields()
            .filter(|field| field.default.is_none() && (field.value)(&self).trim().is_empty())
            .map(|field| field.label)
            .collect();
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }

        for field in fields().filter(|field| !field.options.is_empty()) {
            let value = (field.value)(&self).trim();
            if !value.is_empty() && !field.options.iter().any(|(option, _)| *option == value) {
                return Err(FormError::UnknownOption {
                    label: field.label,
                    value: value.to_string(),
                });
            }
        }

        let or_default = |value: String, default: &str| {
            let value = value.trim();
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };

        Ok(RPPRequest {
            school_name: self.school_name.trim().to_string(),
            teacher_name: self.teacher_name.trim().to_string(),
            level: EDUCATION_LEVEL.to_string(),
            grade: self.grade.trim().to_string(),
            subject: self.subject.trim().to_string(),
            topic: self.topic.trim().to_string(),
            cp: self.cp.trim().to_string(),
            conditions: self.conditions.trim().to_string(),
            academic_year: or_default(self.academic_year, DEFAULT_ACADEMIC_YEAR),
            semester: or_default(self.semester, DEFAULT_SEMESTER),
            time_allocation: self.time_allocation.trim().to_string(),
            learning_method: or_default(self.learning_method, DEFAULT_LEARNING_METHOD),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
    pub placeholder: &'static str,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct GroupView {
    pub legend: &'static str,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub groups: Vec<GroupView>,
    pub loading: bool,
    pub submit_label: &'static str,
    pub busy_label: &'static str,
}

impl FormView {
    pub fn new(input: &FormInput, loading: bool) -> Self {
        let groups = FIELD_GROUPS
            .iter()
            .map(|group| GroupView {
                legend: group.legend,
                fields: group
                    .fields
                    .iter()
                    .map(|field| {
                        let value = (field.value)(input);
                        let value = match field.default {
                            Some(default) if value.trim().is_empty() => default,
                            _ => value,
                        };
                        FieldView {
                            name: field.name,
                            label: field.label,
                            kind: field.kind,
                            value: value.to_string(),
                            required: field.default.is_none(),
                            placeholder: field.placeholder,
                            options: field
                                .options
                                .iter()
                                .map(|&(value, label)| OptionView { value, label })
                                .collect(),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            groups,
            loading,
            submit_label: SUBMIT_LABEL,
            busy_label: BUSY_LABEL,
        }
    }
}

pub fn render_form_page(view: &FormView, error: Option<&str>) -> Result<String, minijinja::Error> {
    templates::render("form.html", context! { form => view, error => error })
}
