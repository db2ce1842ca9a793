use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::GenerationError;
use crate::models::{RPPRequest, RPPResponse};

/// Anything that can turn a request into lesson plan content.
#[async_trait]
pub trait LessonGenerator: Send + Sync {
    async fn generate(&self, request: &RPPRequest) -> Result<RPPResponse, GenerationError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl LessonGenerator for GeminiClient {
    async fn generate(&self, request: &RPPRequest) -> Result<RPPResponse, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(&request.learning_method),
                temperature: self.temperature,
            },
        };

        tracing::info!(model = %self.model, subject = %request.subject, "Requesting lesson plan");

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&text)?;
        let content = envelope.text().ok_or(GenerationError::EmptyResponse)?;

        let response = RPPResponse::from_json(&content)?;
        response.validate()?;

        tracing::info!(
            topic = %response.topic_refined,
            flow_entries = response.learning_flow.len(),
            "Lesson plan generated"
        );
        Ok(response)
    }
}

/// Natural-language instruction sent with every generation request.
pub fn build_prompt(data: &RPPRequest) -> String {
    let method = &data.learning_method;
    format!(
        "Bertindaklah sebagai Pakar Desain Pembelajaran Mendalam (Deep Learning) untuk jenjang {level}.
Susun Perencanaan Pembelajaran beserta LKPD dari data berikut.

INFORMASI SEKOLAH:
- Nama Sekolah: {school}
- Nama Penyusun: {teacher}
- Jenjang: {level}
- Mata Pelajaran: {subject}
- Kelas/Fase: {grade}
- Semester: {semester}
- Tahun Ajaran: {year}
- Alokasi Waktu: {time}

INFORMASI MATERI:
- Tema/Materi: {topic}
- Capaian Pembelajaran (CP): \"{cp}\"
- Kondisi Kelas/Siswa: \"{conditions}\"
- Model Pembelajaran: \"{method}\" (gunakan sintaks model ini)

TUGAS:
1. Tentukan Dimensi Profil Lulusan yang relevan.
2. Turunkan CP menjadi Tujuan Pembelajaran (TP) yang konkret.
3. Rancang Desain Pembelajaran empat pilar; Praktik Pedagogis mengikuti model {method}.
4. Susun Pengalaman Pembelajaran yang rinci, holistik, dan berbasis studi kasus mengikuti sintaks {method}.
5. Rancang Asesmen as, for, dan of learning.
6. Buat LKPD dengan tiga bagian: memahami, mengaplikasi, merefleksi.

PENGALAMAN PEMBELAJARAN:
- Urutan tahap tetap: Memahami (eksplorasi), Mengaplikasi (elaborasi/studi kasus), Merefleksi (evaluasi).
- Integrasikan langkah-langkah sintaks {method} di dalam deskripsi aktivitas.
- Memahami: aktivitas eksplorasi konsep.
- Mengaplikasi: WAJIB memuat STUDI KASUS KONKRET atau masalah dunia nyata yang dipecahkan siswa dengan sintaks {method}.
- Merefleksi: aktivitas metakognitif.

Keluarkan JSON yang sesuai skema secara ketat.",
        level = data.level,
        school = data.school_name,
        teacher = data.teacher_name,
        subject = data.subject,
        grade = data.grade,
        semester = data.semester,
        year = data.academic_year,
        time = data.time_allocation,
        topic = data.topic,
        cp = data.cp,
        conditions = data.conditions,
        method = method,
    )
}

fn lkpd_task_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "instructions": { "type": "STRING" },
            "questions": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["title", "instructions", "questions"]
    })
}

/// Structured-output schema requested from the model. Mirrors [`RPPResponse`].
pub fn response_schema(learning_method: &str) -> Value {
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    json!({
        "type": "OBJECT",
        "properties": {
            "topic_refined": { "type": "STRING", "description": "Judul materi yang spesifik" },
            "graduate_profile_dimensions": string_list,
            "learning_objectives": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Tujuan Pembelajaran yang diturunkan dari CP"
            },
            "design_elements": {
                "type": "OBJECT",
                "properties": {
                    "pedagogical_practice": {
                        "type": "STRING",
                        "description": format!("Strategi pengajaran dengan model {learning_method}")
                    },
                    "learning_partnership": { "type": "STRING" },
                    "learning_environment": { "type": "STRING" },
                    "digital_utilization": { "type": "STRING" }
                },
                "required": [
                    "pedagogical_practice",
                    "learning_partnership",
                    "learning_environment",
                    "digital_utilization"
                ]
            },
            "learning_flow": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "phase": { "type": "STRING", "enum": ["Memahami", "Mengaplikasi", "Merefleksi"] },
                        "activity": {
                            "type": "STRING",
                            "description": format!("Aktivitas rinci dengan sintaks {learning_method} dan studi kasus")
                        },
                        "duration": { "type": "STRING" }
                    },
                    "required": ["phase", "activity", "duration"]
                }
            },
            "assessments": {
                "type": "OBJECT",
                "properties": {
                    "as_learning": string_list,
                    "for_learning": string_list,
                    "of_learning": string_list
                },
                "required": ["as_learning", "for_learning", "of_learning"]
            },
            "lkpd": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING", "description": "Judul LKPD" },
                    "activities": {
                        "type": "OBJECT",
                        "properties": {
                            "understand": lkpd_task_schema(),
                            "apply": lkpd_task_schema(),
                            "reflect": lkpd_task_schema()
                        },
                        "required": ["understand", "apply", "reflect"]
                    }
                },
                "required": ["title", "activities"]
            }
        },
        "required": [
            "topic_refined",
            "graduate_profile_dimensions",
            "learning_objectives",
            "design_elements",
            "learning_flow",
            "assessments",
            "lkpd"
        ]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
