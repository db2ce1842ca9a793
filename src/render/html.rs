use minijinja::context;

use super::LessonDocument;
use crate::templates;

/// On-screen view of the lesson plan with the reset, download and print controls.
pub fn render_result_page(document: &LessonDocument) -> Result<String, minijinja::Error> {
    templates::render("result.html", context! { document => document })
}

/// Self-contained HTML file with the stylesheet inlined and no controls.
pub fn render_standalone(document: &LessonDocument) -> Result<String, minijinja::Error> {
    templates::render("standalone.html", context! { document => document })
}
