use std::sync::LazyLock;

use minijinja::Environment;
use serde::Serialize;

const TEMPLATES: [(&str, &str); 7] = [
    ("layout.html", include_str!("../templates/layout.html")),
    ("form.html", include_str!("../templates/form.html")),
    ("result.html", include_str!("../templates/result.html")),
    ("lesson.html", include_str!("../templates/lesson.html")),
    ("standalone.html", include_str!("../templates/standalone.html")),
    ("notice.html", include_str!("../templates/notice.html")),
    // inlined into standalone documents, served from /static otherwise
    ("style.css", include_str!("../static/style.css")),
];

/// Template environment with the page templates compiled in. `.html`
/// templates are auto-escaped.
pub fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

static ENVIRONMENT: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        // a broken template surfaces as "template not found" when rendered
        if let Err(err) = env.add_template(name, source) {
            tracing::error!(template = name, error = %err, "Template failed to compile");
        }
    }
    env
});

pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<String, minijinja::Error> {
    ENVIRONMENT.get_template(name)?.render(ctx)
}
