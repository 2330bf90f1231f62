use minijinja::Environment;
use serde::Serialize;

use crate::error::AppResult;

/// 页面模板（编译期嵌入）
const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("lesson_plan.html", include_str!("../../templates/lesson_plan.html")),
    ("test_questions.html", include_str!("../../templates/test_questions.html")),
    ("help.html", include_str!("../../templates/help.html")),
];

pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> AppResult<Self> {
        let mut env = Environment::new();
        env.set_debug(cfg!(debug_assertions));
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, template_name: &str, context: S) -> AppResult<String> {
        let template = self.env.get_template(template_name)?;
        Ok(template.render(context)?)
    }
}
