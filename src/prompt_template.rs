use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

/// Templates compiled into the binary, by file name
const PROMPTS: &[(&str, &str)] = &[
    ("loop.md", include_str!("prompts/loop.md")),
    ("bash.md", include_str!("prompts/bash.md")),
    ("ptc.md", include_str!("prompts/ptc.md")),
];

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered.trim_end().to_string())
}

/// Render one of the bundled prompt templates
pub fn load_prompt_file<T: Serialize>(name: &str, context_data: &T) -> Result<String, TeraError> {
    let template = PROMPTS
        .iter()
        .find(|(file, _)| *file == name)
        .map(|(_, template)| *template)
        .ok_or_else(|| TeraError::msg(format!("Unknown prompt template: {}", name)))?;
    load_prompt(template, context_data)
}
