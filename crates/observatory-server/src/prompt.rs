//! Prompt template loading and rendering via `minijinja`.
//!
//! The simplify-text function renders two templates: `system` (fixed
//! instructions) and `simplify` (the event being rewritten). Built-in
//! copies are compiled in; a `templates_dir` in the `llm` config section
//! replaces them from disk so operators can tune wording without a
//! rebuild.

use std::path::Path;

use minijinja::Environment;
use serde::Serialize;

use crate::llm::ChatPrompt;

const BUILTIN_SYSTEM: &str = include_str!("../templates/system.j2");
const BUILTIN_SIMPLIFY: &str = include_str!("../templates/simplify.j2");

/// Errors from loading or rendering templates.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// A template file could not be read.
    #[error("failed to read template {path}: {source}")]
    Read {
        /// File that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A template failed to parse or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Context for the `simplify` template.
#[derive(Debug, Serialize)]
pub struct SimplifyContext<'a> {
    /// Event headline.
    pub title: &'a str,
    /// Event narrative.
    pub content: &'a str,
    /// Event type tag.
    pub event_type: &'a str,
}

/// Holds the compiled prompt templates.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Engine using the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if a built-in template fails to
    /// parse.
    pub fn builtin() -> Result<Self, PromptError> {
        Self::from_sources(BUILTIN_SYSTEM.to_owned(), BUILTIN_SIMPLIFY.to_owned())
    }

    /// Engine loading `system.j2` and `simplify.j2` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Read`] if a file is missing or
    /// [`PromptError::Template`] if it fails to parse.
    pub fn from_dir(dir: &Path) -> Result<Self, PromptError> {
        Self::from_sources(
            load_template(dir, "system.j2")?,
            load_template(dir, "simplify.j2")?,
        )
    }

    fn from_sources(system: String, simplify: String) -> Result<Self, PromptError> {
        let mut env = Environment::new();
        env.add_template_owned("system", system)?;
        env.add_template_owned("simplify", simplify)?;
        Ok(Self { env })
    }

    /// Render the prompt pair for one event.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if rendering fails.
    pub fn render(&self, ctx: &SimplifyContext<'_>) -> Result<ChatPrompt, PromptError> {
        let system = self.env.get_template("system")?.render(ctx)?;
        let user = self.env.get_template("simplify")?.render(ctx)?;
        Ok(ChatPrompt {
            system: system.trim().to_owned(),
            user: user.trim().to_owned(),
        })
    }
}

fn load_template(dir: &Path, filename: &str) -> Result<String, PromptError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path).map_err(|source| PromptError::Read {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_render_event_fields() {
        let engine = PromptEngine::builtin();
        assert!(engine.is_ok());
        let prompt = engine.and_then(|e| {
            e.render(&SimplifyContext {
                title: "The Salt Accord",
                content: "Two clans agreed to share the salt flats.",
                event_type: "alliance",
            })
        });
        let prompt = prompt.ok();
        let user = prompt.as_ref().map(|p| p.user.as_str()).unwrap_or_default();
        assert!(user.contains("Event type: alliance"));
        assert!(user.contains("Title: The Salt Accord"));
        assert!(user.contains("share the salt flats"));
        let system = prompt.as_ref().map(|p| p.system.as_str()).unwrap_or_default();
        assert!(system.contains("plain"));
    }

    #[test]
    fn missing_template_dir_is_an_error() {
        let result = PromptEngine::from_dir(Path::new("/nonexistent/templates"));
        assert!(matches!(result, Err(PromptError::Read { .. })));
    }
}
