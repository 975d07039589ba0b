//! Prompt templates for Ragbook.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory:
//! `rag.toml`, `chat.toml` and `critique.toml`, each mirroring the matching struct.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub chat: ChatPrompts,
    pub critique: CritiquePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for RAG response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    /// Rendered with `{{query}}` and `{{context}}`.
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a highly knowledgeable and experienced assistant with deep expertise in Competitive Programming and Data Structures & Algorithms (DSA). You help users understand complex problems, optimize their solutions, analyze time and space complexities, and suggest strategies commonly used on platforms such as Codeforces, LeetCode and AtCoder.

Your responses should be accurate, concise, and structured so the user can quickly grasp the solution or concept. Use relevant examples, pseudocode, or step-by-step breakdowns as needed. If the problem can be improved or clarified, guide the user accordingly.

Assume the user has a working knowledge of basic programming (e.g., C++, Python, Java) and common algorithmic concepts, but may need help applying or optimizing them."#
                .to_string(),

            user: r#"User Query:
{{query}}

Relevant Context:
Here are some referenced passages from the books which might help you answer the user's query

{{context}}"#
                .to_string(),
        }
    }
}

/// Prompts for the interactive chat loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub system: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant. Remember earlier turns of the conversation and answer follow-up questions in that context."
                .to_string(),
        }
    }
}

/// Prompts for the movie critique chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CritiquePrompts {
    pub system: String,
    /// Rendered with `{{movie}}`.
    pub summary: String,
    /// Rendered with `{{summary}}`.
    pub plot: String,
    /// Rendered with `{{summary}}`.
    pub characters: String,
    /// Rendered with `{{plot_analysis}}` and `{{character_analysis}}`.
    pub rating: String,
}

impl Default for CritiquePrompts {
    fn default() -> Self {
        Self {
            system: "You are a movie critic with a deep knowledge of all movies.".to_string(),
            summary: "Give me a brief summary of the movie {{movie}}, including its plot with its characters."
                .to_string(),
            plot: "Analyze the plot: {{summary}}. What are the strengths and weaknesses of the plot? Keep your result within 1 paragraph."
                .to_string(),
            characters: "Analyze the characters: {{summary}}. What are the strengths and weaknesses of the characters and how are they portrayed? Keep your result within 1 paragraph."
                .to_string(),
            rating: r#"I want you to provide your rating based on how interesting the story and the characters were. Here is the plot analysis:
{{plot_analysis}}
Here is the character analysis:
{{character_analysis}}
Give me your rating out of 10 along with its strengths and weaknesses."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }

            let critique_path = custom_path.join("critique.toml");
            if critique_path.exists() {
                let content = std::fs::read_to_string(&critique_path)?;
                prompts.critique = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// The template is scanned once, so substituted values are never expanded
    /// again. Unknown `{{name}}` placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = &after[..end];
                    match vars.get(name) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(name);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Render with a fixed list of `(name, value)` pairs.
    pub fn fill(&self, template: &str, pairs: &[(&str, &str)]) -> String {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.render_with_custom(template, &vars)
    }
}
