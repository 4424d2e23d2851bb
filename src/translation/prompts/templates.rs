/*!
 * Prompt templates for game text translation.
 *
 * Every prompt asks for structured JSON output so responses can be parsed
 * without guessing at line numbering.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::translation::glossary::Glossary;

/// System prompt template with `{source_language}` / `{target_language}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// System prompt for content translation.
    pub const GAME_TRANSLATOR: &'static str = r#"You are an expert video game localizer translating from {source_language} to {target_language}.

## Formatting Rules
- Preserve ALL tags exactly as written: <b>, </b>, <page=S>, <hpage>
- Keep HTML entities as-is: &amp;, &#8217;
- Keep placeholders such as {value}, {level} and {0,1} unchanged
- Keep system variables such as $PLAYER_NAME$ unchanged
- Translate only the text content, never the markup
- Preserve the original letter case of the source text

## Terminology
- Follow the glossary strictly for names and key terms

## Output Requirements
- Return ONLY valid JSON matching the requested schema
- Return exactly one translation per entry, reusing each entry id
- Do not include any text outside the JSON structure"#;

    /// System prompt for term extraction.
    pub const TERM_EXTRACTOR: &'static str = r#"You analyze video game text and extract terms that must be translated consistently.

Look for:
- Character names, location names, item names
- Skill and ability names, unique game terminology
- Proper nouns specific to the game world

Do NOT include common words, generic gaming terms, UI text or numbers.

Return ONLY valid JSON of the form {"terms": ["..."]}."#;

    /// System prompt for glossary translation.
    pub const GLOSSARY_TRANSLATOR: &'static str = r#"You translate video game terminology from {source_language} to {target_language}.
Provide natural {target_language} translations that fit a fantasy adventure setting.
Keep names that should not be translated unchanged.

Return ONLY valid JSON of the form {"translations": {"<term>": "<translation>"}} with every requested term as a key."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn game_translator() -> Self {
        Self::new(Self::GAME_TRANSLATOR)
    }

    pub fn term_extractor() -> Self {
        Self::new(Self::TERM_EXTRACTOR)
    }

    pub fn glossary_translator() -> Self {
        Self::new(Self::GLOSSARY_TRANSLATOR)
    }

    /// Render the template with the given variables.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::game_translator()
    }
}

/// Builder for content translation prompts.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
    texts: Vec<String>,
    glossary: Option<Glossary>,
    context: Option<String>,
}

impl TranslationPromptBuilder {
    /// Create a new prompt builder.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            texts: Vec::new(),
            glossary: None,
            context: None,
        }
    }

    /// Set the texts to translate; their position becomes the entry id.
    pub fn with_texts(mut self, texts: &[String]) -> Self {
        self.texts = texts.to_vec();
        self
    }

    /// Glossary terms the translation must follow.
    pub fn with_glossary(mut self, glossary: &Glossary) -> Self {
        if !glossary.is_empty() {
            self.glossary = Some(glossary.clone());
        }
        self
    }

    /// Project context, such as the game's setting.
    pub fn with_context(mut self, context: Option<&str>) -> Self {
        self.context = context.filter(|c| !c.trim().is_empty()).map(str::to_string);
        self
    }

    pub fn build_system_prompt(&self) -> String {
        PromptTemplate::game_translator().render(&self.source_language, &self.target_language)
    }

    /// Build the user prompt as a JSON request.
    pub fn build_user_prompt(&self) -> String {
        let request = TranslationRequest {
            task: "translate_game_text".to_string(),
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
            context: self.context.clone(),
            glossary: self
                .glossary
                .as_ref()
                .map(|g| g.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
            entries: self
                .texts
                .iter()
                .enumerate()
                .map(|(id, text)| EntryToTranslate { id, text: text.clone() })
                .collect(),
            response_format: r#"{"translations": [{"id": 0, "translated": "..."}]}"#.to_string(),
        };

        serde_json::to_string_pretty(&request).unwrap_or_else(|_| "{}".to_string())
    }

    /// Build both system and user prompts.
    pub fn build(&self) -> (String, String) {
        (self.build_system_prompt(), self.build_user_prompt())
    }
}

/// User prompt for term extraction
pub fn term_extraction_prompt(text: &str, context: Option<&str>) -> String {
    let context = context
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("Context: Game localization");
    format!("{}\n\nText to analyze:\n{}", context, text)
}

/// User prompt for glossary translation
pub fn glossary_translation_prompt(terms: &[String], context: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }
    let terms_json = serde_json::to_string(terms).unwrap_or_else(|_| "[]".to_string());
    prompt.push_str(&format!("Terms: {}", terms_json));
    prompt
}

/// Translation request structure for JSON communication with LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Task identifier
    pub task: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub glossary: BTreeMap<String, String>,
    pub entries: Vec<EntryToTranslate>,
    /// Shape the answer must follow
    pub response_format: String,
}

/// An entry to translate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryToTranslate {
    /// Position of the text in the request
    pub id: usize,
    pub text: String,
}

/// Expected translation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translations: Vec<TranslatedEntry>,
}

/// A single translated entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedEntry {
    /// Entry ID (must match request)
    pub id: usize,
    pub translated: String,
}

/// Expected term extraction response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermExtractionResponse {
    #[serde(default)]
    pub terms: Vec<String>,
}

/// Expected glossary translation response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlossaryTranslationResponse {
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}
