//! Context rendering and system prompt assembly
//!
//! Retrieved knowledge entries are serialized into a text block that is
//! placed inside the instructions sent to the text-generation service.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::knowledge::KnowledgeEntry;

const BULLETED_HEADING: &str = "Relevant Clinic Information:";
const NUMBERED_HEADING: &str = "Relevant Knowledge Base Information:";

/// Default persona preamble
pub const DEFAULT_PERSONA: &str = "You are Dr. Chowdhury, the AI-powered physician assistant for VisiMedica, a precision longevity medicine platform.

VisiMedica Core Philosophy:
- Transform healthcare from reactive to predictive and proactive
- Build comprehensive Digital Twins of patient biology
- Maximize healthspan, not just lifespan
- Combine cutting-edge diagnostics, genomics, and AI-driven insights

The VisiMedica Digital Twin Journey has 5 stages:
1. Personal Profile - Tablet-guided with AI Companion assistance
2. Mind Assessment - Cognitive and mental health evaluation
3. Body Composition - Advanced imaging and metabolic analysis
4. Blood Analysis - Comprehensive biomarker panels
5. Genetic Blueprint - Genomic sequencing and personalized insights

Your role:
- Provide compassionate, evidence-based medical guidance
- Reference the Digital Twin concept and 5-stage journey when relevant
- Explain complex medical information in accessible terms
- Never provide definitive diagnoses
- Be warm, professional, and supportive";

/// Default closing guidance; replies are spoken aloud
pub const DEFAULT_STYLE_GUIDANCE: &str =
    "Keep responses concise (2-3 sentences) and conversational, since they will be spoken aloud.";

/// How retrieved entries are laid out in the prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextFormat {
    /// `- <topic>: <content>` per line
    #[default]
    Bulleted,
    /// `<n>. <topic> (<category>):` followed by the content
    Numbered,
}

impl ContextFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bulleted => "bulleted",
            Self::Numbered => "numbered",
        }
    }
}

impl fmt::Display for ContextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bulleted" => Ok(Self::Bulleted),
            "numbered" => Ok(Self::Numbered),
            other => Err(Error::InvalidInput(format!(
                "unknown context format '{}'. Valid options: bulleted, numbered",
                other
            ))),
        }
    }
}

/// Serialize entries into a context block; empty input renders nothing
pub fn render_context(entries: &[KnowledgeEntry], format: ContextFormat) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    match format {
        ContextFormat::Bulleted => {
            out.push_str(BULLETED_HEADING);
            for entry in entries {
                let _ = write!(out, "\n- {}: {}", entry.topic, entry.content.trim());
            }
        }
        ContextFormat::Numbered => {
            out.push_str(NUMBERED_HEADING);
            for (idx, entry) in entries.iter().enumerate() {
                let _ = write!(
                    out,
                    "\n\n{}. {} ({}):\n{}",
                    idx + 1,
                    entry.topic,
                    entry.category,
                    entry.content.trim()
                );
            }
        }
    }
    out
}

/// Builds the system prompt sent alongside the user's message
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
    style_guidance: String,
    format: ContextFormat,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA, DEFAULT_STYLE_GUIDANCE, ContextFormat::default())
    }
}

impl PromptBuilder {
    pub fn new(
        persona: impl Into<String>,
        style_guidance: impl Into<String>,
        format: ContextFormat,
    ) -> Self {
        Self {
            persona: persona.into(),
            style_guidance: style_guidance.into(),
            format,
        }
    }

    pub fn with_format(mut self, format: ContextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> ContextFormat {
        self.format
    }

    /// Persona, then the context block (if any), then the style guidance
    pub fn build(&self, entries: &[KnowledgeEntry]) -> String {
        let context = render_context(entries, self.format);

        let sections = [
            self.persona.trim(),
            context.as_str(),
            self.style_guidance.trim(),
        ];

        sections
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<KnowledgeEntry> {
        vec![
            KnowledgeEntry::new(9, "Common Symptoms", "Headaches", "Track triggers."),
            KnowledgeEntry::new(12, "Emergency Signs", "When to Seek Immediate Care", "Call 911.\n"),
        ]
    }

    #[test]
    fn test_render_bulleted() {
        let rendered = render_context(&entries(), ContextFormat::Bulleted);
        assert_eq!(
            rendered,
            "Relevant Clinic Information:\n- Headaches: Track triggers.\n- When to Seek Immediate Care: Call 911."
        );
    }

    #[test]
    fn test_render_numbered() {
        let rendered = render_context(&entries(), ContextFormat::Numbered);
        assert_eq!(
            rendered,
            "Relevant Knowledge Base Information:\n\n1. Headaches (Common Symptoms):\nTrack triggers.\n\n2. When to Seek Immediate Care (Emergency Signs):\nCall 911."
        );
    }

    #[test]
    fn test_render_empty_is_blank() {
        assert_eq!(render_context(&[], ContextFormat::Bulleted), "");
        assert_eq!(render_context(&[], ContextFormat::Numbered), "");
    }

    #[test]
    fn test_prompt_without_context_skips_section() {
        let builder = PromptBuilder::new("Persona.", "Be brief.", ContextFormat::Bulleted);
        assert_eq!(builder.build(&[]), "Persona.\n\nBe brief.");
    }

    #[test]
    fn test_prompt_with_context() {
        let builder = PromptBuilder::new("Persona.", "Be brief.", ContextFormat::Bulleted);
        let prompt = builder.build(&entries()[..1]);
        assert_eq!(
            prompt,
            "Persona.\n\nRelevant Clinic Information:\n- Headaches: Track triggers.\n\nBe brief."
        );
    }

    #[test]
    fn test_default_builder_mentions_persona() {
        let prompt = PromptBuilder::default().build(&[]);
        assert!(prompt.starts_with("You are Dr. Chowdhury"));
        assert!(prompt.ends_with("spoken aloud."));
    }

    #[test]
    fn test_context_format_parse() {
        assert_eq!("numbered".parse::<ContextFormat>().unwrap(), ContextFormat::Numbered);
        assert!("table".parse::<ContextFormat>().is_err());
        assert_eq!(ContextFormat::default().to_string(), "bulleted");
    }
}
