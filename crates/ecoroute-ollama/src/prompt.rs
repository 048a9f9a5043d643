// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-model prompt formatting.
//!
//! Requests are sent with `raw: true`, so the text built here is exactly
//! what the model sees.

/// Prompt layout expected by a catalog model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// `USER: ...\nASSISTANT:` chat turns.
    Chat,
    /// `Question: ...\nAnswer:` completion.
    QuestionAnswer,
    /// Chat turns with a task-specific instruction and a primed answer.
    CodeInstruction,
    /// The query unchanged.
    Plain,
}

impl PromptTemplate {
    /// Template for a catalog model id.
    pub fn for_model(model_id: &str) -> Self {
        match model_id {
            "tinyllama" => Self::Chat,
            "gpt2" => Self::QuestionAnswer,
            "codellama" => Self::CodeInstruction,
            _ => Self::Plain,
        }
    }

    pub fn render(self, query: &str) -> String {
        match self {
            Self::Chat => format!("USER: {query}\nASSISTANT:"),
            Self::QuestionAnswer => format!("Question: {query}\nAnswer:"),
            Self::CodeInstruction => code_instruction(query),
            Self::Plain => query.to_string(),
        }
    }

    /// Sequences that end generation for this layout.
    pub fn stop_sequences(self) -> Vec<String> {
        match self {
            Self::Chat | Self::CodeInstruction => vec!["USER:".to_string()],
            Self::QuestionAnswer => vec!["\nQuestion:".to_string()],
            Self::Plain => Vec::new(),
        }
    }
}

fn code_instruction(query: &str) -> String {
    let lower = query.to_lowercase();
    let has = |word: &str| lower.contains(word);

    if has("write") || has("implement") {
        format!(
            "USER: Write code for the following task: {query}\nASSISTANT: Here's the implementation:\n"
        )
    } else if has("explain") {
        format!("USER: Explain the following code or concept: {query}\nASSISTANT: Let me explain:\n")
    } else if has("debug") || has("fix") {
        format!(
            "USER: Help me debug/fix this code: {query}\nASSISTANT: Let's analyze and fix the code.\nHere's the corrected version:\n"
        )
    } else {
        format!("USER: {query}\nASSISTANT: Let me help you with that.\n")
    }
}
