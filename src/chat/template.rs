//! Chat-formatted prompts.
//!
//! The runtime's tokenizer expects ChatML role markers.  The exact bytes matter: a prompt that is
//! off by a space still generates, just worse, so the delimiters here are fixed strings and the
//! tests pin them down byte for byte.

/// Opening marker for every role block.
pub const IM_START: &str = "<|im_start|>";

/// Closing marker for every role block.
pub const IM_END: &str = "<|im_end|>";

/// Wraps a system prompt and a user turn into a single prompt string.
///
/// Implementations must be pure: the same inputs always produce the same output.
pub trait PromptTemplate: Send + Sync {
    /// Formats one user turn under the given system prompt.
    fn format(&self, system_prompt: &str, user_text: &str) -> String;
}

/// The ChatML layout used by the Qwen family of models.
///
/// ```
/// # use rkllm_chat::chat::{ChatMlTemplate, PromptTemplate};
/// let prompt = ChatMlTemplate.format("Be brief.", "hi");
/// assert_eq!(
///     prompt,
///     "<|im_start|>system Be brief. <|im_end|><|im_start|>user hi <|im_end|><|im_start|>assistant"
/// );
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatMlTemplate;

impl ChatMlTemplate {
    /// Formats the system block on its own.
    pub fn system_block(&self, system_prompt: &str) -> String {
        format!("{IM_START}system {system_prompt} {IM_END}")
    }

    /// Formats a user block followed by the assistant prefix.
    pub fn user_block(&self, user_text: &str) -> String {
        format!("{IM_START}user {user_text} {IM_END}{IM_START}assistant")
    }
}

impl PromptTemplate for ChatMlTemplate {
    fn format(&self, system_prompt: &str, user_text: &str) -> String {
        let mut prompt = self.system_block(system_prompt);
        prompt.push_str(&self.user_block(user_text));
        prompt
    }
}

/// Formats user turns under a single, persistent system prompt.
///
/// No history is kept: each turn is formatted independently of the ones before it.
pub struct TurnFormatter<T: PromptTemplate = ChatMlTemplate> {
    template: T,
    system_prompt: String,
}

impl TurnFormatter<ChatMlTemplate> {
    /// Creates a ChatML formatter for `system_prompt`.
    pub fn chat_ml(system_prompt: impl Into<String>) -> Self {
        Self::new(ChatMlTemplate, system_prompt)
    }
}

impl<T: PromptTemplate> TurnFormatter<T> {
    /// Creates a formatter with a custom template.
    pub fn new(template: T, system_prompt: impl Into<String>) -> Self {
        Self {
            template,
            system_prompt: system_prompt.into(),
        }
    }

    /// Returns the system prompt used for every turn.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Formats one user turn.
    pub fn format(&self, user_text: &str) -> String {
        self.template.format(&self.system_prompt, user_text)
    }
}
