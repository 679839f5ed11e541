//! Conversion trait for ergonomic prompt content construction

use super::{
    handles::{ResourceHandle, ToolHandle},
    prompt_content::PromptContent,
};

/// Convert various types into `PromptContent` (internal type)
/// This is the developer-facing API
pub trait IntoPromptContent {
    /// Convert self into `PromptContent`
    fn into_prompt_content(self) -> PromptContent;
}

// Implement for handles (strict mode)
impl IntoPromptContent for ToolHandle {
    fn into_prompt_content(self) -> PromptContent {
        PromptContent::ToolHandle(self)
    }
}

impl IntoPromptContent for ResourceHandle {
    fn into_prompt_content(self) -> PromptContent {
        PromptContent::ResourceHandle(self)
    }
}

// Implement for strings (loose mode)
impl IntoPromptContent for String {
    fn into_prompt_content(self) -> PromptContent {
        PromptContent::Text(self)
    }
}

impl IntoPromptContent for &str {
    fn into_prompt_content(self) -> PromptContent {
        PromptContent::Text(self.to_string())
    }
}

// Implement for images (tuple of data and mime_type)
impl IntoPromptContent for (String, String) {
    fn into_prompt_content(self) -> PromptContent {
        PromptContent::Image {
            data: self.0,
            mime_type: self.1,
        }
    }
}

// Blanket From implementation for ergonomics
impl<T: IntoPromptContent> From<T> for PromptContent {
    fn from(value: T) -> Self {
        value.into_prompt_content()
    }
}
