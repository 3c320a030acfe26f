//! Provider seams consumed by the core.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::LlmError;
use crate::types::{FragmentMode, ImageHandle, TextFragment};

/// Produces a text fragment for a given mode.
#[async_trait]
pub trait TextFragmentProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, mode: FragmentMode) -> Result<TextFragment, LlmError>;
}

/// Produces an image illustrating a piece of prompt text.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt_text: &str) -> Result<ImageHandle, LlmError>;
}

pub type DynFragmentProvider = Arc<dyn TextFragmentProvider>;
pub type DynImageProvider = Arc<dyn ImageProvider>;
