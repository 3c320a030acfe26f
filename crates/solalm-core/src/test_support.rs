//! Scripted providers for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use solalm_llm::{
    FragmentMode, ImageHandle, ImageProvider, LlmError, NoObjectGeneratedError, ProviderError,
    ProviderErrorKind, TextFragment, TextFragmentProvider,
};

use crate::identity::{Address, AddressGenerator};

pub fn fragment(text: &str, reference: &str) -> TextFragment {
    TextFragment::new(text, reference)
}

pub fn server_error() -> LlmError {
    LlmError::Provider(ProviderError::new(
        "scripted",
        ProviderErrorKind::Server,
        "upstream unavailable",
    ))
}

/// Replays queued results in order; once the queue is empty, repeats `fallback`.
pub struct ScriptedFragments {
    queue: Mutex<VecDeque<Result<TextFragment, LlmError>>>,
    fallback: Result<TextFragment, LlmError>,
    calls: AtomicUsize,
    modes: Mutex<Vec<FragmentMode>>,
}

impl ScriptedFragments {
    pub fn always(result: Result<TextFragment, LlmError>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: result,
            calls: AtomicUsize::new(0),
            modes: Mutex::new(Vec::new()),
        }
    }

    pub fn sequence(
        results: Vec<Result<TextFragment, LlmError>>,
        then: Result<TextFragment, LlmError>,
    ) -> Self {
        let scripted = Self::always(then);
        *scripted.queue.lock().unwrap() = results.into();
        scripted
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn modes(&self) -> Vec<FragmentMode> {
        self.modes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextFragmentProvider for ScriptedFragments {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, mode: FragmentMode) -> Result<TextFragment, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.modes.lock().unwrap().push(mode);
        // Suspend like a real network call so concurrent callers interleave.
        tokio::task::yield_now().await;
        let next = self.queue.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Same replay rules as [`ScriptedFragments`].
pub struct ScriptedImages {
    queue: Mutex<VecDeque<Result<ImageHandle, LlmError>>>,
    fallback: Result<ImageHandle, LlmError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedImages {
    pub fn ok() -> Self {
        Self::always(Ok(ImageHandle::new("image/png", "iVBORw==")))
    }

    pub fn empty() -> Self {
        Self::always(Err(LlmError::NoObjectGenerated(NoObjectGeneratedError::new(
            "No image was generated.",
        ))))
    }

    pub fn always(result: Result<ImageHandle, LlmError>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: result,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn sequence(
        results: Vec<Result<ImageHandle, LlmError>>,
        then: Result<ImageHandle, LlmError>,
    ) -> Self {
        let scripted = Self::always(then);
        *scripted.queue.lock().unwrap() = results.into();
        scripted
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedImages {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt_text: &str) -> Result<ImageHandle, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt_text.to_string());
        tokio::task::yield_now().await;
        let next = self.queue.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Hands out `addr-1`, `addr-2`, ...
#[derive(Default)]
pub struct SequentialAddresses {
    next: AtomicUsize,
}

impl AddressGenerator for SequentialAddresses {
    fn generate(&self) -> Address {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Address::new(format!("addr-{n}"))
    }
}
