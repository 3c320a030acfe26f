//! Generative-service clients for solalm.
//!
//! The rest of the workspace only sees the [`TextFragmentProvider`] and
//! [`ImageProvider`] traits; [`GeminiAdapter`] is the production
//! implementation of both.

pub mod errors;
pub mod gemini;
pub mod prompts;
pub mod provider;
pub mod types;

#[allow(unused_imports)]
pub use errors::*;
#[allow(unused_imports)]
pub use gemini::*;
#[allow(unused_imports)]
pub use provider::*;
#[allow(unused_imports)]
pub use types::*;
