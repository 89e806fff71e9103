//! Murmur text: entry segmentation.
//!
//! Turns one raw line of dialogue into ordered sentences and tokens for the
//! concept network to learn, protecting URLs, e-mail addresses, acronyms,
//! smileys, and the reserved `@bot@`/`@user@` placeholders from being cut
//! apart along the way.

pub mod entry;
pub mod error;
pub mod masker;

pub use entry::{Entry, BOT_PLACEHOLDER, USER_PLACEHOLDER};
pub use error::{TextError, TextResult};
pub use masker::Masker;
