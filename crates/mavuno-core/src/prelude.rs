//! Convenient re-exports for common use.

pub use crate::client::{Asset, GenerativeClient, Media, Prompt, SharedClient};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::schema::{Violation, Violations, validate};
pub use crate::template::{Template, TemplateError};
