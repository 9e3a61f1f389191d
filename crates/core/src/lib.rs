pub mod age;
pub mod content;
pub mod intent;
pub mod language;
pub mod models;
pub mod pipeline;
pub mod reply;

pub use age::extract_age;
pub use content::{CatalogContentProvider, ContentCatalog, ContentProvider, StaticContentProvider};
pub use intent::{classify_intent, normalize_text, preview_text};
pub use language::{detect_language, resolve_language};
pub use models::*;
pub use pipeline::process_message;
pub use reply::{compose_reply, format_schedule, reply_template};
