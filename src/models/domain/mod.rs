pub mod document;
pub mod quiz;
pub mod session;
pub mod source;
pub use document::{Document, DocumentMetadata};
pub use quiz::ParsedQuiz;
pub use session::Session;
pub use source::SourceKind;
