//! pdfchat knowledge model
//!
//! The data that flows through preprocessing: paragraph chunks tagged with
//! their source file and page, the same chunks once they carry an embedding,
//! and the flat JSON file that holds all of them.
//!
//! The on-disk format is deliberately plain. A knowledge base is one JSON array
//! of objects with `content`, `source`, `page`, and `embedding` keys. No schema
//! version, no index. Consumers are expected to read the whole thing.
//!
//! ```no_run
//! use knowledge::{read_knowledge_base, write_knowledge_base, DocumentChunk, KnowledgeBase};
//!
//! let mut kb = KnowledgeBase::new();
//! kb.push(DocumentChunk::new("A paragraph.", "book.pdf", 1).with_embedding(vec![0.1, 0.2]))
//!     .unwrap();
//! write_knowledge_base("processed_data/knowledge_base.json", &kb).unwrap();
//! let again = read_knowledge_base("processed_data/knowledge_base.json").unwrap();
//! assert_eq!(kb, again);
//! ```

mod error;
mod store;
mod types;

pub use crate::error::KnowledgeError;
pub use crate::store::{read_knowledge_base, write_knowledge_base, KnowledgeBase};
pub use crate::types::{DocumentChunk, EmbeddedChunk};

/// Where the preprocessing run writes its output unless configured otherwise.
pub const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "processed_data/knowledge_base.json";
