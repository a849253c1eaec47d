// file: src/repository/mod.rs
// description: Repository listing adapters and classification exports
// reference: Internal module structure

pub mod classifier;
pub mod local;
pub mod sharepoint;
pub mod source;

pub use classifier::FileClassifier;
pub use local::LocalFolderSource;
pub use sharepoint::SharePointSource;
pub use source::{FileSource, build_source};
