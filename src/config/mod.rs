// config/mod.rs
mod types;

pub use types::{BootstrapAnswers, GeneratorConfig, SubjectTemplate};
