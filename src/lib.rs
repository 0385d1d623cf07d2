pub mod core;
pub mod llm;
pub mod notes;
pub mod rag;
pub mod server;
pub mod state;
