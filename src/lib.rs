// Library root — the chat service and the mock backend share these modules.
// Binary entry points are src/main.rs and src/bin/mock-backend.rs.

pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod mock;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod server;
