// Flowferry — account management and flow migration engine for the YingDao
// RPA platform.
//
// Layering:
//   atoms    — shared types and the canonical error enum
//   engine   — session client, inventories, the migration orchestrator,
//              credential store, audit dispatch
//   commands — thin boundary the desktop shell invokes over IPC

pub mod atoms;
pub mod commands;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{
    AccountCredential, CloudFlow, DeleteResult, FlowDescriptor, FlowKind, LocalFlow,
    MigrationBatch, MigrationResult, SessionToken, TokenPurpose,
};
pub use engine::migrate::Orchestrator;
pub use engine::platform::{PlatformApi, PlatformError};
