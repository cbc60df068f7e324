// Flowferry Atoms — the shared vocabulary of the engine.
// Types and errors only; no I/O, no business logic.

pub mod error;
pub mod types;
