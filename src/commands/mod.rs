// Flowferry Commands — the IPC-facing boundary the desktop shell binds to.
// Every function here takes `&EngineState`, delegates to the engine, and
// reports errors as `String`.

pub mod accounts;
pub mod flows;
pub mod state;
