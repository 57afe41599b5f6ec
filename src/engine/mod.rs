//! Launching and supervising the external inference engine.

mod command;
mod probe;
mod process;

pub use command::{EngineCommand, EngineSettings};
pub use probe::{HttpProbe, ReadinessProbe, TcpProbe};
pub use process::{EngineProcess, EngineState, EngineStatus};
