pub mod engine;
pub mod error;
pub mod store;

pub use engine::{ChatEngine, EngineState};
pub use error::{EngineError, Result};
pub use store::SessionStore;
