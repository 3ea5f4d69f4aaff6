mod resource;
mod state;
mod stats;

pub use resource::*;
pub use state::WorkerState;
pub use stats::*;
