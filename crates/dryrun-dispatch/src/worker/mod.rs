mod handle;
mod interface;

pub use handle::*;
pub use interface::*;
