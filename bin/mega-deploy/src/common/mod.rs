mod error;
mod files;
mod logging;
mod rpc;
mod solc;
mod sources;

pub use error::*;
pub use files::*;
pub use logging::*;
pub use rpc::*;
pub use solc::*;
pub use sources::*;
