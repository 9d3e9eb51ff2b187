pub mod http;
pub mod traits;

pub use http::{HttpCommandSource, HttpSourceConfig};
pub use traits::CommandSource;
