pub mod config;
pub mod error;
pub mod report;
pub mod task;
pub mod text;

pub use config::Settings;
pub use error::VeracityError;
pub use report::*;
pub use task::*;
pub use text::*;
