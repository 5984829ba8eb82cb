//! Console output and interaction

pub mod progress;
pub mod prompt;
pub mod reporter;

pub use prompt::ConsoleApprover;
pub use reporter::ConsoleReporter;
