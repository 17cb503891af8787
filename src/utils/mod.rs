pub mod fs;
pub mod progress;
pub mod prompt;
