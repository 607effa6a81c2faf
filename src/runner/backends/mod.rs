pub mod action;
pub mod shell;

pub use action::ActionBackend;
pub use shell::ShellBackend;
