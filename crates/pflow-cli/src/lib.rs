pub mod cli;
pub mod driver;
pub mod exit;
pub mod outage;
pub mod report;

#[cfg(test)]
mod testing;

pub use exit::ExitCode;
