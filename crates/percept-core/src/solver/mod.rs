pub mod agent;
pub mod arena;
pub mod environment;
pub mod error;
pub mod ids;
pub mod iteration;
pub mod policy;
pub mod simulator;
pub mod snapshot;

#[cfg(test)]
mod tests;
