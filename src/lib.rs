pub mod agent;
pub mod ai;
pub mod constants;
pub mod error;
pub mod maze;
pub mod physics;
pub mod protocol;
pub mod rng;
pub mod session;
pub mod types;
