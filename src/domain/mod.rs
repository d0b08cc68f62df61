pub mod errors;
pub mod order;
pub mod ports;
pub mod state_machine;
pub mod user;
