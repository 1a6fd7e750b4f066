pub mod agenda;
pub mod boards;
pub mod config;
pub mod events;
pub mod opportunities;
