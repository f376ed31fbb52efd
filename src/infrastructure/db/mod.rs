pub mod analyses;
pub mod connection;
pub mod uploads;
