pub mod config;
pub mod db;
pub mod parsers;
pub mod storage;
