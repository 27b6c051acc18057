pub mod attempts;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod quiz;
pub mod srs;
pub mod state;

#[cfg(test)]
mod testing;
