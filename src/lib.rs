pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod controller;
pub mod fetcher;
pub mod grid;
pub mod output;
pub mod session;
pub mod utils;

#[cfg(test)]
mod tests;
