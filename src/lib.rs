//! ytm2tidal library - liked-songs migration from YouTube Music to TIDAL.

pub mod blacklist;
pub mod catalog;
pub mod config;
pub mod download;
pub mod driver;
pub mod engine;
pub mod error;
pub mod library;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod safety;
pub mod scoring;
pub mod strategy;
pub mod tagging;
pub mod tidal;

#[cfg(test)]
mod test_support;
