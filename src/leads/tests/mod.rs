mod analytics;
mod common;
mod scoring;
