pub mod config;
pub mod correlation;
pub mod envelope;
pub mod fragments;
pub mod log;
pub mod observability;
pub mod widget;
