//! Utility functions for the request logger

pub mod http;
pub mod time;
