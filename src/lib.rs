pub mod adapters;
pub mod api;
pub mod application;
pub mod circuit_breaker;
pub mod config;
pub mod domain;
pub mod ports;
pub mod seed;
pub mod telemetry;
