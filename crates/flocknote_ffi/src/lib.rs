//! Flutter bridge for FlockNote core.

pub mod api;
