//! shop-types: shared domain model and port traits for the shop API

pub mod domain;
pub mod ports;
