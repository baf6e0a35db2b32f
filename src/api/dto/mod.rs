//! Data Transfer Objects for REST request/response serialization.

pub mod hold_dto;
pub mod ingest_dto;

pub use hold_dto::*;
pub use ingest_dto::*;
