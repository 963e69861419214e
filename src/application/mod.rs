//! Application services layer.

pub mod admin;
pub mod error;
pub mod exchange;
pub mod media;
pub mod pagination;
pub mod repos;
pub mod search;
pub mod site;
