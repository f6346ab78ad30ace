//! Maven repository protocol: POM parsing, POM download, checksum
//! verification, local POM cache, and authentication.

pub mod auth;
pub mod cache;
pub mod checksum;
pub mod download;
pub mod pom;
pub mod repository;
