//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, password login, distributor login and admin bootstrap live
//! here; the HTTP layer only maps inputs and errors.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
