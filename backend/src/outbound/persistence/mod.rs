//! MongoDB persistence adapters.
//!
//! This module provides the concrete implementation of the domain's student
//! repository port backed by MongoDB through the official async driver.
//!
//! # Architecture
//!
//! - **Thin adapters**: the repository only translates between BSON
//!   documents and domain types. No business logic resides here.
//! - **Internal documents**: document structs (`documents.rs`) are internal
//!   implementation details, never exposed to the domain layer.
//! - **Strongly typed errors**: driver errors are mapped to
//!   [`crate::domain::ports::StudentRepositoryError`].
//!
//! # Example
//!
//! ```no_run
//! use student_records::outbound::persistence::{MongoStudentRepository, StoreClient, StoreConfig};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::new("mongodb://localhost:27017").with_database("student_db");
//! let store = StoreClient::connect(&config).await?;
//! let repository = MongoStudentRepository::new(&store);
//! repository.ensure_indexes().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod documents;
mod mongo_student_repository;

pub use client::{STUDENTS_COLLECTION, StoreClient, StoreConfig, StoreError};
pub use mongo_student_repository::MongoStudentRepository;
