//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`StudentRepository`]) are implemented by outbound adapters;
//! driving ports ([`StudentsCommand`], [`StudentsQuery`]) are consumed by
//! inbound adapters and implemented by [`crate::domain::StudentService`].

mod macros;
pub(crate) use macros::define_port_error;

mod student_repository;
mod students_command;
mod students_query;

#[cfg(test)]
pub use student_repository::MockStudentRepository;
pub use student_repository::{StudentRepository, StudentRepositoryError};
#[cfg(test)]
pub use students_command::MockStudentsCommand;
pub use students_command::StudentsCommand;
#[cfg(test)]
pub use students_query::MockStudentsQuery;
pub use students_query::StudentsQuery;
