//! Domain models for backoffice-service.

pub mod customer;
pub mod invoice;
pub mod package;
pub mod payment;

pub use customer::*;
pub use invoice::*;
pub use package::*;
pub use payment::*;
