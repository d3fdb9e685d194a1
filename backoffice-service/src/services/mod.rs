//! Services module for backoffice-service.

pub mod database;
pub mod directory;
pub mod invoice_number;
pub mod metrics;
pub mod payments;
pub mod provisioning;
pub mod registration;
pub mod store;

pub use database::Database;
pub use directory::CustomerDirectory;
pub use metrics::{get_metrics, init_metrics};
pub use payments::{InvoicePayments, PaymentInput};
pub use provisioning::{build_provisioner, DisabledProvisioner, SubscriberProvisioner};
pub use registration::{CustomerRegistration, RegistrationInput};
pub use store::BackofficeStore;
