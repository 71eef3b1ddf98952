//! Triage Processing Library
//!
//! Intake-side stages of the pipeline: content sniffing, scoped temp-file
//! ownership, recursive archive expansion, scan ordering and intake checks.

pub mod archive;
pub mod guard;
pub mod scheduler;
pub mod sniffer;
pub mod validator;

pub use archive::{ArchiveExpander, ArchiveKind, ExpansionLimits};
pub use guard::{LeaseKind, ResourceGuard, ResourceLease};
pub use scheduler::PriorityScheduler;
pub use sniffer::TypeSniffer;
pub use validator::{IntakeValidator, ValidationError};
