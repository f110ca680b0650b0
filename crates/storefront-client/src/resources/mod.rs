//! Descriptor tables and typed wrappers, one module per resource family.

pub mod orders;
pub mod users;
