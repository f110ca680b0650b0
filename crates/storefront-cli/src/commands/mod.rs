//! Command handlers. Each returns the rendered output for `dispatch` to print.

pub(crate) mod orders;
pub(crate) mod whoami;
