//! VM operation implementations.

pub(crate) mod access;
pub(crate) mod call;
pub(crate) mod compare;
pub(crate) mod flow;
pub(crate) mod math;
