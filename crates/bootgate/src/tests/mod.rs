//! Test suites for the bootgate runtime.

pub(crate) mod support;
