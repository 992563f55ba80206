//! Test suites for the proxy bootstrapper.

mod support;
