//! Functional tests driving the router end to end

mod common;
mod health_test;
mod persistence_test;
