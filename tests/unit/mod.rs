//! Unit tests against the public library API

mod extract_test;
mod response_test;
