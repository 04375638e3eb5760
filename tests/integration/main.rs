//! End-to-end tests against the in-process DocMill HTTP API.

mod helpers;

mod cleanup_test;
mod convert_test;
mod download_test;
mod health_test;
mod usage_test;
