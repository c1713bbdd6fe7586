//! Integration tests driving the HTTP surface end to end.

mod helpers;

mod admin_test;
mod manager_test;
mod plugin_test;
