//! FFI surface for the Flutter host.

pub mod api;
