//! FFI surface exposing the tracker core to the Flutter shell.

pub mod api;
