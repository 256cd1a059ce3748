//! Supported datatypes: key admission, value kinds and the tagged wire form.

#[path = "../common/mod.rs"]
mod common;

mod keys;
