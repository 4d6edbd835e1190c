//! Command implementations for the md2html CLI.

pub mod convert;
