//! Route handlers

pub mod diagnostics;
pub mod pages;
pub mod predict;
