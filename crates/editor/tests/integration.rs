#![allow(unused_crate_dependencies)]

#[path = "integration/common/mod.rs"]
mod common;

#[path = "integration/background.rs"]
mod background;

#[path = "integration/clipboard.rs"]
mod clipboard;

#[path = "integration/collaboration.rs"]
mod collaboration;

#[path = "integration/folding.rs"]
mod folding;

#[path = "integration/incremental.rs"]
mod incremental;
