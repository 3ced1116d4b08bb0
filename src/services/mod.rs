pub mod convert;
pub mod document;
pub mod encoding;
pub mod json_catalog;
pub mod merge;
pub mod remote;
pub mod settings;
pub mod staging;
pub mod vcs;
pub mod workflow;
