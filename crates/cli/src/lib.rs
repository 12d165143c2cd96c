//! attacomm CLI
//!
//! Hosts an ATTA session from the command line: it plays the hosting test
//! framework, surfaces operator events and writes a results file.

pub mod output;
pub mod report;
