//! Replay harness for ChatCompost: command line, configuration, console
//! surface and the scripted session run behind the `chatcompost` binary.

pub mod platform;
