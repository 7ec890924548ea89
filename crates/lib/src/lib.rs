//! WiserChild core library: config, the chat relay, the Anthropic client, the relay client and
//! the UI state machines shared by the CLI and desktop applications.

pub mod client;
pub mod config;
pub mod init;
pub mod llm;
pub mod relay;
pub mod ui;
