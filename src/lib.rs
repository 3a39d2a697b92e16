//! skill2cmd - Compile Claude Skill bundles into Gemini CLI custom commands
//!
//! Reads a zipped skill (SKILL.MD plus resource files), asks an LLM to rewrite
//! it into a single self-contained `command.toml`, and packages the result
//! with a usage guide into a new zip archive. Supports Gemini, Anthropic,
//! OpenAI and OpenAI-compatible providers.

pub mod cli;
pub mod config;
pub mod error;
pub mod lint;
pub mod llm;
pub mod pipeline;
