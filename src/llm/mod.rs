pub mod api_key;
pub mod client;
pub mod client_impl;
pub mod factory;
pub mod prompts;
