mod config;
mod pipeline;
mod terminal_flow;
