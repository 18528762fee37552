mod config;
mod terminal_adapter;
