/*
 * Responsibility
 * - crate の公開モジュール (binary と tests/ から使う)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
