/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: token / licence stages, http: transport-level layers
 */
pub mod auth;
pub mod http;
