/*!
 * Licence scope extractor
 *
 * Responsibility:
 * - 認証・ライセンス検証済みリクエストのスコープ (entity / licence) を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - LicenceScope
 */

mod core;
mod types;

pub use types::LicenceScope;
