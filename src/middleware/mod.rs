/*
 * Responsibility
 * - middleware public interface
 * - auth (identity + role gate) per API router, transport concerns for the whole app
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
