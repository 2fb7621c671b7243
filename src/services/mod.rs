/*
 * Responsibility
 * - domain services the handlers and middleware call into
 */
pub mod auth;
pub mod id_codec;
