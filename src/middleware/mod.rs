/*
 * Responsibility
 * - Transport-level middleware applied at the Router level (CORS, tracing,
 *   limits, timeouts); the request pipeline itself lives in crate::pipeline
 */
pub mod cors;
pub mod http;
