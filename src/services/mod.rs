/*
 * Responsibility
 * - Process-level services shared by the pipeline (credential verification,
 *   tenant-context resolution)
 */
pub mod auth;
pub mod table_context;
