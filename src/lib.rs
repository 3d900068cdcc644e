//! Lead Capture API Library
//!
//! Accepts applications from the course landing page, stores them in a
//! document store and sends best-effort email notifications.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Store bootstrap and PostgreSQL pool management.
//! - `db_storage`: Document store trait and PostgreSQL implementation.
//! - `memory_storage`: In-process document store.
//! - `email_templates`: Admin and applicant email bodies.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Lead model and request/response types.
//! - `notifications`: Best-effort SMTP delivery.
//! - `routes`: Router and OpenAPI document.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod email_templates;
pub mod errors;
pub mod handlers;
pub mod memory_storage;
pub mod models;
pub mod notifications;
pub mod routes;
