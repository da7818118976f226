//! Jira Cloud REST v3 access: client, payload models, ADF and JQL helpers.

pub mod adf;
pub mod client;
pub mod jql;
pub mod models;

pub use client::{Credentials, JiraClient, JiraError, JiraTarget};
