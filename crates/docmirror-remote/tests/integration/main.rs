//! Integration tests for docmirror-remote
//!
//! Uses wiremock to simulate the `/api/v2` REST API and verifies the
//! endpoint mapping, headers, envelope handling and error classification
//! of the YuqueRemoteSource.

mod common;

mod test_account;
mod test_documents;
mod test_repositories;
