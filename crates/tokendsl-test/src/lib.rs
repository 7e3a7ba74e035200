//! # TokenDSL Test
//!
//! In-memory HTTP testing for TokenDSL registries. Requests go through the
//! same [`App`](tokendsl_server::App) the server uses, without a socket.
//!
//! ```ignore
//! use tokendsl_test::TestClient;
//!
//! #[tokio::test]
//! async fn creates_user() {
//!     let client = TestClient::from_dispatcher(&dispatcher).unwrap();
//!     client
//!         .post("/api/users")
//!         .json(&json!({"name": "Ada", "email": "ada@example.com"}))
//!         .send()
//!         .await
//!         .assert_status(StatusCode::CREATED);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tokendsl-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
