use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam under [`get_json`](super::get_json).
///
/// The real backend is reached through [`BasicClient`](super::BasicClient);
/// tests substitute canned responses to drive the status-mapping branches
/// without a server.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
