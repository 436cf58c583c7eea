//! Health endpoint integration tests.

#[cfg(test)]
mod tests {
    use crate::EchoClient;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_echo_service_running() {
        let client = EchoClient::new();
        for path in ["/_protobind/health", "/_health", "/health"] {
            let resp = client.request(reqwest::Method::GET, path).await.unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::OK, "{path}");

            let json: serde_json::Value = resp.json().await.unwrap();
            assert_eq!(
                json["services"]["protobind.echo.EchoService"], "running",
                "{path}: {json}"
            );
        }
    }
}
