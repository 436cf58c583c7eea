//! Protobuf-over-HTTP integration tests against the echo service.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use prost::Message;

    use crate::{ECHO_MOUNT, EchoClient, EchoText, PROTOBUF_CONTENT_TYPE, Stats, echo_body};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_get_with_empty_response() {
        let client = EchoClient::new();
        let resp = client.get("Ping").await.unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(reqwest::header::CONTENT_TYPE)
                .unwrap(),
            PROTOBUF_CONTENT_TYPE
        );
        assert!(resp.headers().contains_key("x-request-id"));
        assert!(resp.bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_echo_posted_message() {
        let client = EchoClient::new();
        let resp = client.post("Echo", echo_body("hi")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let body = resp.bytes().await.unwrap();
        assert_eq!(EchoText::decode(body).unwrap().text, "hi");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reverse_posted_text() {
        let client = EchoClient::new();
        let resp = client.post("Reverse", echo_body("abc")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let body = resp.bytes().await.unwrap();
        assert_eq!(EchoText::decode(body).unwrap().text, "cba");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_count_calls_in_stats() {
        let client = EchoClient::new();
        client.get("Ping").await.unwrap();

        let resp = client.get("Stats").await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let stats = Stats::decode(resp.bytes().await.unwrap()).unwrap();
        assert!(stats.calls >= 2, "calls: {}", stats.calls);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_corrupt_body_with_plain_text_500() {
        let client = EchoClient::new();
        let resp = client
            .post("Echo", Bytes::from_static(&[0x0a, 0x05, b'a']))
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(content_type.starts_with("text/plain"), "{content_type}");

        let text = resp.text().await.unwrap();
        assert!(
            text.starts_with("failed to decode protobind.echo.EchoRequest"),
            "{text}"
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_not_bind_unsupported_verb() {
        let client = EchoClient::new();
        let resp = client
            .request(reqwest::Method::DELETE, &format!("{ECHO_MOUNT}/Echo"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_not_bind_post_without_protobuf_content_type() {
        let client = EchoClient::new();
        let resp = reqwest::Client::new()
            .post(client.url(&format!("{ECHO_MOUNT}/Echo")))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_not_bind_unknown_or_nested_method() {
        let client = EchoClient::new();
        for path in [
            format!("{ECHO_MOUNT}/Nope"),
            format!("{ECHO_MOUNT}/Echo/extra"),
            ECHO_MOUNT.to_owned(),
        ] {
            let resp = client.request(reqwest::Method::GET, &path).await.unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND, "{path}");
        }
    }
}
