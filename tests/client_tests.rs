// Chat client tests against a mocked relay

use mockito::Matcher;
use relaychat::ChatSession;
use relaychat::client::RelayClient;
use relaychat::error::ClientError;
use relaychat::transcript::PromptSender;
use serde_json::json;

const GREETING: &str = "How can I help you today?";

#[tokio::test]
async fn test_send_prompt_posts_prompt_field() {
    let mut relay = mockito::Server::new_async().await;
    let mock = relay
        .mock("POST", "/api/prompt")
        .match_body(Matcher::Json(json!({ "prompt": "Hello" })))
        .with_status(200)
        .with_body(json!({ "success": true, "data": "Hi" }).to_string())
        .create_async()
        .await;

    let client = RelayClient::new(format!("{}/api/prompt", relay.url()));
    assert_eq!(client.send_prompt("Hello").await.unwrap(), "Hi");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_relay_error_keeps_transcript_and_draft() {
    let mut relay = mockito::Server::new_async().await;
    let _mock = relay
        .mock("POST", "/api/prompt")
        .with_status(400)
        .with_body(json!({ "success": false, "error": { "message": "Incorrect API key provided" } }).to_string())
        .create_async()
        .await;

    let client = RelayClient::new(format!("{}/api/prompt", relay.url()));
    let mut session = ChatSession::new(GREETING);
    session.set_draft("Hello");

    let err = session.submit(&client).await.unwrap_err();

    match err.downcast_ref::<ClientError>() {
        Some(ClientError::Relay(detail)) => {
            assert_eq!(detail["message"], "Incorrect API key provided")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(session.transcript().entries().len(), 1);
    assert_eq!(session.draft(), "Hello");
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_non_json_reply_is_decode_error() {
    let mut relay = mockito::Server::new_async().await;
    let _mock = relay
        .mock("POST", "/api/prompt")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let client = RelayClient::new(format!("{}/api/prompt", relay.url()));
    let err = client.send_prompt("Hello").await.unwrap_err();

    assert!(matches!(err, ClientError::Decode(message) if message.contains("502")));
}

#[tokio::test]
async fn test_unreachable_relay_is_transport_error() {
    let client = RelayClient::new("http://127.0.0.1:9/api/prompt");
    let mut session = ChatSession::new(GREETING);
    session.set_draft("Hello");

    let err = session.submit(&client).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<ClientError>(), Some(ClientError::Transport(_))));
    assert_eq!(session.transcript().entries().len(), 1);
    assert_eq!(session.draft(), "Hello");
}
