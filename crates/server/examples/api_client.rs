//! Walk through the pdfchat server API: open a session, ask two questions,
//! clear the history.

use reqwest::Client;
use serde_json::{json, Value};

const SERVER_URL: &str = "http://localhost:8501";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("2. Open Session:");
    let session: Value = client
        .post(format!("{SERVER_URL}/api/sessions"))
        .send()
        .await?
        .json()
        .await?;
    let id = session["session_id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("no session_id in {session}"))?
        .to_string();
    println!("Session: {id}");
    println!("Greeting: {}", session["messages"][0]["content"]);
    println!();

    for (n, question) in ["Give me a health tip", "What is psychology?"]
        .iter()
        .enumerate()
    {
        println!("{}. Ask: {question}", n + 3);
        let reply: Value = client
            .post(format!("{SERVER_URL}/api/sessions/{id}/messages"))
            .json(&json!({ "content": question }))
            .send()
            .await?
            .json()
            .await?;
        println!("Reply: {}", reply["reply"]);
        println!();
    }

    println!("5. Clear Chat History:");
    let cleared: Value = client
        .delete(format!("{SERVER_URL}/api/sessions/{id}/messages"))
        .send()
        .await?
        .json()
        .await?;
    println!("Messages left: {}", cleared["messages"]);

    Ok(())
}
