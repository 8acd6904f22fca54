//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Make GET requests with the free constructors
//! - Make POST requests with a JSON body through a `Client`
//! - Access the decoded text, parsed body and metadata
//!
//! Run with: `cargo run --example basic_call`

use serde::{Deserialize, Serialize};
use simpler_agent::{Client, Error};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("simpler_agent=debug,basic_call=info")
        .init();

    println!("=== GET Request Example ===");
    let response = simpler_agent::get("https://jsonplaceholder.typicode.com/posts/1").await?;

    println!("Title: {}", response.body["title"]);
    println!("Request latency: {:?}", response.latency);
    println!("Status code: {}", response.status);

    // The same body, typed.
    match response.json::<Post>() {
        Ok(post) => println!("Typed post ID: {}", post.id),
        Err(e) => println!("Unexpected shape: {}", e),
    }
    println!();

    println!("=== POST Request Example ===");
    let client = Client::builder()
        .prefix("https://jsonplaceholder.typicode.com")?
        .default_header("Accept", "application/json")
        .build()?;

    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let response = client.post("/posts").json(&new_post).await?;

    println!("Created post ID: {}", response.body["id"]);
    println!("Request latency: {:?}", response.latency);
    println!();

    println!("=== Accessing Response Metadata ===");
    println!("Raw response length: {} bytes", response.text.len());
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Was retried: {}", response.was_retried());

    Ok(())
}
