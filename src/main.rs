#[tokio::main]
async fn main() {
  if let Err(e) = body_age::run().await {
    eprintln!("body-age: {}", e);
    std::process::exit(1);
  }
}
