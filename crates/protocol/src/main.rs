#[tokio::main]
async fn main() {
    protocol::start(std::env::args()).await;
}
