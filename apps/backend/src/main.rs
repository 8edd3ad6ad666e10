#[tokio::main]
async fn main() -> anyhow::Result<()> {
    homework_flashcards_backend::run().await
}
