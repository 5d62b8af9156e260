use filterable::core::FilterableApp;

#[tokio::main]
async fn main() {
    if let Err(e) = FilterableApp::run().await {
        eprintln!("\nError: {:#}\n", e);
        std::process::exit(1);
    }
}
