#![deny(rust_2018_idioms)]

use hfp_core::init_tracing;
use web_api::{settings::Settings, startup::App};

#[tokio::main]
async fn main() {
    let settings = Settings::new().unwrap();
    init_tracing(settings.log_level);

    let app = App::build(&settings).await.unwrap();

    app.run().await.unwrap();
}
