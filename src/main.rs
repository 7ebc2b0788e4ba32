use shelter::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    shelter::init_tracing();

    let app_state = AppState::init().await?;
    app::serve(app::build_app(app_state)).await
}
