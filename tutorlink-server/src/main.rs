use tutorlink_server::Server;
use tutorlink_transport::Role;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing subscriber with environment filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorlink_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args.iter().any(|v| v == "--seed");
    let addr = args
        .iter()
        .find(|v| !v.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "0.0.0.0:8081".to_string());
    tracing::info!(?addr, "Starting server");
    let server = Server::new(&addr).await?;
    if seed {
        seed_accounts(&server).await;
    }
    server.run().await?;
    Ok(())
}

async fn seed_accounts(server: &Server) {
    let accounts = [
        ("Nguyen Linh", "linh@tutorlink.dev", Role::Tutor, "tutor-token"),
        ("Tran Minh", "minh@tutorlink.dev", Role::Student, "student-token"),
        ("Le Hoa", "hoa@tutorlink.dev", Role::Student, "student2-token"),
    ];
    for (name, email, role, token) in accounts {
        let user = server.register_user(name, email, role, token).await;
        tracing::info!(user_id = user.id, %role, token, "Seeded account");
    }
}
