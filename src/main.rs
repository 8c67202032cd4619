use bulk_cards::config::{AppConfig, RendererKind};
use bulk_cards::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // ── Directories ─────────────────────────────────────────────────────
    for dir in [
        &config.paths.assets_dir,
        &config.paths.output_dir,
        &config.paths.uploads_dir,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }

    eprintln!("📬 Bulk Cards v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Transport: {}", config.transport.name());
    match config.card.renderer {
        RendererKind::Image => {
            eprintln!("   Renderer: image");
            eprintln!("   Template: {}", config.paths.template_path().display());
            match &config.card.font_path {
                Some(path) => eprintln!("   Font: {}", path.display()),
                None => eprintln!("   Font: bundled DejaVu Sans Bold"),
            }
            if !config.paths.template_path().exists() {
                eprintln!("   Warning: template missing, upload one via /api/upload-template");
            }
        }
        RendererKind::Markup => eprintln!("   Renderer: markup"),
    }
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Progress WS: ws://0.0.0.0:{}/ws\n", config.port);

    // ── HTTP Server ─────────────────────────────────────────────────────
    let port = config.port;
    let app = server::routes(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Bulk Cards server started");
    axum::serve(listener, app).await?;

    Ok(())
}
