//src/main.rs

use std::{net::SocketAddr, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use classificados::{
    config::{AppState, Settings},
    routes::build_router,
    services::{
        seed::{run_seed, SeedOptions},
        upload_audit::audit_uploads,
    },
};

#[derive(Debug, Parser)]
#[command(name = "classificados", version, about = "Backend de anúncios classificados")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sobe o servidor HTTP (padrão)
    Serve,
    /// Audita o diretório de uploads contra os anúncios cadastrados
    AuditUploads {
        /// Tamanho máximo aceitável por arquivo, em MB (padrão: MAX_UPLOAD_BYTES)
        #[arg(long)]
        max_size_mb: Option<u64>,
        /// Relatório em JSON
        #[arg(long)]
        json: bool,
    },
    /// Cria usuários e anúncios de teste
    Seed {
        #[arg(long, default_value_t = 20)]
        anuncios: usize,
        #[arg(long, requires = "admin_password")]
        admin_email: Option<String>,
        #[arg(long, requires = "admin_email")]
        admin_password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Inicializa o logger (RUST_LOG, padrão "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Command::Serve)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("🔥 {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    match command {
        Command::Serve => serve(settings).await,
        Command::AuditUploads { max_size_mb, json } => {
            let max_bytes = max_size_mb
                .map(megabytes_to_bytes)
                .unwrap_or(settings.max_upload_bytes as u64);
            let app_state = AppState::new(settings).await?;
            if app_state.storage_backend == "memory" {
                tracing::warn!("⚠️ Sem banco configurado: todos os arquivos vão aparecer como órfãos");
            }

            let report = audit_uploads(
                app_state.upload_service.storage(),
                app_state.anuncio_service.repo().as_ref(),
                max_bytes,
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
            Ok(())
        }
        Command::Seed { anuncios, admin_email, admin_password } => {
            let app_state = AppState::new(settings).await?;
            let options = SeedOptions { anuncios, admin_email, admin_password };
            let summary = {
                let mut rng = rand::rngs::StdRng::from_entropy();
                run_seed(&app_state.auth_service, &app_state.anuncio_service, &options, &mut rng).await?
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let port = settings.port;
    let refresh_every = settings.showcase_refresh;

    let app_state = AppState::new(settings).await?;
    app_state.upload_service.storage().ensure_dir().await?;

    // Primeira carga + recargas periódicas da vitrine
    app_state
        .showcase
        .spawn_refresher(app_state.anuncio_service.repo().clone(), refresh_every);

    let app = build_router(app_state);

    // Inicia o servidor
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    tracing::info!("👋 Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("🔥 Falha ao escutar o sinal de encerramento: {}", e);
    }
}

// --max-size-mb vem do usuário: satura em vez de estourar
fn megabytes_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_max_size_saturates() {
        assert_eq!(megabytes_to_bytes(10), 10 * 1024 * 1024);
        assert_eq!(megabytes_to_bytes(u64::MAX), u64::MAX);
    }
}
