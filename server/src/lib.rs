//! torwache-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod rest;

use std::sync::Arc;

use anyhow::Result;

use config::ServerConfig;
use rest::{AppState, CookieKonfig};
use torwache_auth::{bereinigung_starten, AuthService};
use torwache_db::SqliteDb;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Auth-Konfiguration pruefen
    /// 2. Datenbank oeffnen und migrieren
    /// 3. Bereinigung des Refresh-Token-Ledgers starten
    /// 4. REST-API starten
    /// 5. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        let auth_konfig = self.config.auth_konfig()?;
        let bind = self.config.api_bind_adresse();

        tracing::info!(url = %self.config.datenbank.url, "Datenbankverbindung wird hergestellt");
        let db = Arc::new(SqliteDb::oeffnen(&self.config.datenbank_konfig()).await?);

        let cookie = CookieKonfig {
            secure: self.config.auth.cookie_secure,
            max_age_sek: auth_konfig.refresh_token_ttl.num_seconds(),
        };
        let auth = AuthService::neu(Arc::clone(&db), Arc::clone(&db), auth_konfig)?;

        let bereinigung = self.config.bereinigung.aktiviert.then(|| {
            bereinigung_starten(Arc::clone(&db), self.config.bereinigungs_konfig())
        });

        let app = rest::router(
            AppState::neu(Arc::new(auth), cookie),
            &self.config.netzwerk.cors_origins,
        );

        let listener = tokio::net::TcpListener::bind(&bind).await?;
        tracing::info!(adresse = %bind, "REST-API bereit");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(handle) = bereinigung {
            handle.abort();
        }
        tracing::info!("Server beendet");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown-Signal empfangen"),
        Err(e) => tracing::error!(fehler = %e, "Signal-Handler nicht verfuegbar"),
    }
}
