//! Watch mode: build, serve the build directory, rebuild on change.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

use gazette_static::{SiteBuilder, Task};

use crate::reload::{
    inject_client_script, reload_client_script, ReloadHub, ReloadMessage, RELOAD_SCRIPT_PATH,
    RELOAD_SOCKET_PATH,
};
use crate::rules::WatchRules;
use crate::watcher::FileWatcher;

/// Largest page read back for script injection.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

/// Configuration for watch mode.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,

    /// Quiet period that closes a batch of file changes
    pub debounce: Duration,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            open: true,
            debounce: Duration::from_millis(100),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Watch-mode server.
pub struct DevServer {
    config: DevServerConfig,
    builder: SiteBuilder,
}

impl DevServer {
    /// Create a server around `builder`. Its reload notifier is replaced by
    /// the server's own.
    pub fn new(config: DevServerConfig, builder: SiteBuilder) -> Self {
        Self { config, builder }
    }

    /// Build everything, then serve and rebuild until the process exits.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr_str = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|_| ServerError::InvalidAddress(addr_str.clone()))?;

        let build_dir = self.builder.config().build_dir.clone();
        let hub = Arc::new(ReloadHub::new(build_dir.clone()));
        let mut builder = self.builder.with_notifier(hub.clone());

        match builder.run(Task::Build).await {
            Ok(result) => tracing::info!(
                "Built {} pages in {}ms",
                result.pages,
                result.duration_ms
            ),
            // Keep watching so the failure can be fixed in place
            Err(e) => tracing::error!("Initial build failed: {}", e),
        }

        let rules = WatchRules::for_site(builder.config());
        let (watcher, rx) = FileWatcher::new(&rules.watched_paths(), self.config.debounce)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let builder = Arc::new(Mutex::new(builder));
        tokio::spawn(async move {
            rebuild_on_change(builder, rules, rx).await;
            // Keep watcher alive
            drop(watcher);
        });

        let app = router(build_dir, hub);

        tracing::info!("Serving at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Run the tasks each batch of changes triggers. Failures are logged and
/// watching continues.
async fn rebuild_on_change(
    builder: Arc<Mutex<SiteBuilder>>,
    rules: WatchRules,
    mut rx: tokio::sync::mpsc::Receiver<Vec<crate::watcher::WatchEvent>>,
) {
    while let Some(batch) = rx.recv().await {
        let changed: Vec<PathBuf> = batch.iter().map(|e| e.path().to_path_buf()).collect();
        let tasks = rules.tasks_for(&changed);
        if tasks.is_empty() {
            continue;
        }

        for path in &changed {
            tracing::info!("Changed: {}", path.display());
        }

        let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        tracing::info!("Running {}", names.join(", "));

        let mut builder = builder.lock().await;
        match builder.run_all(&tasks).await {
            Ok(result) => tracing::info!(
                "Rebuilt {} pages ({} unchanged) in {}ms",
                result.pages,
                result.skipped,
                result.duration_ms
            ),
            Err(e) => tracing::error!("Rebuild failed: {}", e),
        }
    }
}

/// Routes for the reload socket and script, falling back to the build
/// directory with the script injected into HTML pages.
fn router(build_dir: PathBuf, hub: Arc<ReloadHub>) -> Router {
    Router::new()
        .route(RELOAD_SOCKET_PATH, get(ws_handler))
        .route(RELOAD_SCRIPT_PATH, get(script_handler))
        .fallback_service(ServeDir::new(build_dir))
        .layer(middleware::from_fn(inject_reload_script))
        .with_state(hub)
}

async fn inject_reload_script(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if response.status() != StatusCode::OK || !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read page for reload script: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_client_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(html))
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<ReloadHub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, hub))
}

/// Forward reload messages to one browser.
async fn handle_ws(mut socket: WebSocket, hub: Arc<ReloadHub>) {
    let mut rx = hub.subscribe();

    if !send(&mut socket, &ReloadMessage::Connected).await {
        return;
    }

    while let Some(msg) = next_message(&mut rx).await {
        if !send(&mut socket, &msg).await {
            break;
        }
    }
}

/// Next message for one browser. Messages it fell behind on are skipped,
/// any later one reloads the page all the same.
async fn next_message(rx: &mut broadcast::Receiver<ReloadMessage>) -> Option<ReloadMessage> {
    loop {
        match rx.recv().await {
            Ok(msg) => return Some(msg),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Live reload client skipped {} messages", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn send(socket: &mut WebSocket, msg: &ReloadMessage) -> bool {
    let Ok(json) = serde_json::to_string(msg) else {
        return false;
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        reload_client_script(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_static::{ReloadNotifier, SiteConfig};

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(
            DevServerConfig::default(),
            SiteBuilder::new(SiteConfig::default()),
        );

        assert_eq!(server.config.port, 8080);
        assert_eq!(server.config.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn lagging_client_keeps_receiving() {
        let hub = ReloadHub::new("build");
        let mut rx = hub.subscribe();

        for i in 0..150 {
            hub.reload(std::path::Path::new(&format!("build/p{}/index.html", i)));
        }

        assert_eq!(
            next_message(&mut rx).await,
            Some(ReloadMessage::Reload {
                path: "/p50/".to_string()
            })
        );

        drop(hub);
        let mut remaining = 0;
        while next_message(&mut rx).await.is_some() {
            remaining += 1;
        }
        assert_eq!(remaining, 99);
    }

    /// Serve `router` on an ephemeral port and return the raw response to a
    /// GET of `path`.
    async fn fetch(build_dir: &std::path::Path, path: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let app = router(build_dir.to_path_buf(), Arc::new(ReloadHub::new(build_dir)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, addr
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn build_dir() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join("index.html"),
            "<html><body><p>Hi</p></body></html>",
        )
        .unwrap();
        std::fs::create_dir_all(temp.path().join("styles")).unwrap();
        std::fs::write(temp.path().join("styles/site.css"), "p{color:red}</body>").unwrap();
        temp
    }

    #[tokio::test]
    async fn injects_reload_script_into_pages() {
        let temp = build_dir();

        let response = fetch(temp.path(), "/").await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(
            r#"<p>Hi</p><script src="/__livereload.js"></script></body></html>"#
        ));
    }

    #[tokio::test]
    async fn serves_other_files_unchanged() {
        let temp = build_dir();

        let response = fetch(temp.path(), "/styles/site.css").await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("p{color:red}</body>"));
        assert!(!response.contains("__livereload.js"));
    }

    #[tokio::test]
    async fn serves_client_script() {
        let temp = build_dir();

        let response = fetch(temp.path(), "/__livereload.js").await;

        assert!(response.contains("application/javascript"));
        assert!(response.contains("new WebSocket"));
    }

    #[tokio::test]
    async fn missing_pages_are_not_found() {
        let temp = build_dir();

        let response = fetch(temp.path(), "/nope/").await;

        assert!(response.starts_with("HTTP/1.1 404"));
        assert!(!response.contains("__livereload.js"));
    }

    #[tokio::test]
    async fn rejects_invalid_address() {
        let config = DevServerConfig {
            host: "not a host".to_string(),
            open: false,
            ..Default::default()
        };
        let server = DevServer::new(config, SiteBuilder::new(SiteConfig::default()));

        let err = server.start().await.unwrap_err();

        assert!(matches!(err, ServerError::InvalidAddress(_)));
    }
}
