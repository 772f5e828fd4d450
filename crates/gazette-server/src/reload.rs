//! Live reload over WebSocket.

use std::path::{Path, PathBuf};

use gazette_static::ReloadNotifier;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// WebSocket endpoint browsers connect to.
pub const RELOAD_SOCKET_PATH: &str = "/__livereload";

/// Route serving [`reload_client_script`].
pub const RELOAD_SCRIPT_PATH: &str = "/__livereload.js";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// A file under the build directory was written
    Reload {
        /// URL path of the written file
        path: String,
    },

    /// Connection established
    Connected,
}

/// Hub for broadcasting reloads to all connected browsers.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    build_dir: PathBuf,
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    /// Create a hub for files written under `build_dir`.
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            build_dir: build_dir.into(),
            sender,
        }
    }

    /// Send a message to all connected browsers.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// URL path a written file is served at.
    pub fn url_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.build_dir).unwrap_or(path);

        let mut segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let directory = segments.last().is_some_and(|s| s == "index.html");
        if directory {
            segments.pop();
        }

        let mut url = format!("/{}", segments.join("/"));
        if directory && url.len() > 1 {
            url.push('/');
        }
        url
    }
}

impl ReloadNotifier for ReloadHub {
    fn reload(&self, path: &Path) {
        let url = self.url_for(path);
        tracing::debug!("Reload {}", url);
        self.send(ReloadMessage::Reload { path: url });
    }
}

/// Client-side live reload script.
///
/// Connects back to the serving host, so it works whatever address the
/// server is bound to. A burst of reload messages reloads the page once.
pub fn reload_client_script() -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
  const ws = new WebSocket(scheme + location.host + '{}');
  let pending = null;

  ws.onmessage = function(event) {{
    const msg = JSON.parse(event.data);

    switch (msg.type) {{
      case 'reload':
        console.log('[livereload]', msg.path);
        if (pending === null) {{
          pending = setTimeout(function() {{ location.reload(); }}, 100);
        }}
        break;

      case 'connected':
        console.log('[livereload] Connected');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[livereload] Disconnected, retrying');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
"#,
        RELOAD_SOCKET_PATH
    )
}

/// Insert the client script tag into an HTML page, before `</body>` when
/// there is one.
pub fn inject_client_script(html: &str) -> String {
    let tag = format!(r#"<script src="{}"></script>"#, RELOAD_SCRIPT_PATH);

    match html.rfind("</body>") {
        Some(at) => {
            let mut injected = String::with_capacity(html.len() + tag.len());
            injected.push_str(&html[..at]);
            injected.push_str(&tag);
            injected.push_str(&html[at..]);
            injected
        }
        None => format!("{}{}", html, tag),
    }
}
