// oracle_leaks/oracle_server/src/server.rs

use std::sync::Arc;
use std::time::Duration;
use log::{info, warn};
use tokio::net::TcpListener;
use crate::context::OracleContext;
use crate::session::serve_session;

/// Accepts connections forever, one task per connection. A failing session
/// only ever tears down itself.
pub async fn serve(listener: TcpListener, ctx: Arc<OracleContext>, session_timeout: Duration) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("accept failed: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            warn!("session {}: cannot disable Nagle: {}", peer, e);
        }

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let peer = peer.to_string();
            info!("session {} opened", peer);
            // Outcome already logged at the session boundary.
            let _ = serve_session(&ctx, stream, &peer, session_timeout).await;
        });
    }
}
