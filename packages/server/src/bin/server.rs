//! idobata chat backend server.
//!
//! Multi-room chat engine exposed over HTTP and WebSocket: room lifecycle,
//! ordered message history, read receipts, unread counters, and live
//! fan-out to subscribed connections.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-server
//! cargo run --bin idobata-server -- --host 0.0.0.0 --port 3000
//! cargo run --bin idobata-server -- --user-service-url http://localhost:8081
//! ```

use std::sync::Arc;

use clap::Parser;
use idobata_server::{
    domain::IdentityResolver,
    infrastructure::{
        identity::{HttpIdentityResolver, StaticIdentityResolver},
        pusher::ChannelMessagePusher,
        store::{InMemoryMessageStore, InMemoryRoomStore},
    },
    ui::Server,
    usecase::{Broadcaster, MessageService, RoomManager},
};
use idobata_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "idobata-server")]
#[command(about = "Multi-room chat backend with live fan-out", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Base URL of the user service for display-name resolution.
    /// When omitted, every user falls back to the placeholder name.
    #[arg(long)]
    user_service_url: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Clock and stores
    // 2. IdentityResolver
    // 3. MessagePusher and Broadcaster
    // 4. MessageService and RoomManager
    // 5. Server

    // 1. Create stores (in-memory database)
    let clock = Arc::new(SystemClock);
    let room_store = Arc::new(InMemoryRoomStore::new());
    let message_store = Arc::new(InMemoryMessageStore::new(clock.clone()));

    // 2. Create IdentityResolver
    let identity: Arc<dyn IdentityResolver> = match args.user_service_url {
        Some(url) => {
            tracing::info!("Resolving display names via user service at {}", url);
            Arc::new(HttpIdentityResolver::new(url))
        }
        None => {
            tracing::info!("No user service configured, using placeholder display names");
            Arc::new(StaticIdentityResolver::empty())
        }
    };

    // 3. Create MessagePusher and Broadcaster
    let pusher = Arc::new(ChannelMessagePusher::new());
    let broadcaster = Arc::new(Broadcaster::new(pusher, identity.clone()));

    // 4. Create services
    let message_service = Arc::new(MessageService::new(
        room_store.clone(),
        message_store,
        broadcaster.clone(),
    ));
    let room_manager = Arc::new(RoomManager::new(
        room_store,
        message_service.clone(),
        identity.clone(),
        clock,
    ));

    // 5. Create and run the server
    let server = Server::new(room_manager, message_service, broadcaster, identity);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
