//! Flow dashboard server
//!
//! Run with: cargo run --bin flow_server

use anyhow::Result;
use coinflow::config::Config;
use coinflow::logging::{self, obj, v_str, Domain};
use coinflow::server::{serve, Dashboard};
use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env()?;
    let dashboard = Dashboard::from_config(&cfg)?;
    let listener = TcpListener::bind(cfg.bind_addr.as_str()).await?;

    logging::info(
        Domain::Server,
        "listening",
        obj(&[
            ("addr", v_str(&cfg.bind_addr)),
            ("source", v_str(cfg.source.as_str())),
            ("msg", v_str(&format!("Flow dashboard running at http://{}", cfg.bind_addr))),
        ]),
    );

    serve(dashboard, listener).await?;
    Ok(())
}
