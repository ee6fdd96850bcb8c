use anyhow::Result;
use coinflow::config::Config;
use coinflow::error::DashboardError;
use coinflow::flow::Selection;
use coinflow::logging::{self, obj, v_str, Domain};
use coinflow::view;
use serde_json::json;

async fn run() -> Result<()> {
    let cfg = Config::from_env()?;
    logging::info(
        Domain::System,
        "start",
        obj(&[
            ("source", v_str(cfg.source.as_str())),
            ("fallback", json!(cfg.fallback_enabled)),
            ("top_k", json!(cfg.top_k)),
        ]),
    );

    let selection = Selection {
        token: cfg.token.clone(),
        direction: cfg.direction,
    };
    view::write_page(&cfg, &selection).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        let kind = err.downcast_ref::<DashboardError>().map(|e| e.kind()).unwrap_or("other");
        logging::log(
            logging::Level::Fatal,
            Domain::System,
            "halt",
            obj(&[("kind", v_str(kind)), ("msg", v_str(&format!("{:#}", err)))]),
        );
        std::process::exit(1);
    }
}
