//! Fetch → select → build, packaged for presentation.
//!
//! `render` is the only function that touches the network; everything on
//! `ViewModel` is pure and testable.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{FallbackChain, Origin};
use crate::flow::{self, Direction, FlowGraph, FlowRecord, Selection};
use crate::logging::{self, obj, v_str, Domain, ProfileScope};

pub const TITLE: &str = "Coin-to-Coin Volume Flows";

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone, Serialize)]
pub struct ViewModel {
    pub title: String,
    /// Dropdown options: every token present in the fetched data.
    pub tokens: Vec<String>,
    pub selection: Selection,
    pub origin: Origin,
    pub graph: FlowGraph,
}

pub async fn render(cfg: &Config, selection: &Selection) -> Result<ViewModel> {
    let chain = FallbackChain::from_config(cfg)?;
    render_with(&chain, selection, cfg.top_k).await
}

/// Render and write the page to `cfg.output_path`. Nothing is written when
/// the render fails.
pub async fn write_page(cfg: &Config, selection: &Selection) -> Result<PathBuf> {
    let vm = render(cfg, selection).await?;
    let path = PathBuf::from(&cfg.output_path);
    std::fs::write(&path, vm.to_html())?;
    logging::info(
        Domain::View,
        "written",
        obj(&[
            ("path", v_str(&path.display().to_string())),
            ("origin", v_str(vm.origin.as_str())),
            ("labels", json!(vm.graph.labels.len())),
            ("edges", json!(vm.graph.edges.len())),
        ]),
    );
    Ok(path)
}

pub async fn render_with(chain: &FallbackChain, selection: &Selection, top_k: usize) -> Result<ViewModel> {
    let _scope = ProfileScope::new("render");
    let outcome = chain.fetch().await?;
    Ok(ViewModel::from_records(&outcome.records, selection, outcome.origin, top_k))
}

impl ViewModel {
    pub fn from_records(records: &[FlowRecord], selection: &Selection, origin: Origin, top_k: usize) -> Self {
        let tokens = flow::tokens(records);
        if let Some(token) = selection.token.as_deref() {
            if !tokens.iter().any(|t| t == token) {
                logging::warn(
                    Domain::Graph,
                    "unknown_token",
                    obj(&[("token", v_str(token)), ("msg", v_str("selected token not present in data"))]),
                );
            }
        }
        let selected = flow::select(records, selection, top_k);
        let graph = flow::build(&selected);
        logging::info(
            Domain::Graph,
            "built",
            obj(&[
                ("origin", v_str(origin.as_str())),
                ("records", json!(records.len())),
                ("selected", json!(selected.len())),
                ("labels", json!(graph.labels.len())),
            ]),
        );
        Self {
            title: TITLE.to_string(),
            tokens,
            selection: selection.clone(),
            origin,
            graph,
        }
    }

    /// Plotly Sankey figure (`data` + `layout`).
    pub fn figure(&self) -> Value {
        let (sources, targets, values): (Vec<usize>, Vec<usize>, Vec<f64>) = self
            .graph
            .edges
            .iter()
            .fold((vec![], vec![], vec![]), |(mut s, mut t, mut v), e| {
                s.push(e.source);
                t.push(e.target);
                v.push(e.value);
                (s, t, v)
            });
        json!({
            "data": [{
                "type": "sankey",
                "node": {
                    "pad": 15,
                    "thickness": 20,
                    "line": {"color": "black", "width": 0.5},
                    "label": self.graph.labels,
                },
                "link": {
                    "source": sources,
                    "target": targets,
                    "value": values,
                },
            }],
            "layout": {
                "title": {"text": self.heading()},
                "font": {"size": 10},
            },
        })
    }

    fn heading(&self) -> String {
        match (&self.selection.token, self.selection.direction) {
            (None, _) => format!("{} (top {})", self.title, self.graph.edges.len()),
            (Some(t), Direction::Both) => format!("{}: {}", self.title, t),
            (Some(t), d) => format!("{}: {} {}", self.title, t, d.as_str()),
        }
    }

    pub fn to_html(&self) -> String {
        let _scope = ProfileScope::new("to_html");
        let figure = self.figure().to_string().replace('<', "\\u003c");

        let mut token_options = String::from("<option value=\"\">All tokens</option>");
        for t in &self.tokens {
            let selected = if self.selection.token.as_deref() == Some(t.as_str()) { " selected" } else { "" };
            token_options.push_str(&format!(
                "<option value=\"{0}\"{1}>{0}</option>",
                escape_html(t),
                selected
            ));
        }
        let mut direction_options = String::new();
        for d in [Direction::Both, Direction::Inflow, Direction::Outflow] {
            let selected = if self.selection.direction == d { " selected" } else { "" };
            direction_options.push_str(&format!("<option value=\"{0}\"{1}>{0}</option>", d.as_str(), selected));
        }
        let notice = match self.origin {
            Origin::Primary => String::new(),
            Origin::Market => "<p class=\"notice\">Primary source unavailable; showing market-volume estimates.</p>".to_string(),
            Origin::Static => "<p class=\"notice\">All sources unavailable; showing illustrative sample data.</p>".to_string(),
        };
        let empty = if self.graph.is_empty() {
            "<p class=\"notice\">No flows for this selection.</p>"
        } else {
            ""
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<h1>{title}</h1>
{notice}
<form method="get">
<label>Token <select name="token" onchange="this.form.submit()">{token_options}</select></label>
<label>Direction <select name="direction" onchange="this.form.submit()">{direction_options}</select></label>
</form>
{empty}
<div id="sankey" style="width:100%;height:640px"></div>
<script>
const fig = {figure};
Plotly.newPlot("sankey", fig.data, fig.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
            title = escape_html(&self.title),
            cdn = PLOTLY_CDN,
            notice = notice,
            token_options = token_options,
            direction_options = direction_options,
            empty = empty,
            figure = figure,
        )
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
