//! View model rendering and the page markup.

use coinflow::fetch::{static_records, FallbackChain, FlowSource, Origin};
use coinflow::flow::{Direction, FlowRecord, Selection};
use coinflow::view::{render_with, ViewModel};

struct Fixed(Vec<FlowRecord>);

#[async_trait::async_trait]
impl FlowSource for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }
    async fn fetch(&self) -> coinflow::error::Result<Vec<FlowRecord>> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn render_applies_top_k_and_selection() {
    let recs: Vec<FlowRecord> = (0..25).map(|i| FlowRecord::new("USDT", format!("T{:02}", i), i as f64)).collect();
    let chain = FallbackChain::strict(Box::new(Fixed(recs)));

    let vm = render_with(&chain, &Selection::default(), 10).await.unwrap();
    assert_eq!(vm.origin, Origin::Primary);
    assert_eq!(vm.tokens.len(), 26);
    assert_eq!(vm.graph.edges.len(), 10);
    assert_eq!(vm.graph.edges[0].value, 24.0);

    let sel = Selection {
        token: Some("T03".to_string()),
        direction: Direction::Inflow,
    };
    let vm = render_with(&chain, &sel, 10).await.unwrap();
    assert_eq!(vm.graph.labels, vec!["USDT", "T03"]);
}

#[test]
fn page_embeds_figure_and_dropdown() {
    let vm = ViewModel::from_records(&static_records(), &Selection::default(), Origin::Static, 10);
    let html = vm.to_html();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("\"type\":\"sankey\""));
    assert!(html.contains("Plotly.newPlot"));
    for token in &vm.tokens {
        assert!(html.contains(&format!("<option value=\"{0}\">{0}</option>", token)));
    }
}

#[test]
fn view_model_serializes_for_api_clients() {
    let vm = ViewModel::from_records(&static_records(), &Selection::default(), Origin::Market, 3);
    let v = serde_json::to_value(&vm).unwrap();
    assert_eq!(v["origin"], "market");
    assert_eq!(v["selection"]["direction"], "both");
    assert_eq!(v["graph"]["edges"].as_array().unwrap().len(), 3);
}
