//! Graph-building and selection invariants over generated record sets.

use std::collections::HashSet;

use coinflow::flow::{build, inflows, outflows, select, tokens, Direction, FlowRecord, Selection, DEFAULT_TOP_K};

const TOKENS: [&str; 8] = ["USDT", "USDC", "BTC", "ETH", "SOL", "BNB", "XRP", "DOGE"];

/// xorshift64, deterministic per seed
struct Gen(u64);

impl Gen {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn token(&mut self) -> &'static str {
        TOKENS[(self.next() % TOKENS.len() as u64) as usize]
    }

    fn records(&mut self, n: usize) -> Vec<FlowRecord> {
        (0..n)
            .map(|_| {
                let value = (self.next() % 50) as f64;
                FlowRecord::new(self.token(), self.token(), value)
            })
            .collect()
    }
}

fn samples() -> Vec<Vec<FlowRecord>> {
    (1..=40u64).map(|seed| Gen(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)).records(1 + (seed as usize * 7) % 60)).collect()
}

#[test]
fn labels_are_unique_and_cover_every_token() {
    for recs in samples() {
        let g = build(&recs);
        let unique: HashSet<&String> = g.labels.iter().collect();
        assert_eq!(unique.len(), g.labels.len(), "duplicate label");

        let distinct: HashSet<&str> = recs.iter().flat_map(|r| [r.source.as_str(), r.target.as_str()]).collect();
        assert_eq!(g.labels.len(), distinct.len());
        assert_eq!(tokens(&recs).len(), distinct.len());
    }
}

#[test]
fn edges_point_back_to_their_records() {
    for recs in samples() {
        let g = build(&recs);
        assert_eq!(g.edges.len(), recs.len());
        for (edge, rec) in g.edges.iter().zip(&recs) {
            assert_eq!(g.label_of(edge.source), Some(rec.source.as_str()));
            assert_eq!(g.label_of(edge.target), Some(rec.target.as_str()));
            assert_eq!(edge.value, rec.value);
        }
    }
}

#[test]
fn build_is_deterministic() {
    for recs in samples() {
        assert_eq!(build(&recs), build(&recs));
    }
}

#[test]
fn partitions_are_filtered_sorted_and_bounded() {
    for recs in samples() {
        for token in TOKENS {
            let ins = inflows(&recs, token, DEFAULT_TOP_K);
            let outs = outflows(&recs, token, DEFAULT_TOP_K);
            assert!(ins.len() <= DEFAULT_TOP_K && outs.len() <= DEFAULT_TOP_K);
            assert!(ins.iter().all(|r| r.target == token));
            assert!(outs.iter().all(|r| r.source == token));
            assert!(ins.windows(2).all(|w| w[0].value >= w[1].value));
            assert!(outs.windows(2).all(|w| w[0].value >= w[1].value));

            let expected = recs.iter().filter(|r| r.target == token).count().min(DEFAULT_TOP_K);
            assert_eq!(ins.len(), expected);
        }
    }
}

#[test]
fn usdt_outflows_in_value_order() {
    let recs = vec![
        FlowRecord::new("USDT", "BTC", 100.0),
        FlowRecord::new("USDT", "ETH", 50.0),
        FlowRecord::new("BTC", "ETH", 30.0),
    ];
    let g = build(&recs);
    assert_eq!(g.labels.len(), 3);
    assert_eq!(g.edges.len(), 3);

    let sel = Selection {
        token: Some("USDT".to_string()),
        direction: Direction::Outflow,
    };
    assert_eq!(
        select(&recs, &sel, DEFAULT_TOP_K),
        vec![FlowRecord::new("USDT", "BTC", 100.0), FlowRecord::new("USDT", "ETH", 50.0)]
    );
}

#[test]
fn equal_values_keep_input_order() {
    let recs: Vec<FlowRecord> = ["A", "B", "C", "D"].iter().map(|s| FlowRecord::new(*s, "X", 5.0)).collect();
    let ins = inflows(&recs, "X", 3);
    let order: Vec<&str> = ins.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(order, vec!["A", "B", "C"]);
}
