use indexmap::IndexMap;
use proptest::collection::vec;
use proptest::prelude::*;

use persona_bench::export::export_results;
use persona_bench::presenter::{al_curve_chart, best_method, comparison_table, metric_cards};
use persona_bench::{EvaluationResults, MethodResult, Metrics};

fn method_strategy() -> impl Strategy<Value = (u8, u8, u8, Vec<u8>)> {
    (0u8..=100, 0u8..=100, 0u8..=100, vec(0u8..=100, 0..8))
}

fn results_strategy() -> impl Strategy<Value = EvaluationResults> {
    (vec(method_strategy(), 1..6), 0u64..10_000).prop_map(|(methods, sessions)| {
        let mut map = IndexMap::new();
        for (i, (avg, n_ir, n_r2, curve)) in methods.into_iter().enumerate() {
            map.insert(
                format!("M{i}"),
                MethodResult::new(
                    Metrics::new(avg as f64, n_ir as f64, n_r2 as f64),
                    curve.into_iter().map(f64::from).collect(),
                ),
            );
        }
        EvaluationResults {
            task_id: "prop".into(),
            total_sessions: sessions,
            methods: map,
            radar_data: IndexMap::new(),
            extra: Default::default(),
        }
    })
}

proptest! {
    #[test]
    fn best_method_is_first_maximum(results in results_strategy()) {
        let best = best_method(&results).unwrap();
        let max = results.methods.values().map(|m| m.metrics.avg).fold(f64::MIN, f64::max);
        let first = results
            .methods
            .iter()
            .find(|(_, m)| m.metrics.avg == max)
            .map(|(name, _)| name.as_str())
            .unwrap();
        prop_assert_eq!(best, first);
    }

    #[test]
    fn exactly_one_card_per_method_plus_sessions(results in results_strategy()) {
        let cards = metric_cards(&results);
        prop_assert_eq!(cards.len(), results.methods.len() + 1);
        prop_assert_eq!(cards.iter().filter(|c| c.is_best()).count(), 1);
    }

    #[test]
    fn turn_labels_follow_longest_curve(results in results_strategy()) {
        let chart = al_curve_chart(&results);
        let longest = results.methods.values().map(|m| m.al_curve.len()).max().unwrap_or(0);
        prop_assert_eq!(chart.labels.len(), longest);
        for (ds, method) in chart.datasets.iter().zip(results.methods.values()) {
            prop_assert_eq!(&ds.data, &method.al_curve);
        }
    }

    #[test]
    fn highlighted_cells_are_column_maxima(results in results_strategy()) {
        let table = comparison_table(&results);
        for col in 0..table.columns.len() {
            let max = table.rows.iter().map(|r| r.cells[col].value).fold(f64::MIN, f64::max);
            for row in &table.rows {
                prop_assert_eq!(row.cells[col].best, row.cells[col].value == max);
            }
            prop_assert!(table.rows.iter().any(|r| r.cells[col].best));
        }
    }

    #[test]
    fn export_reparses_to_same_payload(results in results_strategy()) {
        let file = export_results(&results).unwrap();
        prop_assert_eq!(file.filename, "benchmark_results_prop.json");
        let back: EvaluationResults = serde_json::from_str(&file.contents).unwrap();
        prop_assert_eq!(back, results);
    }
}
