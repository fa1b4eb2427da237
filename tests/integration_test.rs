// Integration tests for bizmatch
use async_trait::async_trait;
use bizmatch::prelude::*;
use bizmatch_eval::judge::{BEST_MATCH_PROMPT, DESCRIPTION_JUDGE_PROMPT};
use bizmatch_eval::COLUMNS;
use std::collections::HashMap;
use std::sync::Arc;

fn catalog() -> CatalogIndex {
    let index = CatalogIndex::new(CatalogConfig::default());
    index
        .index_batch(vec![
            BusinessRecord::new(1u64, "Starbucks").with_localized_name("Старбакс"),
            BusinessRecord::new(2u64, "Costa Coffee"),
            BusinessRecord::new(3u64, "АТБ"),
            BusinessRecord::new(4u64, "Сільпо").with_localized_name("Silpo"),
        ])
        .unwrap();
    index
}

/// Language model answering from per-input tables
struct TableModel {
    main: HashMap<&'static str, &'static str>,
    business: HashMap<&'static str, &'static str>,
    datetime: HashMap<&'static str, &'static str>,
}

#[async_trait]
impl LanguageModel for TableModel {
    async fn complete(&self, system: &str, user: &str, _model: Option<&str>) -> bizmatch_extract::Result<String> {
        let prompts = PromptSet::default();
        let missing = || ExtractError::Transport(format!("no reply for {user}"));
        if system == prompts.main {
            self.main.get(user).map(|r| r.to_string()).ok_or_else(missing)
        } else if system == prompts.business {
            self.business.get(user).map(|r| r.to_string()).ok_or_else(missing)
        } else if system == DESCRIPTION_JUDGE_PROMPT {
            let payload: serde_json::Value = serde_json::from_str(user).unwrap();
            let same = payload["ground_truth"] == payload["predicted"];
            Ok(format!(r#"{{"match": {same}}}"#))
        } else if system == BEST_MATCH_PROMPT {
            let payload: serde_json::Value = serde_json::from_str(user).unwrap();
            let first = payload["business_list"][0].as_str().unwrap_or_default().to_string();
            Ok(serde_json::json!({ "best_match": first }).to_string())
        } else {
            self.datetime.get(user).map(|r| r.to_string()).ok_or_else(missing)
        }
    }
}

const LATTE: &str = "лате в старбаксі за 150 гривень";
const BREAD: &str = "хліб в атб вчора";
const UNKNOWN: &str = "щось купив";

fn model() -> TableModel {
    TableModel {
        main: HashMap::from([
            (LATTE, r#"{"description": "лате", "amount": 150, "currency": "гривня"}"#),
            (BREAD, r#"{"description": "хліб", "amount": null, "currency": null}"#),
        ]),
        business: HashMap::from([
            (LATTE, r#"{"business": "Старбакс", "language": "uk", "uk_lemma": "Старбакс"}"#),
            (BREAD, r#"{"business": "АТБ", "language": "uk"}"#),
            (UNKNOWN, r#"{"business": null}"#),
        ]),
        datetime: HashMap::from([
            (LATTE, r#"{"time": null, "action": "+"}"#),
            (BREAD, r#"{"time": null, "action": "-", "days": 1}"#),
        ]),
    }
}

fn dataset_csv() -> String {
    format!(
        "Input text,Business,Datetime,Description,Amount,Currency\n\
         {LATTE},Starbucks,2025-10-01T14:32:10Z,лате,150,гривня\n\
         {BREAD},АТБ,2025-09-30T14:32:10+00:00,хліб,,\n\
         {UNKNOWN},Сільпо,2025-10-01T10:00:00Z,продукти,300,\n"
    )
}

#[test]
fn test_catalog_matches_across_scripts() {
    let index = catalog();
    assert_eq!(index.len(), 4);

    let hits = index.search("Starbaks");
    assert_eq!(hits[0].name, "Starbucks");

    let hits = index.search("старбакс");
    assert_eq!(hits[0].id, BusinessId::Integer(1));

    assert!(index.search("").is_empty());
}

#[tokio::test]
async fn test_matcher_merges_spellings() {
    let matcher = BusinessMatcher::new(Arc::new(catalog()));
    let terms = vec!["Silpo".to_string(), "Сільпо".to_string(), "Silpo".to_string()];
    let candidates = matcher.match_all(&terms).await;

    let ids: Vec<&BusinessId> = candidates.iter().map(|c| &c.id).collect();
    assert_eq!(ids.iter().filter(|id| ***id == BusinessId::Integer(4)).count(), 1);
    assert_eq!(candidates.as_slice()[0].name, "Сільпо");
}

#[tokio::test]
async fn test_extract_draft() {
    let extractor = Extractor::new(Arc::new(model()), BusinessMatcher::new(Arc::new(catalog())));
    let reference = bizmatch_extract::parse_reference("2025-10-01T14:32:10Z").unwrap();

    let draft = extractor.extract(BREAD, &reference).await;
    assert_eq!(draft.amount, 0.0);
    assert_eq!(draft.currency, bizmatch_extract::DEFAULT_CURRENCY);
    assert_eq!(draft.datetime, "2025-09-30T14:32:10+00:00");
    assert_eq!(draft.businesses[0].name, "АТБ");
}

#[tokio::test]
async fn test_evaluation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("eval_data.csv");
    let catalog_path = dir.path().join("businesses.json");
    let report_path = dir.path().join("eval.csv");

    std::fs::write(&data_path, dataset_csv()).unwrap();
    let records = vec![
        BusinessRecord::new(1u64, "Starbucks").with_localized_name("Старбакс"),
        BusinessRecord::new(3u64, "АТБ"),
        BusinessRecord::new("silpo", "Сільпо"),
    ];
    std::fs::write(&catalog_path, serde_json::to_string(&records).unwrap()).unwrap();

    let index = CatalogIndex::new(CatalogConfig::default());
    assert_eq!(index.load_json(&catalog_path).unwrap(), 3);

    let llm = Arc::new(model());
    let extractor = Extractor::new(llm.clone(), BusinessMatcher::new(Arc::new(index)));
    let judge = ExtractionJudge::new(llm);
    let orchestrator = EvalOrchestrator::new(extractor, judge, EvalConfig::default()).unwrap();

    let rows = load_rows(&data_path).unwrap();
    let results = orchestrator.run_evaluation(&rows, 2).await;
    assert_eq!(results.len(), 3);

    let latte = &results[0];
    assert_eq!(latte.input_text, LATTE);
    assert!(latte.business_matched);
    assert_eq!(latte.business_position, Some(1));
    assert!(latte.best_candidate_matched);
    assert!(latte.datetime_matched);
    assert!(latte.description_matched);
    assert!(latte.amount_matched);
    assert!(latte.currency_matched);

    let bread = &results[1];
    assert!(bread.business_matched);
    assert!(bread.datetime_matched);
    assert_eq!(bread.extracted_amount, "");
    assert!(bread.amount_matched);

    // no usable fields for this row
    let unknown = &results[2];
    assert!(!unknown.business_matched);
    assert_eq!(unknown.business_position, None);
    assert_eq!(unknown.extracted_datetime, "2025-10-01T14:32:10+00:00");
    assert!(!unknown.datetime_matched);
    assert!(!unknown.amount_matched);
    assert!(unknown.currency_matched);

    write_results(&report_path, &results).unwrap();
    let header = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(header.lines().next().unwrap(), COLUMNS.join(","));

    let reread = read_results(&report_path).unwrap();
    assert_eq!(reread, results);

    let report = aggregate(&reread);
    assert_eq!(report.get(Metric::BusinessAccuracy), 2.0 / 3.0);
    assert_eq!(report.get(Metric::AmountAccuracy), 2.0 / 3.0);
    assert_eq!(report.get(Metric::CurrencyAccuracy), 1.0);
    assert_eq!(report, aggregate(&results));
}
