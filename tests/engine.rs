use lexscore::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NAMES: [&str; 4] = [
  "patio sofa",
  "leather sofa",
  "sofa cover",
  "garden lamp",
];
const DESCRIPTIONS: [&str; 4] = [
  "weatherproof outdoor sofa with cushions",
  "a sofa for the living room",
  "keeps your outdoor sofa dry",
  "solar lamp for the garden",
];
const CATEGORIES: [&str; 4] = [
  "Outdoor Furniture",
  "Living Room Furniture",
  "Outdoor Furniture",
  "Outdoor Lighting",
];
const SUB_CATEGORIES: [&str; 4] = ["Patio Sofas", "Sofas", "Covers", "Lamps"];

fn corpus(engine: &LexicalEngine) -> Corpus {
  let mut corpus = Corpus::new(NAMES.len());
  engine.index_field(&mut corpus, "name", &NAMES).unwrap();
  engine.index_field(&mut corpus, "description", &DESCRIPTIONS).unwrap();
  engine.index_field(&mut corpus, "category", &CATEGORIES).unwrap();
  engine.index_field(&mut corpus, "sub_category", &SUB_CATEGORIES).unwrap();
  corpus
}

fn text_rules(aggregation: Aggregation, operator: BoolOp) -> SearchRules {
  SearchRules::builder()
    .field("name", FieldRule::new().boost(9.3))
    .field("description", FieldRule::new().boost(4.1))
    .aggregation(aggregation)
    .operator(operator)
    .build()
    .unwrap()
}

fn engine(aggregation: Aggregation, operator: BoolOp) -> LexicalEngine {
  LexicalEngine::builder()
    .rules(text_rules(aggregation, operator))
    .build()
    .unwrap()
}

fn ids(hits: &[RankedHit]) -> Vec<DocId> {
  hits.iter().map(|h| h.doc_id).collect()
}

fn patio(_: &str) -> Classification {
  Classification::new("Outdoor Furniture", "Patio Sofas")
}

#[test]
fn test_and_support_is_subset_of_or() {
  let or = engine(Aggregation::default(), BoolOp::Or);
  let and = engine(Aggregation::default(), BoolOp::And);
  let corpus = corpus(&or);

  let any = or.scores(&corpus, "outdoor sofa").unwrap().support();
  let all = and.scores(&corpus, "outdoor sofa").unwrap().support();
  assert_eq!(any, vec![0, 1, 2]);
  assert_eq!(all, vec![0, 2]);
  assert!(all.iter().all(|d| any.contains(d)));
}

#[test]
fn test_field_centric_dominates_term_centric() {
  let sum = engine(Aggregation::FieldCentric, BoolOp::Or);
  let max = engine(Aggregation::default(), BoolOp::Or);
  let corpus = corpus(&sum);

  let a = sum.scores(&corpus, "sofa lamp garden").unwrap();
  let b = max.scores(&corpus, "sofa lamp garden").unwrap();
  for (s, m) in a.iter().zip(b.iter()) {
    assert!(s >= m);
  }
}

#[test]
fn test_category_boosts_rank_classified_products_first() {
  let engine = LexicalEngine::builder()
    .rules(
      SearchRules::builder()
        .field("name", FieldRule::new())
        .build()
        .unwrap(),
    )
    .boosts(CategoryBoosts::new(patio, "category", "sub_category"))
    .build()
    .unwrap();
  let corpus = corpus(&engine);

  let scores = engine.scores(&corpus, "sofa").unwrap();
  // All three sofa names have the same length, so only the boosts differ.
  assert!((scores[0] - scores[1] - 15.0).abs() < 1e-4);
  assert!((scores[2] - scores[1] - 10.0).abs() < 1e-4);
  // "Outdoor Lighting" does not contain the phrase "outdoor furniture".
  assert_eq!(scores[3], 0.0);

  let hits = engine.search(&corpus, "sofa").unwrap();
  assert_eq!(ids(&hits), vec![0, 2, 1]);
}

#[test]
fn test_boost_with_unknown_field_or_empty_label_is_ignored() {
  let bad = |_: &str| {
    vec![
      Boost::new("brand", "acme", 100.0),
      Boost::new("category", "!!!", 100.0),
    ]
  };
  let boosted = LexicalEngine::builder()
    .rules(text_rules(Aggregation::default(), BoolOp::Or))
    .boosts(bad)
    .build()
    .unwrap();
  let plain = engine(Aggregation::default(), BoolOp::Or);
  let corpus = corpus(&plain);

  assert_eq!(
    boosted.scores(&corpus, "sofa").unwrap(),
    plain.scores(&corpus, "sofa").unwrap()
  );
}

#[test]
fn test_cached_classifier_is_called_once_per_query() {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let classifier = move |q: &str| {
    counter.fetch_add(1, Ordering::SeqCst);
    patio(q)
  };
  let provider = CategoryBoosts::new(classifier, "category", "sub_category");
  let engine = LexicalEngine::builder()
    .boosts(CachedBoosts::new(provider, 16).unwrap())
    .build()
    .unwrap();
  let corpus = corpus(&engine);

  for _ in 0..3 {
    engine.search(&corpus, "sofa").unwrap();
  }
  engine.search(&corpus, "lamp").unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_rules_from_json() {
  let rules = SearchRules::from_json(
    r#"{
      "fields": {
        "name": { "boost": 2.0, "b": 0.3 },
        "description": {}
      },
      "aggregation": { "type": "bm25f", "k1": 1.2, "b": 0.75 },
      "operator": "and",
      "limit": 1
    }"#,
  )
  .unwrap();
  let engine = LexicalEngine::builder().rules(rules).build().unwrap();
  let corpus = corpus(&engine);

  let hits = engine.search(&corpus, "outdoor sofa").unwrap();
  assert_eq!(hits.len(), 1);
  assert!(hits[0].doc_id == 0 || hits[0].doc_id == 2);
}

#[test]
fn test_unknown_rule_field_is_an_error() {
  let engine = LexicalEngine::builder()
    .rules(
      SearchRules::builder()
        .field("title", FieldRule::new())
        .build()
        .unwrap(),
    )
    .build()
    .unwrap();
  let corpus = corpus(&engine);
  assert!(matches!(
    engine.search(&corpus, "sofa"),
    Err(Error::UnknownField(name)) if name == "title"
  ));
}

#[test]
fn test_all_fields_used_without_field_rules() {
  let engine = LexicalEngine::builder().build().unwrap();
  let corpus = corpus(&engine);
  // "furniture" only appears in the category field.
  let mut found = ids(&engine.search(&corpus, "furniture").unwrap());
  found.sort();
  assert_eq!(found, vec![0, 1, 2]);
}

#[test]
fn test_empty_and_unmatched_queries() {
  let engine = engine(Aggregation::default(), BoolOp::Or);
  let corpus = corpus(&engine);
  assert!(engine.search(&corpus, "").unwrap().is_empty());
  assert!(engine.search(&corpus, "?!").unwrap().is_empty());
  assert!(engine.search(&corpus, "hammock").unwrap().is_empty());
  assert!(engine.search_k(&corpus, "sofa", 0).unwrap().is_empty());
}

#[test]
fn test_search_tokens_matches_search() {
  let engine = engine(Aggregation::FieldCentric, BoolOp::Or);
  let corpus = corpus(&engine);
  let tokens = vec!["outdoor".to_string(), "sofa".to_string()];
  assert_eq!(
    engine.search_tokens(&corpus, &tokens, 10).unwrap(),
    engine.search_k(&corpus, "Outdoor, sofa!", 10).unwrap()
  );
}

#[test]
fn test_batch_matches_individual_searches() {
  let engine = engine(Aggregation::default(), BoolOp::Or);
  let corpus = corpus(&engine);
  let queries = ["sofa", "garden lamp", "hammock"];
  let batch = engine.search_batch(&corpus, &queries).unwrap();
  for (query, hits) in queries.iter().zip(&batch) {
    assert_eq!(hits, &engine.search(&corpus, query).unwrap());
  }
}

#[test]
fn test_explain_adds_up() {
  let engine = LexicalEngine::builder()
    .rules(text_rules(Aggregation::FieldCentric, BoolOp::Or))
    .boosts(CategoryBoosts::new(patio, "category", "sub_category"))
    .build()
    .unwrap();
  let corpus = corpus(&engine);

  let explanation = engine.explain(&corpus, "outdoor sofa", 0).unwrap();
  assert_eq!(explanation.tokens.len(), 2);
  assert_eq!(explanation.boosts.len(), 2);

  let mut total = 0.0;
  for token in &explanation.tokens {
    let fields: f32 = token.fields.iter().map(|f| f.score).sum();
    assert!((fields - token.score).abs() < 1e-4);
    total += token.score;
  }
  total += explanation.boosts.iter().map(|b| b.amount).sum::<f32>();
  assert!((explanation.score - total).abs() < 1e-4);

  let outdoor = &explanation.tokens[0];
  assert_eq!(outdoor.fields[0].field, "description");
  assert_eq!(outdoor.fields[1].score, 0.0);
}

#[test]
fn test_every_qualified_category_boosts() {
  let classifier = |_: &str| {
    Classification::from_qualified([
      "Outdoor Furniture / Patio Sofas",
      "Living Room Furniture / Sofas",
    ])
  };
  let engine = LexicalEngine::builder()
    .rules(
      SearchRules::builder()
        .field("name", FieldRule::new())
        .build()
        .unwrap(),
    )
    .boosts(CategoryBoosts::new(classifier, "category", "sub_category"))
    .build()
    .unwrap();
  let corpus = corpus(&engine);

  let scores = engine.scores(&corpus, "sofa").unwrap();
  // Doc 2 only gets the outdoor category. The "sofas" label also matches
  // "patio sofas", so doc 0 collects both sub-category boosts.
  assert!((scores[0] - scores[2] - 10.0).abs() < 1e-4);
  assert!((scores[1] - scores[2] - 5.0).abs() < 1e-4);
  assert_eq!(scores[3], 0.0);
}

#[test]
fn test_min_match_scales_partial_matches() {
  let plain = engine(Aggregation::default(), BoolOp::Or);
  let soft = LexicalEngine::builder()
    .rules(
      SearchRules::builder()
        .field("name", FieldRule::new().boost(9.3))
        .field("description", FieldRule::new().boost(4.1))
        .min_match(MinMatch::default())
        .build()
        .unwrap(),
    )
    .build()
    .unwrap();
  let corpus = corpus(&plain);

  // Three tokens require 1.5 matches: doc 1 only has "sofa".
  let query = "outdoor sofa cushions";
  let a = plain.scores(&corpus, query).unwrap();
  let b = soft.scores(&corpus, query).unwrap();
  assert_eq!(b[0], a[0]);
  assert_eq!(b[2], a[2]);
  assert!((b[1] - a[1] * 0.8).abs() < 1e-6);
  assert!(b[1] > 0.0);

  let explanation = soft.explain(&corpus, query, 1).unwrap();
  assert!(explanation.penalized);
  assert!(!soft.explain(&corpus, query, 0).unwrap().penalized);
}

#[test]
fn test_explain_asks_provider_once() {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let provider = move |_: &str| {
    counter.fetch_add(1, Ordering::SeqCst);
    vec![Boost::new("category", "outdoor furniture", 1.0)]
  };
  let engine = LexicalEngine::builder().boosts(provider).build().unwrap();
  let corpus = corpus(&engine);

  let explanation = engine.explain(&corpus, "sofa", 0).unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(explanation.boosts.len(), 1);
}
