//! End-to-end contracts for the primary search pipeline
//!
//! Exercises the write hook through the public facade: weighted-field
//! ranking, filter semantics, highlighting and fuzzy suggestion.

use vintry::{
    AttrValue, Catalog, CatalogSchema, Error, QueryRequest, Record, RecordId, SuggestRequest,
    WeightTier,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn wine_schema() -> CatalogSchema {
    CatalogSchema::builder()
        .text_field("variety", WeightTier::A)
        .text_field("winery", WeightTier::B)
        .text_field("description", WeightTier::D)
        .filter_field("country")
        .filter_field("points")
        .build()
}

fn wine(variety: &str, winery: &str, description: &str) -> Record {
    Record::new(RecordId::new())
        .with_field("variety", variety)
        .with_field("winery", winery)
        .with_field("description", description)
}

// ============================================================================
// Weighted-field ranking
// ============================================================================

/// A record carrying the query term in its top-tier field must outrank
/// one where the term only appears in the description.
#[test]
fn test_variety_match_outranks_description_match() {
    let catalog = Catalog::new(wine_schema());

    let merlot = wine("Merlot", "Staglin", "earthy and bold");
    let merlot_id = merlot.id;
    let blend = wine("Red Blend", "Duckhorn", "merlot driven and plummy");
    let blend_id = blend.id;
    let unrelated = wine("Riesling", "Dr. Loosen", "bright and sweet");
    catalog.save(merlot);
    catalog.save(blend);
    catalog.save(unrelated);

    let response = catalog.query(&QueryRequest::new("merlot")).unwrap();
    assert_eq!(response.hits.len(), 2);
    assert_eq!(response.hits[0].id, merlot_id);
    assert_eq!(response.hits[1].id, blend_id);
    assert!(response.hits[0].score > response.hits[1].score);
    assert_eq!(response.hits[0].rank, 1);
    assert_eq!(response.hits[1].rank, 2);
}

/// A term present in two weighted fields accumulates both contributions.
#[test]
fn test_term_in_two_fields_accumulates() {
    let catalog = Catalog::new(wine_schema());

    let twice = wine("Merlot", "Old Vine", "classic merlot profile");
    let twice_id = twice.id;
    let once = wine("Merlot", "New Vine", "classic profile");
    catalog.save(twice);
    catalog.save(once);

    let response = catalog.query(&QueryRequest::new("merlot")).unwrap();
    assert_eq!(response.hits[0].id, twice_id);
}

/// Morphological variants of indexed terms match through stemming.
#[test]
fn test_query_matches_through_stemming() {
    let catalog = Catalog::new(wine_schema());
    let record = wine("Merlot", "Staglin", "firm tannins throughout");
    let id = record.id;
    catalog.save(record);

    let response = catalog.query(&QueryRequest::new("tannin")).unwrap();
    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].id, id);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filters_are_hard_predicates() {
    let catalog = Catalog::new(wine_schema());

    let us = wine("Merlot", "Staglin", "earthy").with_attr("country", "US");
    let us_id = us.id;
    let fr = wine("Merlot", "Petrus", "silky").with_attr("country", "FR");
    catalog.save(us);
    catalog.save(fr);

    let response = catalog
        .query(&QueryRequest::new("merlot").with_filter("country", "US"))
        .unwrap();
    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].id, us_id);
}

#[test]
fn test_unknown_filter_field_is_validation_error() {
    let catalog = Catalog::new(wine_schema());
    catalog.save(wine("Merlot", "Staglin", "earthy"));

    let err = catalog
        .query(&QueryRequest::new("merlot").with_filter("region", "Napa"))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownFilterField { field } if field == "region"));
}

#[test]
fn test_pure_filter_query_matches_all_passing() {
    let catalog = Catalog::new(wine_schema());
    for points in [88i64, 91, 95] {
        catalog.save(
            wine("Merlot", "Staglin", "earthy").with_attr("points", points),
        );
    }

    let response = catalog
        .query(&QueryRequest::new("").with_filter("points", AttrValue::Int(91)))
        .unwrap();
    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].score, 0.0);

    // Empty text and no filters matches nothing
    let blank = catalog.query(&QueryRequest::new("")).unwrap();
    assert!(blank.is_empty());
}

// ============================================================================
// Highlighting
// ============================================================================

#[test]
fn test_highlighting_end_to_end() {
    let catalog = Catalog::new(wine_schema());
    catalog.save(wine("Merlot", "Staglin", "This wine is raw, chewy."));

    let response = catalog
        .query(&QueryRequest::new("chewy").with_highlight("<mark>", "</mark>"))
        .unwrap();
    assert_eq!(response.hits.len(), 1);
    assert_eq!(
        response.hits[0].highlights.get("description").map(String::as_str),
        Some("This wine is raw, <mark>chewy</mark>.")
    );
}

#[test]
fn test_highlighting_leaves_unmatched_fields_untouched() {
    let catalog = Catalog::new(wine_schema());
    catalog.save(wine("Merlot", "Staglin", "earthy and bold"));

    let response = catalog
        .query(&QueryRequest::new("earthy").with_highlight("<em>", "</em>"))
        .unwrap();
    let highlights = &response.hits[0].highlights;
    assert_eq!(
        highlights.get("description").map(String::as_str),
        Some("<em>earthy</em> and bold")
    );
    assert_eq!(highlights.get("variety").map(String::as_str), Some("Merlot"));
    assert_eq!(highlights.get("winery").map(String::as_str), Some("Staglin"));
}

#[test]
fn test_no_highlight_requested_means_no_highlights() {
    let catalog = Catalog::new(wine_schema());
    catalog.save(wine("Merlot", "Staglin", "earthy and bold"));

    let response = catalog.query(&QueryRequest::new("earthy")).unwrap();
    assert!(response.hits[0].highlights.is_empty());
}

// ============================================================================
// Suggestion
// ============================================================================

#[test]
fn test_misspelled_term_suggestion() {
    let catalog = Catalog::new(wine_schema());
    catalog.save(wine("Cabernet Sauvignon", "Staglin", "dark fruit"));

    let suggestions = catalog
        .suggest(&SuggestRequest::new("cabernay").with_min_similarity(0.3))
        .unwrap();
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].term, "cabernet");
    assert!(suggestions[0].score >= 0.3);
}

#[test]
fn test_suggestions_survive_record_deletion() {
    let catalog = Catalog::new(wine_schema());
    let record = wine("Cabernet Sauvignon", "Staglin", "dark fruit");
    let id = record.id;
    catalog.save(record);
    catalog.remove(&id).unwrap();

    // The vocabulary is append-only: deleting the only record keeps the
    // suggestion quality stable
    let suggestions = catalog.suggest(&SuggestRequest::new("cabernay")).unwrap();
    assert_eq!(suggestions[0].term, "cabernet");

    // While the index itself no longer matches
    assert!(catalog.query(&QueryRequest::new("cabernet")).unwrap().is_empty());
}

// ============================================================================
// Read-after-write
// ============================================================================

#[test]
fn test_write_path_is_synchronous() {
    let catalog = Catalog::new(wine_schema());
    let index = catalog.primary_index();
    let v0 = index.version();

    catalog.save(wine("Merlot", "Staglin", "earthy"));

    // Vector build, index upsert and vocabulary ingestion all completed
    // before save() returned
    assert!(index.version() > v0);
    assert_eq!(index.total_docs(), 1);
    assert!(!catalog.query(&QueryRequest::new("merlot")).unwrap().is_empty());
    assert!(catalog.vocabulary().contains("earthi"));
}
