//! Retrieval integration tests
//!
//! Exercises the retriever against the built-in clinic table and the
//! two-entry table used by the serverless chat handler.

use std::sync::Arc;

use concierge_core::knowledge::{
    KnowledgeBase, KnowledgeEntry, Retriever, ScoringVariant, retrieve,
};

fn builtin() -> Arc<KnowledgeBase> {
    Arc::new(KnowledgeBase::builtin().unwrap())
}

fn handler_table() -> Arc<KnowledgeBase> {
    Arc::new(
        KnowledgeBase::new(vec![
            KnowledgeEntry::new(
                1,
                "VisiMedica Core",
                "Digital Twin",
                "VisiMedica's Digital Twin is a comprehensive, dynamic virtual model of your biology. It integrates data from genomic sequencing, advanced diagnostics, real-time wearable inputs, and physiological monitoring to create a high-fidelity representation of your health. The AI engine analyzes this data to predict health trajectories, identify risks before they become problems, and generate personalized optimization strategies for longevity and peak performance.",
            ),
            KnowledgeEntry::new(
                2,
                "VisiMedica Core",
                "5-Stage Journey",
                "Building your Digital Twin involves 5 comprehensive stages: 1) Personal Profile (tablet-guided with AI Companion, covering supplements, medications, exercise, diet), 2) Mind Assessment (cognitive function, stress biomarkers, mental wellbeing), 3) Body Composition (advanced imaging for muscle, fat, bone density), 4) Blood Analysis (metabolic panels, hormones, nutrients, inflammatory markers), 5) Genetic Blueprint (genomic sequencing for predispositions and optimization). Each stage is supported by Dr. Chowdhury and the clinical team.",
            ),
        ])
        .unwrap(),
    )
}

const QUERIES: [&str; 10] = [
    "What services do you offer?",
    "I have a headache",
    "How do I schedule an appointment?",
    "I feel anxious and stressed",
    "digital twin",
    "",
    " ",
    "\n",
    "the",
    "sudden severe headache",
];

#[test]
fn test_result_size_bounded() {
    let knowledge = builtin();
    for variant in ScoringVariant::ALL {
        let retriever = Retriever::new(knowledge.clone(), variant);
        for query in QUERIES {
            for k in [1, 3, 5, 40] {
                let results = retriever.retrieve(query, k);
                assert!(results.len() <= k.min(knowledge.len()), "{variant} {query:?} {k}");
            }
        }
    }
}

#[test]
fn test_scores_non_increasing_and_above_threshold() {
    let knowledge = builtin();
    for variant in ScoringVariant::ALL {
        let retriever = Retriever::new(knowledge.clone(), variant);
        for query in QUERIES {
            let results = retriever.retrieve_scored(query, 10);
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score, "{variant} {query:?}");
            }
            for scored in &results {
                assert!(scored.score > variant.threshold(), "{variant} {query:?}");
            }
        }
    }
}

#[test]
fn test_empty_query_returns_nothing() {
    let knowledge = builtin();
    for variant in ScoringVariant::ALL {
        let retriever = Retriever::new(knowledge.clone(), variant);
        assert!(retriever.retrieve("", 3).is_empty());
        assert!(retrieve("", knowledge.entries(), 3, variant).is_empty());
        for blank in [" ", "\n", " \t "] {
            assert!(retriever.retrieve(blank, 3).is_empty(), "{variant} {blank:?}");
            assert!(retrieve(blank, knowledge.entries(), 3, variant).is_empty());
        }
    }
}

#[test]
fn test_retrieval_is_idempotent() {
    let knowledge = builtin();
    for variant in ScoringVariant::ALL {
        let retriever = Retriever::new(knowledge.clone(), variant);
        for query in QUERIES {
            assert_eq!(retriever.retrieve(query, 3), retriever.retrieve(query, 3));
        }
    }
}

#[test]
fn test_overlap_ranks_digital_twin_above_journey() {
    let retriever = Retriever::new(handler_table(), ScoringVariant::Overlap);
    let ranked = retriever.rank("What is the Digital Twin?");

    assert_eq!(ranked[0].entry.topic, "Digital Twin");
    assert_eq!(ranked[1].entry.topic, "5-Stage Journey");
    assert!(ranked[0].score > ranked[1].score);
}

#[test]
fn test_overlap_threshold_can_exclude_everything() {
    // Long passages dilute the normalised overlap below 0.1
    let retriever = Retriever::new(handler_table(), ScoringVariant::Overlap);
    assert!(retriever.retrieve("What is the Digital Twin?", 3).is_empty());
}

#[test]
fn test_overlap_short_query_on_short_entry() {
    let knowledge = Arc::new(
        KnowledgeBase::new(vec![
            KnowledgeEntry::new(1, "Core", "Digital Twin", "virtual model of your biology"),
            KnowledgeEntry::new(2, "Core", "Blood Analysis", "metabolic panels and hormones"),
        ])
        .unwrap(),
    );
    let retriever = Retriever::new(knowledge, ScoringVariant::Overlap);
    let results = retriever.retrieve("digital twin", 3);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 1);
}

#[test]
fn test_keyword_headache_scores_small_integer() {
    let knowledge = builtin();
    let retriever = Retriever::new(knowledge, ScoringVariant::Keyword);
    let ranked = retriever.rank("I have a headache");

    let headaches = ranked
        .iter()
        .find(|s| s.entry.topic == "Headaches")
        .unwrap();
    assert!(headaches.score >= 1.0);
    assert!(headaches.score < 10.0);
    assert_eq!(headaches.score.fract(), 0.0);

    let results = retriever.retrieve("I have a headache", 3);
    assert_eq!(results[0].topic, "Headaches");
}

#[test]
fn test_keyword_verbatim_query_dominates() {
    let retriever = Retriever::new(builtin(), ScoringVariant::Keyword);
    let scored = retriever.retrieve_scored("sudden severe headache", 3);

    assert_eq!(scored[0].entry.topic, "Headaches");
    assert!(scored[0].score >= 10.0);
}

#[test]
fn test_fewer_qualifying_entries_than_top_k() {
    let retriever = Retriever::new(builtin(), ScoringVariant::Keyword);
    let results = retriever.retrieve("diabetes", 5);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].topic, "Diabetes Management");
}

#[test]
fn test_concurrent_callers_share_one_retriever() {
    let retriever = Arc::new(Retriever::new(builtin(), ScoringVariant::Keyword));
    let expected = retriever.retrieve("I have a headache", 3);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let retriever = Arc::clone(&retriever);
            std::thread::spawn(move || retriever.retrieve("I have a headache", 3))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
