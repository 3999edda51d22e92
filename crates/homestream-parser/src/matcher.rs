//! Fuzzy title matching over provider search results.

/// Anything with a display title that can be ranked against a query.
pub trait Candidate {
    fn title(&self) -> &str;
}

impl Candidate for String {
    fn title(&self) -> &str {
        self
    }
}

impl Candidate for &str {
    fn title(&self) -> &str {
        self
    }
}

/// Pick the candidate whose title has the smallest Levenshtein distance to
/// `query`.
///
/// Ties keep the earliest candidate, so the provider's own ranking decides
/// between equally close titles. An empty slice yields `None`.
pub fn best_match<'a, C: Candidate>(query: &str, candidates: &'a [C]) -> Option<&'a C> {
    best_match_with_distance(query, candidates).map(|(candidate, _)| candidate)
}

/// Like [`best_match`], also returning the winning distance.
pub fn best_match_with_distance<'a, C: Candidate>(
    query: &str,
    candidates: &'a [C],
) -> Option<(&'a C, usize)> {
    let mut best: Option<(&'a C, usize)> = None;

    for candidate in candidates {
        let distance = strsim::levenshtein(query, candidate.title());
        match best {
            Some((_, current)) if current <= distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hit {
        id: u64,
        title: &'static str,
    }

    impl Candidate for Hit {
        fn title(&self) -> &str {
            self.title
        }
    }

    #[test]
    fn picks_closest_title() {
        let hits = [
            Hit {
                id: 1,
                title: "The Matrix Reloaded",
            },
            Hit {
                id: 2,
                title: "The Matrix",
            },
        ];
        let best = best_match("The Matrix", &hits).unwrap();
        assert_eq!(best.id, 2);
    }

    #[test]
    fn empty_candidates() {
        let hits: [Hit; 0] = [];
        assert!(best_match("anything", &hits).is_none());
    }

    #[test]
    fn ties_keep_provider_order() {
        let hits = [
            Hit {
                id: 7,
                title: "Dune",
            },
            Hit {
                id: 8,
                title: "Dune",
            },
        ];
        assert_eq!(best_match("Dune", &hits).unwrap().id, 7);
    }

    #[test]
    fn reports_distance() {
        let hits = ["Interstellar".to_string(), "Interstella 5555".to_string()];
        let (best, distance) = best_match_with_distance("Interstellar", &hits).unwrap();
        assert_eq!(best, "Interstellar");
        assert_eq!(distance, 0);
    }

    #[test]
    fn far_candidate_still_wins_when_alone() {
        let hits = ["Completely Different"];
        let (best, distance) = best_match_with_distance("Alien", &hits).unwrap();
        assert_eq!(*best, "Completely Different");
        assert!(distance > 0);
    }
}
