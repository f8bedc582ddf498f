use extract::{ExtractionResult, parse_response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hint::black_box;
use std::time::Instant;

use crate::test_set::{Expected, Fixture, FixtureCategory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub total_fixtures: usize,
    pub fields: FieldAccuracy,
    pub by_category: Vec<CategoryScore>,
    pub parse_time: ParseTiming,
    pub misses: Vec<Miss>,
}

/// Share of fixtures (0.0 to 1.0) where each field matched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldAccuracy {
    pub disease_name: f64,
    pub disease_icd_code: f64,
    pub medicine_name: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub count: usize,
    pub accuracy: FieldAccuracy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseTiming {
    pub iterations: usize,
    pub mean_us: f64,
    pub p50_us: f64,
    pub p95_us: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Miss {
    pub fixture: String,
    pub field: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

#[derive(Default)]
struct Tally {
    count: usize,
    hits: [usize; 3],
}

impl Tally {
    fn accuracy(&self) -> FieldAccuracy {
        if self.count == 0 {
            return FieldAccuracy::default();
        }
        let rate = |hits: usize| hits as f64 / self.count as f64;
        FieldAccuracy {
            disease_name: rate(self.hits[0]),
            disease_icd_code: rate(self.hits[1]),
            medicine_name: rate(self.hits[2]),
            overall: rate(self.hits.iter().sum::<usize>()) / 3.0,
        }
    }
}

pub struct Benchmarker {
    iterations: usize,
}

impl Benchmarker {
    /// `iterations` parses per fixture feed the timing figures.
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn run(&self, fixtures: &[Fixture]) -> BenchmarkReport {
        let mut total = Tally::default();
        let mut by_category: HashMap<FixtureCategory, Tally> = HashMap::new();
        let mut misses = Vec::new();
        let mut timings_us = Vec::with_capacity(fixtures.len() * self.iterations);

        for fixture in fixtures {
            let result = parse_response(&fixture.response);
            for _ in 0..self.iterations {
                let start = Instant::now();
                black_box(parse_response(black_box(&fixture.response)));
                timings_us.push(start.elapsed().as_secs_f64() * 1_000_000.0);
            }

            let category = by_category.entry(fixture.category).or_default();
            total.count += 1;
            category.count += 1;

            for (slot, (field, expected, actual)) in field_pairs(&fixture.expected, &result)
                .into_iter()
                .enumerate()
            {
                if field_matches(expected, actual) {
                    total.hits[slot] += 1;
                    category.hits[slot] += 1;
                } else {
                    misses.push(Miss {
                        fixture: fixture.name.clone(),
                        field: field.to_string(),
                        expected: expected.map(str::to_string),
                        actual: actual.map(str::to_string),
                    });
                }
            }
        }

        let by_category = FixtureCategory::ALL
            .iter()
            .filter_map(|category| {
                by_category.get(category).map(|tally| CategoryScore {
                    category: category.as_str().to_string(),
                    count: tally.count,
                    accuracy: tally.accuracy(),
                })
            })
            .collect();

        BenchmarkReport {
            total_fixtures: fixtures.len(),
            fields: total.accuracy(),
            by_category,
            parse_time: timing(timings_us, self.iterations),
            misses,
        }
    }
}

fn field_pairs<'a>(
    expected: &'a Expected,
    actual: &'a ExtractionResult,
) -> [(&'static str, Option<&'a str>, Option<&'a str>); 3] {
    [
        ("disease_name", expected.disease_name.as_deref(), actual.disease_name.as_deref()),
        ("disease_icd_code", expected.disease_icd_code.as_deref(), actual.disease_icd_code.as_deref()),
        ("medicine_name", expected.medicine_name.as_deref(), actual.medicine_name.as_deref()),
    ]
}

/// Case-insensitive comparison; two missing values agree.
pub fn field_matches(expected: Option<&str>, actual: Option<&str>) -> bool {
    match (expected, actual) {
        (None, None) => true,
        (Some(e), Some(a)) => e.trim().eq_ignore_ascii_case(a.trim()),
        _ => false,
    }
}

fn timing(mut timings_us: Vec<f64>, iterations: usize) -> ParseTiming {
    if timings_us.is_empty() {
        return ParseTiming {
            iterations,
            mean_us: 0.0,
            p50_us: 0.0,
            p95_us: 0.0,
        };
    }

    timings_us.sort_by(|a, b| a.total_cmp(b));
    ParseTiming {
        iterations,
        mean_us: timings_us.iter().sum::<f64>() / timings_us.len() as f64,
        p50_us: percentile(&timings_us, 50),
        p95_us: percentile(&timings_us, 95),
    }
}

fn percentile(sorted_data: &[f64], p: usize) -> f64 {
    let index = (p as f64 / 100.0 * sorted_data.len() as f64) as usize;
    sorted_data[index.min(sorted_data.len() - 1)]
}
