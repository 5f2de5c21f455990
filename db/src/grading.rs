//! Fixed percentage→grade/gpa banding shared by result creation, updates,
//! report cards, and class summaries.

/// One row of the banding table.
#[derive(Debug, Clone, Copy)]
pub struct GradeBand {
    pub min_percentage: f64,
    pub grade: &'static str,
    pub gpa: f64,
}

/// Bands are evaluated top-down; first match wins.
pub const GRADE_BANDS: [GradeBand; 8] = [
    GradeBand { min_percentage: 90.0, grade: "A+", gpa: 4.0 },
    GradeBand { min_percentage: 80.0, grade: "A", gpa: 3.5 },
    GradeBand { min_percentage: 70.0, grade: "B+", gpa: 3.0 },
    GradeBand { min_percentage: 60.0, grade: "B", gpa: 2.5 },
    GradeBand { min_percentage: 50.0, grade: "C+", gpa: 2.0 },
    GradeBand { min_percentage: 40.0, grade: "C", gpa: 1.5 },
    GradeBand { min_percentage: 35.0, grade: "D", gpa: 1.0 },
    GradeBand { min_percentage: 0.0, grade: "F", gpa: 0.0 },
];

/// Look up the band for an (unrounded) percentage.
pub fn grade_for(percentage: f64) -> &'static GradeBand {
    GRADE_BANDS
        .iter()
        .find(|band| percentage >= band.min_percentage)
        .unwrap_or(&GRADE_BANDS[GRADE_BANDS.len() - 1])
}

/// Helper to compute percentage safely.
pub fn percentage(earned: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        (earned * 100.0) / total
    }
}

/// Round to two decimal places for values surfaced to callers.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
