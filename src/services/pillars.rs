//! Year/month/day pillars of the sexagenary (stem-branch) calendar.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const STEMS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];
const BRANCHES: [char; 12] = ['子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥'];

/// Approximate start of each solar month ("jie" term) as (month, day, index),
/// where index 0 is the Tiger month starting at Lichun.
const SOLAR_MONTH_STARTS: [(u32, u32, u32); 12] = [
    (1, 6, 11),
    (2, 4, 0),
    (3, 6, 1),
    (4, 5, 2),
    (5, 6, 3),
    (6, 6, 4),
    (7, 7, 5),
    (8, 8, 6),
    (9, 8, 7),
    (10, 8, 8),
    (11, 7, 9),
    (12, 7, 10),
];

/// 1900-01-01 was a 甲戌 day, index 10 of the cycle.
const DAY_EPOCH_INDEX: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourPillars {
    pub year: String,
    pub month: String,
    pub day: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PillarError {
    #[error("birth_date '{0}' is not a YYYY-MM-DD date")]
    InvalidDate(String),
}

pub trait PillarCalculator: Send + Sync {
    fn calculate(&self, birth_date: &str) -> Result<FourPillars, PillarError>;
}

/// Stored shape of the pillars: the labels, or `{error}` when the
/// birth date cannot be read.
pub fn pillars_document(calculator: &dyn PillarCalculator, birth_date: &str) -> Value {
    match calculator.calculate(birth_date) {
        Ok(pillars) => json!(pillars),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SexagenaryCalculator;

impl PillarCalculator for SexagenaryCalculator {
    fn calculate(&self, birth_date: &str) -> Result<FourPillars, PillarError> {
        let date = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d")
            .map_err(|_| PillarError::InvalidDate(birth_date.to_string()))?;
        Ok(pillars_for(date))
    }
}

pub fn pillars_for(date: NaiveDate) -> FourPillars {
    let year = cycle_year(date);
    let year_index = (year as i64 - 4).rem_euclid(60);
    let year_stem = year_index % 10;

    let month_offset = solar_month_index(date) as i64;
    // Tiger-month stem follows the year stem: 甲/己 → 丙, 乙/庚 → 戊, ...
    let month_stem = ((year_stem % 5) * 2 + 2 + month_offset) % 10;
    let month_branch = (2 + month_offset) % 12;

    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    let day_index = (DAY_EPOCH_INDEX + (date - epoch).num_days()).rem_euclid(60);

    FourPillars {
        year: cycle_label(year_index),
        month: label(month_stem, month_branch),
        day: cycle_label(day_index),
    }
}

/// The sexagenary year turns at Lichun (about Feb 4), not on Jan 1.
fn cycle_year(date: NaiveDate) -> i32 {
    if (date.month(), date.day()) < (2, 4) {
        date.year() - 1
    } else {
        date.year()
    }
}

fn solar_month_index(date: NaiveDate) -> u32 {
    SOLAR_MONTH_STARTS
        .iter()
        .rev()
        .find(|(m, d, _)| (date.month(), date.day()) >= (*m, *d))
        .map(|(_, _, index)| *index)
        // Jan 1-5 still belongs to the Rat month of the previous cycle year.
        .unwrap_or(10)
}

fn cycle_label(index: i64) -> String {
    label(index % 10, index % 12)
}

fn label(stem: i64, branch: i64) -> String {
    let mut s = String::with_capacity(6);
    s.push(STEMS[stem as usize]);
    s.push(BRANCHES[branch as usize]);
    s
}
