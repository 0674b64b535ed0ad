//! Dashboard assembly from aggregated answer counts.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::models::dashboard::{
    ChoiceBreakdown, ChoiceCountRow, DailyCount, DashboardAggregates, DashboardDetails,
    DashboardFilters, DashboardResponse, GenderBreakdown, GenderCounts, GenderPercent,
    QuestionAverage, RatingCountRow, SectionRatingOverview, Totals, TIMESERIES_DAYS,
    UNGROUPED_SECTION_ORDER,
};
use crate::models::response::SurveyRef;
use crate::models::survey::{Question, QuestionType, Section, Survey, UNTITLED_SECTION};
use crate::services::percentages::{rating_breakdown, round_to, share_1dp};

/// Text fragments identifying the sex question.
pub const GENDER_KEYWORDS: [&str; 2] = ["sex", "ጾታ"];

/// Text fragments identifying the age question.
pub const AGE_KEYWORDS: [&str; 2] = ["age", "እድሜ"];

/// Text fragments identifying the education question.
pub const EDUCATION_KEYWORDS: [&str; 2] = ["education", "የትምህርት"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// Maps a free-form sex answer to a gender; unknown values are ignored.
pub fn normalize_gender(value: &str) -> Option<Gender> {
    match value.trim().to_lowercase().as_str() {
        "male" | "m" | "ወንድ" => Some(Gender::Male),
        "female" | "f" | "ሴት" => Some(Gender::Female),
        _ => None,
    }
}

/// First question (by id) whose text contains any keyword, ignoring case.
pub fn find_question_by_keywords<'a>(
    questions: &'a [Question],
    keywords: &[&str],
) -> Option<&'a Question> {
    questions
        .iter()
        .filter(|q| {
            let text = q.text.to_lowercase();
            keywords.iter().any(|k| text.contains(&k.to_lowercase()))
        })
        .min_by_key(|q| q.id)
}

/// The sex, age and education questions of a survey, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemographicQuestions<'a> {
    pub gender: Option<&'a Question>,
    pub age: Option<&'a Question>,
    pub education: Option<&'a Question>,
}

impl<'a> DemographicQuestions<'a> {
    pub fn locate(questions: &'a [Question]) -> Self {
        Self {
            gender: find_question_by_keywords(questions, &GENDER_KEYWORDS),
            age: find_question_by_keywords(questions, &AGE_KEYWORDS),
            education: find_question_by_keywords(questions, &EDUCATION_KEYWORDS),
        }
    }

    /// Ids whose choice counts must be loaded.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = [self.gender, self.age, self.education]
            .iter()
            .flatten()
            .map(|q| q.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

fn choices_of<'a>(rows: &'a [ChoiceCountRow], question_id: i64) -> impl Iterator<Item = &'a ChoiceCountRow> {
    rows.iter().filter(move |r| r.question_id == question_id)
}

/// Male/female split of the sex question's answers.
pub fn gender_breakdown(question: &Question, rows: &[ChoiceCountRow]) -> GenderBreakdown {
    let mut counts = GenderCounts::default();
    for row in choices_of(rows, question.id) {
        match normalize_gender(&row.choice) {
            Some(Gender::Male) => counts.male += row.count,
            Some(Gender::Female) => counts.female += row.count,
            None => {}
        }
    }
    let total = counts.male + counts.female;
    GenderBreakdown {
        question_id: question.id,
        question: question.text.clone(),
        counts,
        total,
        percent: GenderPercent {
            male: share_1dp(counts.male, total),
            female: share_1dp(counts.female, total),
        },
    }
}

/// Counts per trimmed, non-empty choice label.
pub fn choice_breakdown(question: &Question, rows: &[ChoiceCountRow]) -> ChoiceBreakdown {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for row in choices_of(rows, question.id) {
        let label = row.choice.trim();
        if label.is_empty() {
            continue;
        }
        *counts.entry(label.to_string()).or_insert(0) += row.count;
    }
    let total: i64 = counts.values().sum();
    let percent = counts
        .iter()
        .map(|(label, count)| (label.clone(), share_1dp(*count, total)))
        .collect();
    ChoiceBreakdown {
        question_id: question.id,
        question: question.text.clone(),
        counts,
        total,
        percent,
    }
}

/// Zero-filled daily counts for the window ending on `today`.
pub fn fill_timeseries(today: NaiveDate, counts: &[DailyCount]) -> Vec<DailyCount> {
    let start = today - Duration::days(TIMESERIES_DAYS - 1);
    (0..TIMESERIES_DAYS)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let count = counts
                .iter()
                .filter(|c| c.date == date)
                .map(|c| c.count)
                .sum();
            DailyCount { date, count }
        })
        .collect()
}

fn add_rating(bucket: &mut [i64; 5], rating: i32, count: i64) {
    if (1..=5).contains(&rating) {
        bucket[(rating - 1) as usize] += count;
    }
}

/// Rating shares per section in `(order, id)` order, plus an "Ungrouped"
/// entry when rating questions without a section have answers.
pub fn section_overview(
    sections: &[Section],
    rating_questions: &[&Question],
    rows: &[RatingCountRow],
) -> Vec<SectionRatingOverview> {
    let mut per_section: BTreeMap<Option<i64>, [i64; 5]> = BTreeMap::new();
    for row in rows {
        let Some(question) = rating_questions.iter().find(|q| q.id == row.question_id) else {
            continue;
        };
        let bucket = per_section.entry(question.section_id).or_insert([0; 5]);
        add_rating(bucket, row.rating, row.count);
    }

    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|s| (s.order, s.id));

    let mut overview: Vec<SectionRatingOverview> = ordered
        .iter()
        .map(|s| SectionRatingOverview {
            section_id: Some(s.id),
            title: if s.title.is_empty() {
                UNTITLED_SECTION.to_string()
            } else {
                s.title.clone()
            },
            order: s.order as i64,
            ratings: rating_breakdown(per_section.get(&Some(s.id)).copied().unwrap_or([0; 5])),
        })
        .collect();

    if let Some(ungrouped) = per_section.get(&None) {
        if ungrouped.iter().sum::<i64>() > 0 {
            overview.push(SectionRatingOverview {
                section_id: None,
                title: "Ungrouped".to_string(),
                order: UNGROUPED_SECTION_ORDER,
                ratings: rating_breakdown(*ungrouped),
            });
        }
    }

    overview
}

/// Builds the dashboard of a resolved survey.
///
/// `questions` and `sections` are all rows of the survey; `aggregates` were
/// computed over the filtered response set.
pub fn build_dashboard(
    survey: &Survey,
    sections: &[Section],
    questions: &[Question],
    aggregates: DashboardAggregates,
    filters: DashboardFilters,
    today: NaiveDate,
) -> DashboardResponse {
    let mut rating_questions: Vec<&Question> = questions
        .iter()
        .filter(|q| q.question_type == QuestionType::Rating)
        .collect();
    rating_questions.sort_by_key(|q| (q.order, q.id));

    let mut overall = [0i64; 5];
    let mut averages = Vec::with_capacity(rating_questions.len());
    let mut distributions = BTreeMap::new();
    let mut rating_question_overview = BTreeMap::new();

    for question in &rating_questions {
        let mut counts = [0i64; 5];
        let mut weighted = 0i64;
        let mut answered = 0i64;
        for row in aggregates
            .rating_counts
            .iter()
            .filter(|r| r.question_id == question.id)
        {
            weighted += row.rating as i64 * row.count;
            answered += row.count;
            add_rating(&mut counts, row.rating, row.count);
        }
        for (total, count) in overall.iter_mut().zip(counts.iter()) {
            *total += count;
        }

        averages.push(QuestionAverage {
            question_id: question.id,
            question: question.text.clone(),
            avg_rating: (answered > 0).then(|| round_to(weighted as f64 / answered as f64, 2)),
        });
        distributions.insert(
            question.id.to_string(),
            (1..=5)
                .map(|r| (r.to_string(), counts[r - 1]))
                .collect::<BTreeMap<String, i64>>(),
        );
        rating_question_overview.insert(question.id.to_string(), rating_breakdown(counts));
    }

    let demographics = DemographicQuestions::locate(questions);
    let details = DashboardDetails {
        rating_overview: rating_breakdown(overall),
        rating_question_overview,
        rating_section_overview: section_overview(
            sections,
            &rating_questions,
            &aggregates.rating_counts,
        ),
        gender: demographics
            .gender
            .map(|q| gender_breakdown(q, &aggregates.choice_counts)),
        age: demographics
            .age
            .map(|q| choice_breakdown(q, &aggregates.choice_counts)),
        education: demographics
            .education
            .map(|q| choice_breakdown(q, &aggregates.choice_counts)),
        filters,
    };

    DashboardResponse {
        survey: Some(SurveyRef {
            id: survey.id,
            title: survey.title.clone(),
        }),
        totals: Totals {
            responses: aggregates.total_responses,
        },
        averages,
        recent: aggregates.recent,
        timeseries: fill_timeseries(today, &aggregates.daily_counts),
        distributions,
        details: Some(details),
    }
}
