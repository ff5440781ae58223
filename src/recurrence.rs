//! Recurrence descriptors and their pt-BR description.
//!
//! A procedure's schedule is not stored as structured data: it is rendered
//! once with [`format_recurrence`] and kept as the single zero-cost item of
//! the [`Category::Recurrence`] slot.

use crate::error::EditError;
use crate::model::{Category, Resource, Resources};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;

const WEEKDAY_NAMES: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

/// A calendar date held as an explicit UTC midnight.
///
/// Display always reads the UTC calendar fields back, so a date never shifts
/// across a day boundary whatever the local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(DateTime<Utc>);

impl CalendarDate {
    #[must_use]
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Parses `YYYY-MM-DD` (form input) or an RFC 3339 timestamp.
    pub fn parse(input: &str) -> Result<Self, EditError> {
        let trimmed = input.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self::from_naive(date));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|ts| Self::from_naive(ts.with_timezone(&Utc).date_naive()))
            .map_err(|_| EditError::InvalidDate {
                input: input.to_string(),
            })
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y"))
    }
}

impl FromStr for CalendarDate {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl IntervalUnit {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Days => "dias",
            Self::Weeks => "semanas",
            Self::Months => "meses",
            Self::Years => "anos",
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "days" | "dias" => Ok(Self::Days),
            "weeks" | "semanas" => Ok(Self::Weeks),
            "months" | "meses" => Ok(Self::Months),
            "years" | "anos" => Ok(Self::Years),
            other => Err(format!(
                "unknown interval unit '{other}' (expected days, weeks, months or years)"
            )),
        }
    }
}

/// How often a procedure runs. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceKind {
    Once,
    Daily,
    /// Weekday indices, 0 = Sunday.
    Weekly { weekdays: Vec<u8> },
    Monthly { day_of_month: Option<u8> },
    Yearly { end_year: Option<i32> },
    SpecificDates { dates: Vec<CalendarDate> },
    Custom {
        interval: Option<u32>,
        unit: Option<IntervalUnit>,
    },
}

impl RecurrenceKind {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Once => "Execução Única",
            Self::Daily => "Diária",
            Self::Weekly { .. } => "Semanal",
            Self::Monthly { .. } => "Mensal",
            Self::Yearly { .. } => "Anual",
            Self::SpecificDates { .. } => "Datas Específicas",
            Self::Custom { .. } => "Personalizada",
        }
    }

    /// Variants that take the generic "(de X a Y)" suffix.
    const fn uses_date_range(&self) -> bool {
        !matches!(
            self,
            Self::Once | Self::Yearly { .. } | Self::SpecificDates { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub kind: RecurrenceKind,
    /// `HH:MM`, appended verbatim.
    pub time_of_day: Option<String>,
    pub notes: Option<String>,
    pub start: Option<CalendarDate>,
    pub end: Option<CalendarDate>,
}

impl Recurrence {
    /// Builds a descriptor, normalizing weekday and date lists to sorted,
    /// duplicate-free order.
    #[must_use]
    pub fn new(kind: RecurrenceKind) -> Self {
        let kind = match kind {
            RecurrenceKind::Weekly { mut weekdays } => {
                weekdays.sort_unstable();
                weekdays.dedup();
                RecurrenceKind::Weekly { weekdays }
            }
            RecurrenceKind::SpecificDates { mut dates } => {
                dates.sort();
                dates.dedup();
                RecurrenceKind::SpecificDates { dates }
            }
            other => other,
        };
        Self {
            kind,
            time_of_day: None,
            notes: None,
            start: None,
            end: None,
        }
    }

    #[must_use]
    pub fn at(mut self, time_of_day: impl Into<String>) -> Self {
        self.time_of_day = Some(time_of_day.into());
        self
    }

    #[must_use]
    pub fn starting(mut self, start: CalendarDate) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn ending(mut self, end: CalendarDate) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Rejects values a form would never produce.
    pub fn validate(&self) -> Result<(), EditError> {
        let invalid = |message: String| Err(EditError::InvalidRecurrence { message });

        if let Some(time) = self.time_of_day.as_deref().filter(|t| !t.is_empty()) {
            if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
                return invalid(format!("time of day '{time}' is not HH:MM"));
            }
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return invalid(format!("end date {end} is before start date {start}"));
            }
        }

        match &self.kind {
            RecurrenceKind::Weekly { weekdays } => {
                if let Some(day) = weekdays.iter().find(|d| **d > 6) {
                    return invalid(format!("weekday {day} is outside 0-6"));
                }
            }
            RecurrenceKind::Monthly {
                day_of_month: Some(day),
            } if !(1..=31).contains(day) => {
                return invalid(format!("day of month {day} is outside 1-31"));
            }
            RecurrenceKind::Yearly {
                end_year: Some(end_year),
            } => {
                if let Some(start) = self.start {
                    if *end_year < start.year() {
                        return invalid(format!(
                            "end year {end_year} is before start year {}",
                            start.year()
                        ));
                    }
                }
            }
            RecurrenceKind::Custom {
                interval: Some(0), ..
            } => {
                return invalid("custom interval must be at least 1".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    /// The synthetic, zero-cost item that stands for this schedule.
    #[must_use]
    pub fn to_resource(&self) -> Resource {
        Resource::new(format_recurrence(self), 0.0).with_notes(self.notes.clone())
    }
}

/// Renders a recurrence as a pt-BR sentence. Never returns an empty string.
#[must_use]
pub fn format_recurrence(recurrence: &Recurrence) -> String {
    let time = recurrence
        .time_of_day
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!(" às {t}"))
        .unwrap_or_default();

    let base = match &recurrence.kind {
        RecurrenceKind::Once => match recurrence.start {
            Some(date) => format!("Única em {date}{time}"),
            None => format!("Única{time}"),
        },
        RecurrenceKind::Daily => format!("Diária{time}"),
        RecurrenceKind::Weekly { weekdays } => {
            let names: Vec<&str> = weekdays
                .iter()
                .filter_map(|d| WEEKDAY_NAMES.get(usize::from(*d)).copied())
                .collect();
            if names.is_empty() {
                format!("Semanal{time}")
            } else {
                format!("Semanal ({}){time}", names.join(", "))
            }
        }
        RecurrenceKind::Monthly {
            day_of_month: Some(day),
        } if *day > 0 => format!("Mensal (dia {day}){time}"),
        RecurrenceKind::Monthly { .. } => format!("Mensal{time}"),
        RecurrenceKind::Yearly { .. } => format!("Anual{time}"),
        RecurrenceKind::SpecificDates { dates } if !dates.is_empty() => {
            format!("Datas específicas ({}){time}", dates.len())
        }
        RecurrenceKind::SpecificDates { .. } => format!("Datas específicas{time}"),
        RecurrenceKind::Custom {
            interval: Some(interval),
            unit: Some(unit),
        } if *interval > 0 => format!("A cada {interval} {}{time}", unit.label()),
        RecurrenceKind::Custom { .. } => format!("{}{time}", recurrence.kind.label()),
    };

    base + &date_range_suffix(recurrence)
}

fn date_range_suffix(recurrence: &Recurrence) -> String {
    if let RecurrenceKind::Yearly { end_year } = recurrence.kind {
        let Some(start_year) = recurrence.start.map(CalendarDate::year) else {
            return String::new();
        };
        return match end_year {
            Some(end_year) if end_year > start_year => format!(" (de {start_year} a {end_year})"),
            _ => format!(" (a partir de {start_year})"),
        };
    }

    if !recurrence.kind.uses_date_range() {
        return String::new();
    }
    match (recurrence.start, recurrence.end) {
        (Some(start), Some(end)) => format!(" (de {start} a {end})"),
        (Some(start), None) => format!(" (a partir de {start})"),
        _ => String::new(),
    }
}

/// Replaces the recurrence slot with exactly one item describing `recurrence`.
pub fn apply_recurrence(resources: &mut Resources, recurrence: &Recurrence) -> Result<(), EditError> {
    recurrence.validate()?;
    resources.set(Category::Recurrence, vec![recurrence.to_resource()]);
    Ok(())
}

/// Empties the recurrence slot.
pub fn clear_recurrence(resources: &mut Resources) {
    resources.set(Category::Recurrence, Vec::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> CalendarDate {
        CalendarDate::parse(s).expect("valid date")
    }

    fn every_kind() -> Vec<RecurrenceKind> {
        vec![
            RecurrenceKind::Once,
            RecurrenceKind::Daily,
            RecurrenceKind::Weekly { weekdays: vec![] },
            RecurrenceKind::Monthly { day_of_month: None },
            RecurrenceKind::Yearly { end_year: None },
            RecurrenceKind::SpecificDates { dates: vec![] },
            RecurrenceKind::Custom {
                interval: None,
                unit: None,
            },
        ]
    }

    #[test]
    fn every_variant_formats_non_empty() {
        for kind in every_kind() {
            let text = format_recurrence(&Recurrence::new(kind.clone()));
            assert!(!text.is_empty(), "{kind:?} produced an empty description");
        }
    }

    #[test]
    fn time_of_day_is_appended_for_every_variant() {
        for kind in every_kind() {
            let text = format_recurrence(&Recurrence::new(kind).at("07:30"));
            assert!(text.contains(" às 07:30"), "missing time in '{text}'");
        }
    }

    #[test]
    fn weekly_lists_sorted_day_names() {
        let recurrence = Recurrence::new(RecurrenceKind::Weekly {
            weekdays: vec![5, 1, 3, 1],
        })
        .at("08:00");
        assert_eq!(format_recurrence(&recurrence), "Semanal (Seg, Qua, Sex) às 08:00");
    }

    #[test]
    fn generic_range_uses_day_month_year() {
        let recurrence = Recurrence::new(RecurrenceKind::Monthly {
            day_of_month: Some(10),
        })
        .starting(date("2025-01-01"))
        .ending(date("2025-12-31"));
        assert_eq!(
            format_recurrence(&recurrence),
            "Mensal (dia 10) (de 01/01/2025 a 31/12/2025)"
        );

        let open_ended = Recurrence::new(RecurrenceKind::Daily).starting(date("2025-03-05"));
        assert_eq!(format_recurrence(&open_ended), "Diária (a partir de 05/03/2025)");
    }

    #[test]
    fn yearly_uses_year_range() {
        let start = date("2024-06-15");
        let bounded = Recurrence::new(RecurrenceKind::Yearly {
            end_year: Some(2027),
        })
        .starting(start);
        assert_eq!(format_recurrence(&bounded), "Anual (de 2024 a 2027)");

        let same_year = Recurrence::new(RecurrenceKind::Yearly {
            end_year: Some(2024),
        })
        .starting(start);
        assert_eq!(format_recurrence(&same_year), "Anual (a partir de 2024)");
    }

    #[test]
    fn once_and_specific_dates_skip_generic_range() {
        let once = Recurrence::new(RecurrenceKind::Once)
            .starting(date("2025-02-01"))
            .ending(date("2025-02-10"));
        assert_eq!(format_recurrence(&once), "Única em 01/02/2025");

        let dates = Recurrence::new(RecurrenceKind::SpecificDates {
            dates: vec![date("2025-05-02"), date("2025-04-01")],
        })
        .starting(date("2025-01-01"));
        assert_eq!(format_recurrence(&dates), "Datas específicas (2)");
    }

    #[test]
    fn custom_interval_formats_unit() {
        let recurrence = Recurrence::new(RecurrenceKind::Custom {
            interval: Some(2),
            unit: Some(IntervalUnit::Weeks),
        });
        assert_eq!(format_recurrence(&recurrence), "A cada 2 semanas");
    }

    #[test]
    fn rfc3339_input_keeps_utc_calendar_day() {
        let parsed = date("2025-03-05T00:00:00.000Z");
        assert_eq!(parsed.to_string(), "05/03/2025");
        let late = date("2025-03-05T23:30:00-03:00");
        assert_eq!(late.to_string(), "06/03/2025");
    }

    #[test]
    fn validation_rejects_out_of_range_fields() {
        let weekly = Recurrence::new(RecurrenceKind::Weekly { weekdays: vec![7] });
        assert!(weekly.validate().is_err());

        let monthly = Recurrence::new(RecurrenceKind::Monthly {
            day_of_month: Some(32),
        });
        assert!(monthly.validate().is_err());

        let bad_time = Recurrence::new(RecurrenceKind::Daily).at("25:00");
        assert!(bad_time.validate().is_err());
    }

    #[test]
    fn applying_replaces_the_single_recurrence_item() {
        let mut resources = Resources::new();
        let daily = Recurrence::new(RecurrenceKind::Daily).with_notes("plantão");
        apply_recurrence(&mut resources, &daily).expect("valid");
        let weekly = Recurrence::new(RecurrenceKind::Weekly { weekdays: vec![1] });
        apply_recurrence(&mut resources, &weekly).expect("valid");

        let items = resources.get(Category::Recurrence);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Semanal (Seg)");
        assert_eq!(items[0].cost, 0.0);
        assert_eq!(items[0].notes, None);
    }
}
