//! Works out which occurrences of a recurring transaction are due.
//!
//! Nothing here touches the database. [advance] describes the entries to
//! write and where the cursor ends up, and
//! [generate_due_entries](crate::recurrence::generate_due_entries) applies
//! that description one occurrence at a time.

use time::Date;

use crate::{
    ledger::{LedgerEntry, NewLedgerEntry},
    recurrence::RecurringTransaction,
};

/// A single due occurrence and the cursor values to store once its entry
/// exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// The ledger entry for the occurrence, dated on the occurrence date.
    pub entry: NewLedgerEntry,
    /// The occurrence date, which becomes the new last generated date.
    pub last_generated_date: Date,
    /// The occurrence after this one, or `None` if the schedule ends here.
    pub next_due_date: Option<Date>,
}

/// The result of bringing a recurring transaction up to date.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    /// Every occurrence due on or before the reference date, oldest first.
    pub occurrences: Vec<Occurrence>,
    /// The first occurrence after the reference date, or `None` if the
    /// schedule has ended.
    pub next_due_date: Option<Date>,
}

/// The first occurrence after `last_generated`, or the start date if nothing
/// has been generated yet.
///
/// Occurrences never fall before the start date: if the start date was moved
/// forward after some entries were generated, the schedule restarts on it.
/// Returns `None` once the next occurrence would fall after the end date.
pub fn next_occurrence(
    recurring: &RecurringTransaction,
    last_generated: Option<Date>,
) -> Option<Date> {
    let candidate = match last_generated {
        None => recurring.start_date,
        Some(date) => recurring.frequency.next_date(date)?,
    }
    .max(recurring.start_date);

    match recurring.end_date {
        Some(end_date) if candidate > end_date => None,
        _ => Some(candidate),
    }
}

/// Collect every occurrence of `recurring` due on or before `reference_date`,
/// starting after its last generated date.
///
/// A schedule that fell behind catches up in one call, with each entry dated on
/// its own occurrence date.
pub fn advance(recurring: &RecurringTransaction, reference_date: Date) -> Advance {
    let mut occurrences = Vec::new();
    let mut next = next_occurrence(recurring, recurring.last_generated_date);

    while let Some(date) = next
        && date <= reference_date
    {
        let following = next_occurrence(recurring, Some(date));

        occurrences.push(Occurrence {
            entry: build_entry(recurring, date),
            last_generated_date: date,
            next_due_date: following,
        });

        next = following;
    }

    Advance {
        occurrences,
        next_due_date: next,
    }
}

fn build_entry(recurring: &RecurringTransaction, date: Date) -> NewLedgerEntry {
    LedgerEntry::build(
        recurring.category_id,
        recurring.account_id,
        recurring.amount,
        date,
    )
    .description(&recurring.description)
    .recurring_transaction(recurring.id)
}

#[cfg(test)]
mod advance_tests {
    use rust_decimal_macros::dec;
    use time::{Date, macros::date};

    use crate::recurrence::{Frequency, RecurringTransaction, advance, next_occurrence};

    fn recurring(frequency: Frequency, start_date: Date) -> RecurringTransaction {
        RecurringTransaction {
            id: 1,
            category_id: 2,
            account_id: 3,
            amount: dec!(25.00),
            description: "Gym".to_owned(),
            frequency,
            start_date,
            end_date: None,
            last_generated_date: None,
            next_due_date: Some(start_date),
            is_active: true,
        }
    }

    fn occurrence_dates(recurring: &RecurringTransaction, reference_date: Date) -> Vec<Date> {
        advance(recurring, reference_date)
            .occurrences
            .iter()
            .map(|occurrence| occurrence.entry.competence_date)
            .collect()
    }

    #[test]
    fn weekly_from_start_includes_reference_date() {
        let recurring = recurring(Frequency::Weekly, date!(2024 - 01 - 01));

        let result = advance(&recurring, date!(2024 - 01 - 22));

        let dates: Vec<Date> = result
            .occurrences
            .iter()
            .map(|occurrence| occurrence.entry.competence_date)
            .collect();
        assert_eq!(
            dates,
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 08),
                date!(2024 - 01 - 15),
                date!(2024 - 01 - 22)
            ]
        );
        assert_eq!(result.next_due_date, Some(date!(2024 - 01 - 29)));
    }

    #[test]
    fn occurrences_carry_cursor_values() {
        let recurring = recurring(Frequency::Weekly, date!(2024 - 01 - 01));

        let result = advance(&recurring, date!(2024 - 01 - 08));

        let first = &result.occurrences[0];
        assert_eq!(first.last_generated_date, date!(2024 - 01 - 01));
        assert_eq!(first.next_due_date, Some(date!(2024 - 01 - 08)));
        assert_eq!(first.entry.amount, dec!(25.00));
        assert_eq!(first.entry.description, "Gym");
        assert_eq!(first.entry.recurring_transaction_id, Some(1));
        assert_eq!(first.entry.payment_date, None);
    }

    #[test]
    fn resumes_after_last_generated_date() {
        let recurring = RecurringTransaction {
            last_generated_date: Some(date!(2024 - 01 - 15)),
            ..recurring(Frequency::Weekly, date!(2024 - 01 - 01))
        };

        assert_eq!(
            occurrence_dates(&recurring, date!(2024 - 01 - 29)),
            vec![date!(2024 - 01 - 22), date!(2024 - 01 - 29)]
        );
    }

    #[test]
    fn monthly_catches_up_missed_months() {
        let recurring = RecurringTransaction {
            last_generated_date: Some(date!(2024 - 01 - 05)),
            ..recurring(Frequency::Monthly, date!(2023 - 12 - 05))
        };

        let result = advance(&recurring, date!(2024 - 05 - 20));

        assert_eq!(result.occurrences.len(), 4);
        assert_eq!(
            result.occurrences[3].entry.competence_date,
            date!(2024 - 05 - 05)
        );
        assert_eq!(result.next_due_date, Some(date!(2024 - 06 - 05)));
    }

    #[test]
    fn monthly_from_end_of_month_follows_clamped_day() {
        let recurring = recurring(Frequency::Monthly, date!(2024 - 01 - 31));

        assert_eq!(
            occurrence_dates(&recurring, date!(2024 - 03 - 31)),
            vec![
                date!(2024 - 01 - 31),
                date!(2024 - 02 - 29),
                date!(2024 - 03 - 29)
            ]
        );
    }

    #[test]
    fn nothing_due_before_start_date() {
        let recurring = recurring(Frequency::Yearly, date!(2024 - 06 - 01));

        let result = advance(&recurring, date!(2024 - 05 - 31));

        assert!(result.occurrences.is_empty());
        assert_eq!(result.next_due_date, Some(date!(2024 - 06 - 01)));
    }

    #[test]
    fn stops_at_end_date() {
        let recurring = RecurringTransaction {
            end_date: Some(date!(2024 - 01 - 10)),
            ..recurring(Frequency::Weekly, date!(2024 - 01 - 01))
        };

        let result = advance(&recurring, date!(2024 - 02 - 01));

        assert_eq!(result.occurrences.len(), 2);
        assert_eq!(result.occurrences[1].next_due_date, None);
        assert_eq!(result.next_due_date, None);
    }

    #[test]
    fn occurrence_on_end_date_is_included() {
        let recurring = RecurringTransaction {
            end_date: Some(date!(2024 - 01 - 08)),
            ..recurring(Frequency::Weekly, date!(2024 - 01 - 01))
        };

        assert_eq!(
            occurrence_dates(&recurring, date!(2024 - 12 - 31)),
            vec![date!(2024 - 01 - 01), date!(2024 - 01 - 08)]
        );
    }

    #[test]
    fn ended_schedule_has_no_next_occurrence() {
        let recurring = RecurringTransaction {
            end_date: Some(date!(2024 - 01 - 10)),
            last_generated_date: Some(date!(2024 - 01 - 08)),
            ..recurring(Frequency::Weekly, date!(2024 - 01 - 01))
        };

        let result = advance(&recurring, date!(2024 - 02 - 01));

        assert!(result.occurrences.is_empty());
        assert_eq!(result.next_due_date, None);
    }

    #[test]
    fn clamps_to_moved_start_date() {
        let recurring = RecurringTransaction {
            last_generated_date: Some(date!(2024 - 01 - 15)),
            ..recurring(Frequency::Monthly, date!(2024 - 03 - 01))
        };

        let result = advance(&recurring, date!(2024 - 03 - 20));

        let dates: Vec<Date> = result
            .occurrences
            .iter()
            .map(|occurrence| occurrence.entry.competence_date)
            .collect();
        assert_eq!(dates, vec![date!(2024 - 03 - 01)]);
        assert_eq!(result.next_due_date, Some(date!(2024 - 04 - 01)));
    }

    #[test]
    fn next_occurrence_without_history_is_start_date() {
        let recurring = recurring(Frequency::Monthly, date!(2024 - 02 - 29));

        assert_eq!(next_occurrence(&recurring, None), Some(date!(2024 - 02 - 29)));
        assert_eq!(
            next_occurrence(&recurring, Some(date!(2024 - 02 - 29))),
            Some(date!(2024 - 03 - 29))
        );
    }

    #[test]
    fn is_idempotent_for_same_reference_date() {
        let initial = recurring(Frequency::Weekly, date!(2024 - 01 - 01));
        let first = advance(&initial, date!(2024 - 01 - 22));
        let last = first.occurrences.last().unwrap();
        let caught_up = RecurringTransaction {
            last_generated_date: Some(last.last_generated_date),
            next_due_date: last.next_due_date,
            ..initial
        };

        let second = advance(&caught_up, date!(2024 - 01 - 22));

        assert!(second.occurrences.is_empty());
        assert_eq!(second.next_due_date, Some(date!(2024 - 01 - 29)));
    }
}
